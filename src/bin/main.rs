use std::path::PathBuf;
use std::time::Duration;

use anstream::print;
use anstream::println;
use clap::Parser;
use hrsw::Stopwatch;
use human_duration::human_duration;
use owo_colors::OwoColorize;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use rustc_hash::FxHashSet;
use thousands::Separable;

use theta_search::algorithms::dijkstra::VisibilityDijkstra;
use theta_search::algorithms::theta_star::ThetaStarSearch;
use theta_search::budget::Deadline;
use theta_search::budget::Either;
use theta_search::budget::ExpansionLimit;
use theta_search::grid::Cell;
use theta_search::grid::Coord;
use theta_search::grid::GridAdapter;
use theta_search::heuristic::HeuristicKind;
use theta_search::path::PathFound;
use theta_search::problems::GridProblem;
use theta_search::visibility::cells_on_segment;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Grids with more free cells than this aren't compared against the reference
/// solver, it's quadratic on them.
const MAX_COMPARE_FREE_CELLS: usize = 4096;

/// Finds any-angle paths on occupancy grids with Theta*
#[derive(Parser, Debug)]
#[clap(long_version = theta_search::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Problems, as text grids (`.txt`) or images.
    #[arg()]
    pub problems: Vec<PathBuf>,

    #[arg(long, env = "THETA_HEURISTIC", default_value_t = HeuristicKind::Euclidean)]
    pub heuristic: HeuristicKind,

    #[arg(long, env = "THETA_MAX_EXPANSIONS")]
    pub max_expansions: Option<usize>,
    #[arg(long, env = "THETA_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Random problems to solve, besides the given ones.
    #[arg(long, default_value_t = 0u64)]
    pub random_instances: u64,
    #[arg(long, default_value_t = 64usize)]
    pub width: usize,
    #[arg(long, default_value_t = 32usize)]
    pub height: usize,
    /// Probability of a random cell being blocked.
    #[arg(long, default_value_t = 0.2f64)]
    pub density: f64,
    #[arg(long, env = "THETA_SEED", default_value_t = 0u64)]
    pub seed: u64,

    /// Compares costs against the optimal any-angle path.
    #[arg(long)]
    pub compare: bool,
    /// Prints memory statistics of each search.
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

/// Totals across all the problems solved.
#[derive(Debug, Default)]
struct Summary {
    problems: usize,
    solved: usize,
    expanded: usize,
    elapsed: Duration,
}

fn render(problem: &GridProblem, found: Option<&PathFound>) -> String {
    let mut vertices = FxHashSet::default();
    let mut on_path = FxHashSet::default();
    if let Some(found) = found {
        vertices.extend(found.path.iter().copied());
        for (a, b) in found.segments() {
            on_path.extend(cells_on_segment(a, b));
        }
    }

    let grid = &problem.grid;
    let mut s = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = Cell::new(x as Coord, y as Coord);
            let glyph = if cell == problem.start {
                "S".blue().bold().to_string()
            } else if cell == problem.goal {
                "G".green().bold().to_string()
            } else if vertices.contains(&cell) {
                "o".yellow().bold().to_string()
            } else if on_path.contains(&cell) {
                "·".yellow().to_string()
            } else if grid.is_blocked(x as i64, y as i64) {
                "█".to_string()
            } else {
                "░".dimmed().to_string()
            };
            s.push_str(&glyph);
        }
        s.push('\n');
    }
    s
}

fn solve(
    name: &str,
    problem: &GridProblem,
    args: &Args,
    summary: &mut Summary,
) -> std::io::Result<()> {
    let (width, height) = problem.grid.dimensions();
    println!(
        "{} {name} ({width}x{height}) from {} to {} with {}",
        "Problem".bold(),
        problem.start.blue(),
        problem.goal.green(),
        args.heuristic.yellow()
    );
    if !args.heuristic.is_admissible() {
        log::info!("The {} heuristic may overestimate any-angle costs", args.heuristic);
    }
    summary.problems += 1;

    let budget = Either(
        args.max_expansions.map(ExpansionLimit),
        args.timeout_ms
            .map(|ms| Deadline::after(Duration::from_millis(ms))),
    );

    let mut stopwatch = Stopwatch::new_started();
    let mut search = match ThetaStarSearch::new(
        &problem.grid,
        problem.start,
        problem.goal,
        args.heuristic.function(),
    ) {
        Ok(search) => search,
        Err(e) => {
            println!("  {} {e}", "Error:".red().bold());
            return Ok(());
        }
    };
    let result = search.run(budget);
    stopwatch.stop();
    let elapsed = stopwatch.elapsed();
    summary.expanded += search.expanded_count();
    summary.elapsed += elapsed;

    match &result {
        Ok(found) => {
            summary.solved += 1;
            print!("{}", render(problem, Some(found)));
            println!(
                "  {} {:.3} over {} segments with {} turns",
                "Cost:".bold(),
                found.cost.green(),
                found.path.len().saturating_sub(1),
                found.turns()
            );
        }
        Err(e) => {
            print!("{}", render(problem, None));
            println!("  {} {e}", "Failed:".red().bold());
        }
    }
    println!(
        "  Expanded {} nodes in {}",
        search.expanded_count().separate_with_commas(),
        human_duration(&elapsed)
    );

    if args.stats {
        search.write_memory_stats(std::io::stdout().lock())?;
    }

    if args.compare {
        let reference = VisibilityDijkstra::new(&problem.grid);
        if reference.len() > MAX_COMPARE_FREE_CELLS {
            log::warn!(
                "Skipping comparison on {name}, {} free cells are too many",
                reference.len().separate_with_commas()
            );
            return Ok(());
        }
        match (&result, reference.shortest_path(problem.start, problem.goal)) {
            (Ok(found), Ok(optimal)) => {
                let gap = if optimal.cost > 0.0 {
                    100.0 * (found.cost - optimal.cost) / optimal.cost
                } else {
                    0.0
                };
                println!(
                    "  {} {:.3} (Theta* is {:.2}% longer)",
                    "Optimal:".bold(),
                    optimal.cost,
                    gap.yellow()
                );
            }
            // Theta* gave up early.
            (Err(e), Ok(optimal)) if !e.is_no_path() => {
                println!("  {} {:.3}", "Optimal:".bold(), optimal.cost);
            }
            (Err(_), Err(e)) => println!("  {} {e}", "Optimal:".bold()),
            (_, reference) => {
                log::error!("Theta* and the reference solver disagree on {name}: {reference:?}");
            }
        }
    }

    Ok(())
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    args.color.write_global();

    let mut summary = Summary::default();

    for p in &args.problems {
        let name = p.display().to_string();
        match GridProblem::try_from(p.as_path()) {
            Ok(problem) => solve(&name, &problem, &args, &mut summary)?,
            Err(e) => log::error!("Failed to load {name}: {e}"),
        }
    }

    for instance in 0..args.random_instances {
        let seed = args.seed.wrapping_add(instance);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match GridProblem::random(&mut rng, args.width, args.height, args.density) {
            Some(problem) => solve(&format!("random:{seed}"), &problem, &args, &mut summary)?,
            None => log::warn!(
                "Failed to generate a random {}x{} problem with seed {seed}",
                args.width,
                args.height
            ),
        }
    }

    if summary.problems > 0 {
        println!(
            "{} solved {}/{} problems, expanding {} nodes in {}",
            "Summary:".bold(),
            summary.solved,
            summary.problems,
            summary.expanded.separate_with_commas(),
            human_duration(&summary.elapsed)
        );
    } else {
        log::warn!("Nothing to solve, pass problem files or --random-instances");
    }

    Ok(())
}
