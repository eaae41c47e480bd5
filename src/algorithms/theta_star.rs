use std::fmt::Debug;

use derive_more::Display;
use num_traits::Zero;

use crate::budget::Budget;
use crate::budget::Unlimited;
use crate::cost::Cost;
use crate::cost::move_cost;
use crate::data_structures::indexed_heap::IndexedHeap;
use crate::grid::Cell;
use crate::grid::GridAdapter;
use crate::path::PathFound;
use crate::search::NodeIndex;
use crate::search::SearchError;
use crate::search::SearchNode;
use crate::search::SearchTree;
use crate::visibility::has_line_of_sight;

/// The ranking tuple for Theta*
///
/// We prefer better f-values, and tie break for lower h. Remaining ties go to
/// the node discovered first, which makes searches reproducible.
///
/// ```
/// use theta_search::algorithms::theta_star::ThetaStarRank;
/// use theta_search::cost::Cost;
/// use theta_search::search::SearchTree;
/// use theta_search::search::SearchNode;
/// use theta_search::grid::Cell;
///
/// let mut tree = SearchTree::new();
/// let c0 = Cost::new(0.0);
/// let c1 = Cost::new(1.0);
/// let c2 = Cost::new(2.0);
/// let first = tree.push(SearchNode::new(Cell::new(0, 0), None, c0, c0));
/// let second = tree.push(SearchNode::new(Cell::new(0, 1), None, c0, c0));
///
/// assert!(ThetaStarRank::new(c2, c0, second) < ThetaStarRank::new(c0, c2, first));
/// assert!(ThetaStarRank::new(c1, c1, first) < ThetaStarRank::new(c1, c1, second));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ThetaStarRank {
    f: Cost,
    h: Cost,
    order: NodeIndex,
}

impl ThetaStarRank {
    pub fn new(g: Cost, h: Cost, order: NodeIndex) -> Self {
        Self { f: g + h, h, order }
    }
    /// Improves `g` in `Rank{f, h}` without recomputing `h`.
    pub fn improve_g(&mut self, new_g: Cost) {
        self.f = new_g + self.h;
    }
    #[inline(always)]
    pub fn f(&self) -> Cost {
        self.f
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum SearchState {
    Running,
    Succeeded,
    Failed,
}

/// An incremental Theta* search between two cells.
///
/// Theta* is A* on the 8-connected lattice, except that a reached neighbour
/// may take its parent's parent as its own parent when they see each other.
/// Paths end up as sequences of straight segments at any angle.
///
/// The search can be driven one expansion at a time with [`Self::step`], or
/// until it's done with [`Self::run`].
pub struct ThetaStarSearch<'g, G, H>
where
    G: GridAdapter + ?Sized,
    H: Fn(Cell, Cell) -> f64,
{
    grid: &'g G,
    heuristic: H,
    start: Cell,
    goal: Cell,

    /// All the Search Nodes. Naturally forms a Search Forest as each node may
    /// have a parent Node.
    search_tree: SearchTree,

    /// The frontier, keyed by `NodeIndex`.
    ///
    /// ```pseudocode
    /// for (i, n) in self.search_tree.enumerate():
    ///   assert(n.is_closed() => !self.open.contains(i))
    /// ```
    open: IndexedHeap<ThetaStarRank>,

    expanded: usize,
    state: SearchState,
    /// Set once the goal gets popped.
    goal_index: Option<NodeIndex>,
}

impl<'g, G, H> ThetaStarSearch<'g, G, H>
where
    G: GridAdapter + ?Sized,
    H: Fn(Cell, Cell) -> f64,
{
    /// Sets up a search, failing for endpoints out of the grid.
    ///
    /// A blocked endpoint isn't an error here, the search simply fails.
    pub fn new(grid: &'g G, start: Cell, goal: Cell, heuristic: H) -> Result<Self, SearchError> {
        let (sx, sy) = start.signed();
        let (gx, gy) = goal.signed();
        let start = grid.cell_at(sx, sy)?;
        let goal = grid.cell_at(gx, gy)?;

        let mut search = Self {
            grid,
            heuristic,
            start,
            goal,
            search_tree: SearchTree::new(),
            open: IndexedHeap::with_capacity(1024),
            expanded: 0,
            state: SearchState::Running,
            goal_index: None,
        };

        if grid.is_blocked(sx, sy) || grid.is_blocked(gx, gy) {
            log::debug!("Theta* from {start} to {goal} can't start, an endpoint is blocked");
            search.state = SearchState::Failed;
            return Ok(search);
        }

        let h = search.h(start)?;
        search.push_new(start, None, Cost::zero(), h);
        Ok(search)
    }

    /// Expands a single node.
    ///
    /// Once the search is over, the final state is returned without doing any
    /// work. An `Err` leaves the search failed.
    pub fn step(&mut self) -> Result<SearchState, SearchError> {
        if self.state != SearchState::Running {
            return Ok(self.state);
        }

        #[cfg(feature = "coz_profile")]
        coz::scope!("NodeExpansion");

        let Some(current_index) = self.pop() else {
            log::debug!(
                "Theta* from {} to {} exhausted the frontier after {} expansions",
                self.start,
                self.goal,
                self.expanded
            );
            self.state = SearchState::Failed;
            return Ok(self.state);
        };
        self.expanded += 1;

        let current = self.search_tree[current_index].cell;
        if current == self.goal {
            #[cfg(feature = "coz_profile")]
            coz::progress!("GoalFound");
            self.state = SearchState::Succeeded;
            self.goal_index = Some(current_index);
            return Ok(self.state);
        }
        self.search_tree.close(current_index);

        let current_g = self.search_tree[current_index].g;
        // The start is its own anchor.
        let anchor_index = self.search_tree[current_index]
            .parent
            .unwrap_or(current_index);
        let anchor = self.search_tree[anchor_index].cell;
        let anchor_g = self.search_tree[anchor_index].g;

        for neighbour in self.grid.neighbors8(current) {
            #[cfg(feature = "coz_profile")]
            coz::scope!("ReachNode");

            let existing = self.search_tree.get(&neighbour);
            if existing.is_some_and(|i| self.search_tree[i].closed) {
                continue;
            }

            let (parent, g) = if has_line_of_sight(self.grid, anchor, neighbour) {
                (anchor_index, anchor_g + move_cost(anchor, neighbour))
            } else {
                (current_index, current_g + move_cost(current, neighbour))
            };

            match existing {
                Some(neighbour_index) => {
                    if g < self.search_tree[neighbour_index].g {
                        log::trace!(
                            "{neighbour} improves to {g} through {}",
                            self.search_tree[parent].cell
                        );
                        self.search_tree[neighbour_index].reach(parent, g);
                        let h = self.search_tree[neighbour_index].h;
                        let rank = ThetaStarRank::new(g, h, neighbour_index);
                        let key = neighbour_index.as_usize();
                        if self.open.improve(key, rank).is_none() {
                            self.open.push(key, rank);
                        }
                    }
                }
                None => {
                    let h = match self.h(neighbour) {
                        Ok(h) => h,
                        Err(e) => {
                            self.state = SearchState::Failed;
                            return Err(e);
                        }
                    };
                    self.push_new(neighbour, Some(parent), g, h);
                }
            }
        }

        Ok(SearchState::Running)
    }

    /// Steps until the search is over or the budget runs out.
    pub fn run<B: Budget>(&mut self, mut budget: B) -> Result<PathFound, SearchError> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("FindPath");

        loop {
            match self.state {
                SearchState::Running => {
                    if budget.exhausted(self.expanded) {
                        log::debug!(
                            "Theta* from {} to {} ran out of budget after {} expansions",
                            self.start,
                            self.goal,
                            self.expanded
                        );
                        return Err(SearchError::BudgetExhausted {
                            expanded: self.expanded,
                        });
                    }
                    self.step()?;
                }
                SearchState::Succeeded => {
                    if let Some(found) = self.path() {
                        log::debug!(
                            "Theta* from {} to {} found a path of cost {:.3} after {} expansions",
                            self.start,
                            self.goal,
                            found.cost,
                            found.expanded_count
                        );
                        return Ok(found);
                    }
                    unreachable!("Succeeded searches know their goal");
                }
                SearchState::Failed => {
                    return Err(SearchError::NoPathExists {
                        expanded: self.expanded,
                    });
                }
            }
        }
    }

    /// The path found, once the search succeeded.
    #[must_use]
    pub fn path(&self) -> Option<PathFound> {
        let goal_index = self.goal_index?;
        Some(PathFound {
            path: self.search_tree.path(goal_index),
            cost: self.search_tree[goal_index].g.get(),
            expanded_count: self.expanded,
        })
    }

    #[inline(always)]
    pub fn state(&self) -> SearchState {
        self.state
    }
    #[inline(always)]
    pub fn expanded_count(&self) -> usize {
        self.expanded
    }
    #[inline(always)]
    pub fn start(&self) -> Cell {
        self.start
    }
    #[inline(always)]
    pub fn goal(&self) -> Cell {
        self.goal
    }
    /// The nodes reached so far.
    #[inline(always)]
    pub fn search_tree(&self) -> &SearchTree {
        &self.search_tree
    }
    /// How many nodes are waiting in the frontier.
    #[inline(always)]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    #[inline(always)]
    fn h(&self, cell: Cell) -> Result<Cost, SearchError> {
        let value = (self.heuristic)(cell, self.goal);
        Cost::try_new(value).ok_or(SearchError::InvalidHeuristic { cell, value })
    }

    #[inline(always)]
    fn pop(&mut self) -> Option<NodeIndex> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("Pop");

        self.open.pop().map(|e| NodeIndex::from_usize(e.key))
    }

    #[inline(always)]
    fn push_new(&mut self, cell: Cell, parent: Option<NodeIndex>, g: Cost, h: Cost) {
        let node_index = self.search_tree.push(SearchNode::new(cell, parent, g, h));
        self.open
            .push(node_index.as_usize(), ThetaStarRank::new(g, h, node_index));
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use std::mem::size_of;
        use thousands::Separable;

        writeln!(out, "ThetaStarSearch Stats:")?;
        let s = size_of::<SearchNode>();
        let l = self.search_tree.len();
        writeln!(
            out,
            "  - |Nodes|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;

        let s = size_of::<(ThetaStarRank, usize)>();
        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(
            out,
            "  - |Open|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Open|*:  {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        let s = size_of::<(Cell, NodeIndex)>();
        let l = self.search_tree.len();
        let c = self.search_tree.map_capacity();
        writeln!(
            out,
            "  - |Index|:  {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Index|*: {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;

        writeln!(
            out,
            "  - Expanded nodes: {}",
            self.expanded.separate_with_commas()
        )?;

        Ok(())
    }
}

impl<G, H> Debug for ThetaStarSearch<'_, G, H>
where
    G: GridAdapter + ?Sized,
    H: Fn(Cell, Cell) -> f64,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThetaStarSearch")
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("state", &self.state)
            .field("expanded", &self.expanded)
            .field("search_tree", &self.search_tree)
            .field("open", &self.open.len())
            .finish()
    }
}

/// Finds an any-angle path from `start` to `goal`.
///
/// ```
/// use theta_search::algorithms::theta_star::find_path;
/// use theta_search::grid::Cell;
/// use theta_search::heuristic::euclidean;
/// use theta_search::problems::occupancy_grid::OccupancyGrid;
///
/// let grid = OccupancyGrid::new_empty_with_dimensions(5, 5);
/// let found = find_path(Cell::new(0, 0), Cell::new(4, 4), &grid, euclidean).unwrap();
/// assert_eq!(found.path, vec![Cell::new(0, 0), Cell::new(4, 4)]);
/// assert!((found.cost - 4.0 * 2f64.sqrt()).abs() < 1e-9);
/// ```
pub fn find_path<G, H>(start: Cell, goal: Cell, grid: &G, heuristic: H) -> Result<PathFound, SearchError>
where
    G: GridAdapter + ?Sized,
    H: Fn(Cell, Cell) -> f64,
{
    find_path_with_budget(start, goal, grid, heuristic, Unlimited)
}

/// Finds an any-angle path, giving up once `budget` runs out.
pub fn find_path_with_budget<G, H, B>(
    start: Cell,
    goal: Cell,
    grid: &G,
    heuristic: H,
    budget: B,
) -> Result<PathFound, SearchError>
where
    G: GridAdapter + ?Sized,
    H: Fn(Cell, Cell) -> f64,
    B: Budget,
{
    ThetaStarSearch::new(grid, start, goal, heuristic)?.run(budget)
}
