use std::path::Path;
use std::path::PathBuf;

use derive_more::Display;
use thiserror::Error;

use crate::grid::Cell;
use crate::grid::Coord;
use crate::grid::GridAdapter;
use crate::grid::GridError;
use crate::grid::Occupancy;

const MAX_ELEMENTS_DISPLAYED: usize = 20;
const RANDOM_CELL_MAX_TRIES: usize = 10_000;

// Simple colours
const WHITE: [u8; 3] = [u8::MAX, u8::MAX, u8::MAX];
const BLACK: [u8; 3] = [u8::MIN, u8::MIN, u8::MIN];
const GREEN: [u8; 3] = [u8::MIN, u8::MAX, u8::MIN];
const BLUE: [u8; 3] = [u8::MIN, u8::MIN, u8::MAX];

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridCell {
    #[display("░")]
    Free,
    #[display("█")]
    Blocked,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridCellParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
}

impl TryFrom<char> for GridCell {
    type Error = GridCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            ' ' | '.' => Ok(GridCell::Free),
            '#' | '█' => Ok(GridCell::Blocked),
            ch => Err(GridCellParseError::InvalidCharacter(ch)),
        }
    }
}

/// A dense, row-major occupancy grid.
#[derive(Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cells: Vec<GridCell>,
}

impl OccupancyGrid {
    #[must_use]
    pub fn new_empty_with_dimensions(width: usize, height: usize) -> Self {
        debug_assert!(Self::safe_dimensions(width, height));
        Self {
            width,
            height,
            cells: vec![GridCell::Free; width * height],
        }
    }

    /// A grid where each cell is blocked with probability `density`.
    pub fn random<R: rand::Rng>(rng: &mut R, width: usize, height: usize, density: f64) -> Self {
        let density = if density.is_nan() {
            0.0
        } else {
            density.clamp(0.0, 1.0)
        };
        let mut grid = Self::new_empty_with_dimensions(width, height);
        for cell in &mut grid.cells {
            if rng.random_bool(density) {
                *cell = GridCell::Blocked;
            }
        }
        grid
    }

    fn safe_dimensions(width: usize, height: usize) -> bool {
        width <= Coord::MAX as usize
            && height <= Coord::MAX as usize
            && width.checked_mul(height).is_some()
    }

    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline(always)]
    fn index(&self, cell: Cell) -> usize {
        debug_assert!((cell.x as usize) < self.width);
        debug_assert!((cell.y as usize) < self.height);
        cell.y as usize * self.width + cell.x as usize
    }

    /// The cell at an in-bounds position.
    #[inline(always)]
    #[must_use]
    pub fn at(&self, cell: Cell) -> GridCell {
        self.cells[self.index(cell)]
    }

    pub fn set(&mut self, cell: Cell, value: GridCell) {
        let i = self.index(cell);
        self.cells[i] = value;
    }

    #[must_use]
    pub fn free_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c == GridCell::Free).count()
    }

    pub fn random_free_cell<R: rand::Rng>(&self, rng: &mut R) -> Option<Cell> {
        if self.cells.is_empty() {
            return None;
        }
        for _tries in 0..RANDOM_CELL_MAX_TRIES {
            let x = rng.random_range(0..self.width);
            let y = rng.random_range(0..self.height);
            let cell = Cell::new(x as Coord, y as Coord);
            if self.at(cell) == GridCell::Free {
                return Some(cell);
            }
        }
        None
    }

    /// Parses rows of cells, along with any `S` and `G` markers.
    fn parse(s: &str) -> Result<(Self, Vec<Cell>, Vec<Cell>), GridProblemParseError> {
        let mut lines: Vec<&str> = s.lines().collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() || lines[0].is_empty() {
            return Err(GridProblemParseError::EmptyInput);
        }

        let width = lines[0].chars().count();
        let height = lines.len();
        if !Self::safe_dimensions(width, height) {
            return Err(GridProblemParseError::TooLarge { width, height });
        }

        let mut grid = Self::new_empty_with_dimensions(width, height);
        let mut starts = vec![];
        let mut goals = vec![];
        for (y, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridProblemParseError::RaggedRow {
                    y,
                    found,
                    expected: width,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                let cell = Cell::new(x as Coord, y as Coord);
                let value = match ch {
                    'S' => {
                        starts.push(cell);
                        GridCell::Free
                    }
                    'G' => {
                        goals.push(cell);
                        GridCell::Free
                    }
                    ch => GridCell::try_from(ch)
                        .map_err(|e| GridProblemParseError::InvalidCell { e, x, y })?,
                };
                grid.set(cell, value);
            }
        }

        Ok((grid, starts, goals))
    }

    /// Loads a black and white image, blue and green pixels mark the start and
    /// goal.
    fn load_image(p: &Path) -> Result<(Self, Vec<Cell>, Vec<Cell>), GridProblemParseError> {
        use image::ImageReader;
        use image::Rgb;

        let img = ImageReader::open(p)
            .map_err(|e| GridProblemParseError::IOError {
                p: p.to_path_buf(),
                e,
            })?
            .decode()
            .map_err(|e| GridProblemParseError::ImageError {
                p: p.to_path_buf(),
                e,
            })?
            .into_rgb8();

        let (width, height) = (img.width() as usize, img.height() as usize);
        if width == 0 || height == 0 {
            return Err(GridProblemParseError::EmptyInput);
        }
        if !Self::safe_dimensions(width, height) {
            return Err(GridProblemParseError::TooLarge { width, height });
        }

        let mut grid = Self::new_empty_with_dimensions(width, height);
        let mut starts = vec![];
        let mut goals = vec![];
        for y in 0..img.height() {
            for x in 0..img.width() {
                let px: &Rgb<u8> = img.get_pixel(x, y);
                let cell = Cell::new(x, y);
                let value = match px.0 {
                    BLACK => GridCell::Blocked,
                    WHITE => GridCell::Free,
                    GREEN => {
                        goals.push(cell);
                        GridCell::Free
                    }
                    BLUE => {
                        starts.push(cell);
                        GridCell::Free
                    }
                    _ => GridCell::Free,
                };
                grid.set(cell, value);
            }
        }

        Ok((grid, starts, goals))
    }

    fn read(p: &Path) -> Result<(Self, Vec<Cell>, Vec<Cell>), GridProblemParseError> {
        let is_text = p
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if is_text {
            let s = std::fs::read_to_string(p).map_err(|e| GridProblemParseError::IOError {
                p: p.to_path_buf(),
                e,
            })?;
            Self::parse(&s)
        } else {
            Self::load_image(p)
        }
    }
}

impl GridAdapter for OccupancyGrid {
    #[inline(always)]
    fn width(&self) -> usize {
        self.width
    }
    #[inline(always)]
    fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    fn occupancy(&self, x: i64, y: i64) -> Occupancy {
        if !self.contains(x, y) {
            return Occupancy::OutOfBounds;
        }
        match self.cells[y as usize * self.width + x as usize] {
            GridCell::Free => Occupancy::Free,
            GridCell::Blocked => Occupancy::Blocked,
        }
    }
}

/// Ignores `S` and `G` markers, which are free cells.
impl TryFrom<&str> for OccupancyGrid {
    type Error = GridProblemParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s).map(|(grid, _, _)| grid)
    }
}

/// Reads `.txt` files as text and anything else as an image.
impl TryFrom<&Path> for OccupancyGrid {
    type Error = GridProblemParseError;

    fn try_from(p: &Path) -> Result<Self, Self::Error> {
        Self::read(p).map(|(grid, _, _)| grid)
    }
}

impl std::fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "OccupancyGrid({}x{}):", self.width, self.height)?;
        for line in self.cells.chunks(self.width.max(1)).take(MAX_ELEMENTS_DISPLAYED) {
            for cell in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for OccupancyGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "OccupancyGrid{:?}", self.dimensions())
    }
}

#[derive(Debug, Error)]
pub enum GridProblemParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("A {width}x{height} grid is too large")]
    TooLarge { width: usize, height: usize },
    #[error("Row {y} has {found} cells, expected {expected}")]
    RaggedRow {
        y: usize,
        found: usize,
        expected: usize,
    },
    #[error("Invalid cell {e} found at ({x},{y})")]
    InvalidCell {
        e: GridCellParseError,
        x: usize,
        y: usize,
    },
    #[error("Missing start")]
    MissingStart,
    #[error("Missing goal")]
    MissingGoal,
    #[error("Found {0} starts, expected one")]
    DuplicateStart(usize),
    #[error("Found {0} goals, expected one")]
    DuplicateGoal(usize),
    #[error("I/O error when loading '{p}': {e}")]
    IOError { p: PathBuf, e: std::io::Error },
    #[error("Image error when loading '{p}': {e}")]
    ImageError { p: PathBuf, e: image::ImageError },
}

/// A grid with a start and a goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridProblem {
    pub grid: OccupancyGrid,
    pub start: Cell,
    pub goal: Cell,
}

impl GridProblem {
    pub fn new(grid: OccupancyGrid, start: Cell, goal: Cell) -> Result<Self, GridError> {
        let (sx, sy) = start.signed();
        let (gx, gy) = goal.signed();
        grid.cell_at(sx, sy)?;
        grid.cell_at(gx, gy)?;
        Ok(Self { grid, start, goal })
    }

    /// Places a random start and goal on free cells of `grid`.
    pub fn randomize<R: rand::Rng>(rng: &mut R, grid: OccupancyGrid) -> Option<Self> {
        let start = grid.random_free_cell(rng)?;
        let goal = grid.random_free_cell(rng)?;
        Some(Self { grid, start, goal })
    }

    /// A random grid with a random start and goal.
    pub fn random<R: rand::Rng>(
        rng: &mut R,
        width: usize,
        height: usize,
        density: f64,
    ) -> Option<Self> {
        let grid = OccupancyGrid::random(rng, width, height, density);
        Self::randomize(rng, grid)
    }

    fn from_parts(
        (grid, starts, goals): (OccupancyGrid, Vec<Cell>, Vec<Cell>),
    ) -> Result<Self, GridProblemParseError> {
        let start = match starts.as_slice() {
            [] => return Err(GridProblemParseError::MissingStart),
            [s] => *s,
            _ => return Err(GridProblemParseError::DuplicateStart(starts.len())),
        };
        let goal = match goals.as_slice() {
            [] => return Err(GridProblemParseError::MissingGoal),
            [g] => *g,
            _ => return Err(GridProblemParseError::DuplicateGoal(goals.len())),
        };
        Ok(Self { grid, start, goal })
    }
}

impl TryFrom<&str> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_parts(OccupancyGrid::parse(s)?)
    }
}

impl TryFrom<&Path> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(p: &Path) -> Result<Self, Self::Error> {
        Self::from_parts(OccupancyGrid::read(p)?)
    }
}

impl std::fmt::Display for GridProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (width, height) = self.grid.dimensions();
        writeln!(
            f,
            "GridProblem({width}x{height}) (s:{}, g:{}):",
            self.start, self.goal
        )?;
        for y in 0..height.min(MAX_ELEMENTS_DISPLAYED) {
            for x in 0..width.min(MAX_ELEMENTS_DISPLAYED) {
                let c = Cell::new(x as Coord, y as Coord);
                match (c == self.start, c == self.goal) {
                    (true, true) => write!(f, "!")?,
                    (true, false) => write!(f, "S")?,
                    (false, true) => write!(f, "G")?,
                    (false, false) => write!(f, "{}", self.grid.at(c))?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn parse_problem() {
        let problem = GridProblem::try_from(indoc! {"
          S.#
          .█.
          ..G
        "})
        .unwrap();
        assert_eq!(problem.start, Cell::new(0, 0));
        assert_eq!(problem.goal, Cell::new(2, 2));
        assert_eq!(problem.grid.dimensions(), (3, 3));
        assert_eq!(problem.grid.at(Cell::new(2, 0)), GridCell::Blocked);
        assert_eq!(problem.grid.at(Cell::new(1, 1)), GridCell::Blocked);
        assert_eq!(problem.grid.at(Cell::new(0, 0)), GridCell::Free);
        assert_eq!(problem.grid.free_cells(), 7);

        assert_eq!(
            problem.to_string(),
            "GridProblem(3x3) (s:(0,0), g:(2,2)):\nS░█\n░█░\n░░G\n"
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            GridProblem::try_from(""),
            Err(GridProblemParseError::EmptyInput)
        ));
        assert!(matches!(
            GridProblem::try_from("S..\n..\n..G"),
            Err(GridProblemParseError::RaggedRow {
                y: 1,
                found: 2,
                expected: 3
            })
        ));
        assert!(matches!(
            GridProblem::try_from("S.x\n..G"),
            Err(GridProblemParseError::InvalidCell {
                e: GridCellParseError::InvalidCharacter('x'),
                x: 2,
                y: 0
            })
        ));
        assert!(matches!(
            GridProblem::try_from("...\n..G"),
            Err(GridProblemParseError::MissingStart)
        ));
        assert!(matches!(
            GridProblem::try_from("S..\n..."),
            Err(GridProblemParseError::MissingGoal)
        ));
        assert!(matches!(
            GridProblem::try_from("S.S\n..G"),
            Err(GridProblemParseError::DuplicateStart(2))
        ));
        assert!(matches!(
            GridProblem::try_from("SGG\n..."),
            Err(GridProblemParseError::DuplicateGoal(2))
        ));
        assert!(matches!(
            GridProblem::try_from(Path::new("/nonexistent/grid.txt")),
            Err(GridProblemParseError::IOError { .. })
        ));
    }

    #[test]
    fn trailing_blank_lines() {
        let problem = GridProblem::try_from("S..\n..G\n\n").unwrap();
        assert_eq!(problem.grid.dimensions(), (3, 2));
        assert_eq!(problem.goal, Cell::new(2, 1));
        assert_eq!(
            OccupancyGrid::try_from("..#\r\n...\r\n").unwrap().dimensions(),
            (3, 2)
        );
        assert!(matches!(
            GridProblem::try_from("\n\n"),
            Err(GridProblemParseError::EmptyInput)
        ));
        // Blank rows in the middle are still ragged.
        assert!(matches!(
            GridProblem::try_from("S..\n\n..G"),
            Err(GridProblemParseError::RaggedRow { y: 1, found: 0, .. })
        ));
    }

    #[test]
    fn load_images() {
        let mut img = image::RgbImage::from_pixel(4, 3, image::Rgb(WHITE));
        img.put_pixel(0, 2, image::Rgb(BLUE));
        img.put_pixel(3, 0, image::Rgb(GREEN));
        img.put_pixel(1, 1, image::Rgb(BLACK));
        img.put_pixel(2, 1, image::Rgb(BLACK));
        img.put_pixel(2, 2, image::Rgb([200, 10, 10]));

        let p = std::env::temp_dir().join(format!("theta-search-{}-grid.png", std::process::id()));
        img.save(&p).unwrap();
        let problem = GridProblem::try_from(p.as_path());
        let grid = OccupancyGrid::try_from(p.as_path());
        std::fs::remove_file(&p).unwrap();

        let problem = problem.unwrap();
        assert_eq!(problem.grid.dimensions(), (4, 3));
        assert_eq!(problem.start, Cell::new(0, 2));
        assert_eq!(problem.goal, Cell::new(3, 0));
        assert_eq!(problem.grid.at(Cell::new(1, 1)), GridCell::Blocked);
        assert_eq!(problem.grid.at(Cell::new(2, 1)), GridCell::Blocked);
        // Other colours are free.
        assert_eq!(problem.grid.at(Cell::new(2, 2)), GridCell::Free);
        assert_eq!(problem.grid.free_cells(), 10);
        assert_eq!(grid.unwrap(), problem.grid);

        let missing = std::env::temp_dir().join("theta-search-missing-grid.png");
        assert!(matches!(
            GridProblem::try_from(missing.as_path()),
            Err(GridProblemParseError::IOError { .. })
        ));
    }

    #[test]
    fn grid_ignores_markers() {
        let grid = OccupancyGrid::try_from("S.#\n..G").unwrap();
        assert_eq!(grid.occupancy(0, 0), Occupancy::Free);
        assert_eq!(grid.occupancy(2, 0), Occupancy::Blocked);
        assert_eq!(grid.occupancy(2, 1), Occupancy::Free);
        assert_eq!(grid.occupancy(3, 1), Occupancy::OutOfBounds);
        assert_eq!(grid.occupancy(0, -1), Occupancy::OutOfBounds);
    }

    #[test]
    fn display_is_capped() {
        let grid = OccupancyGrid::new_empty_with_dimensions(30, 25);
        let s = grid.to_string();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "OccupancyGrid(30x25):");
        assert_eq!(lines.len(), 1 + MAX_ELEMENTS_DISPLAYED);
        assert_eq!(lines[1].chars().count(), MAX_ELEMENTS_DISPLAYED);
    }

    #[test]
    fn random_grids() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let empty = OccupancyGrid::random(&mut rng, 8, 6, 0.0);
        assert_eq!(empty, OccupancyGrid::new_empty_with_dimensions(8, 6));
        let full = OccupancyGrid::random(&mut rng, 8, 6, 1.0);
        assert_eq!(full.free_cells(), 0);
        assert_eq!(full.random_free_cell(&mut rng), None);
        assert_eq!(GridProblem::randomize(&mut rng, full), None);

        let mut a = ChaCha8Rng::seed_from_u64(3);
        let mut b = ChaCha8Rng::seed_from_u64(3);
        let pa = GridProblem::random(&mut a, 10, 10, 0.3).unwrap();
        let pb = GridProblem::random(&mut b, 10, 10, 0.3).unwrap();
        assert_eq!(pa, pb);
        assert_eq!(pa.grid.at(pa.start), GridCell::Free);
        assert_eq!(pa.grid.at(pa.goal), GridCell::Free);
    }

    #[test]
    fn problems_check_bounds() {
        let grid = OccupancyGrid::new_empty_with_dimensions(2, 2);
        assert!(GridProblem::new(grid.clone(), Cell::new(0, 0), Cell::new(1, 1)).is_ok());
        assert!(GridProblem::new(grid, Cell::new(0, 0), Cell::new(2, 1)).is_err());
    }
}
