//! # Pathfinding Algorithms
//!
//! Shortest-hop routes over the 4-connected cell lattice.
//!
//! The search is a breadth-first search that expands neighbours in
//! [`Direction::ALL`] order and never revisits a cell, so among routes of equal
//! length the result is always the same one. Because the lattice is implicit and
//! unbounded, every search is confined to a finite window of cells.

use crate::config::DEFAULT_SEARCH_MARGIN;
use crate::{Bounds, Cell, Direction};
use ::pathfinding::prelude::bfs;
use serde::{Deserialize, Serialize};

/// A route from start to goal, both inclusive.
///
/// When no route exists the path holds only the start cell and
/// [`Path::is_found`] is false, so `len() <= 1` keeps meaning "nowhere to go".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    cells: Vec<Cell>,
    found: bool,
}

impl Path {
    fn not_found(start: Cell) -> Self {
        Self {
            cells: vec![start],
            found: false,
        }
    }

    /// Whether the goal was reached.
    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of moves along the path.
    pub fn hop_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn start(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    /// Last cell of the path; the start cell when nothing was found.
    pub fn last(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }
}

/// Breadth-first path finder with a bounded search window.
///
/// # Examples
///
/// ```
/// use tilechase::{Bounds, Cell, PathFinder};
///
/// let finder = PathFinder::new().with_bounds(Some(Bounds::from_size(5, 5)));
/// let path = finder.find(Cell::new(0, 0), Cell::new(4, 4), |_, _| false);
/// assert!(path.is_found());
/// assert_eq!(path.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathFinder {
    margin: i32,
    bounds: Option<Bounds>,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFinder {
    /// Creates a finder with the default search margin and no fixed bounds.
    pub fn new() -> Self {
        Self {
            margin: DEFAULT_SEARCH_MARGIN,
            bounds: None,
        }
    }

    /// Sets how far past the start/goal rectangle an unbounded search may roam.
    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin.max(0);
        self
    }

    /// Confines the search to `bounds` instead of the margin window.
    pub fn with_bounds(mut self, bounds: Option<Bounds>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Cells the search may expand into when going from `start` to `goal`.
    pub fn window(&self, start: Cell, goal: Cell) -> Bounds {
        self.bounds
            .unwrap_or_else(|| Bounds::new(start, goal).expand(self.margin))
    }

    /// Finds the shortest-hop route from `start` to `goal`.
    ///
    /// `is_blocked(cell, direction)` answers whether stepping from `cell` in
    /// `direction` is forbidden.
    pub fn find<F>(&self, start: Cell, goal: Cell, is_blocked: F) -> Path
    where
        F: Fn(Cell, Direction) -> bool,
    {
        if start == goal {
            return Path {
                cells: vec![start],
                found: true,
            };
        }

        let window = self.window(start, goal);
        let successors = |cell: &Cell| {
            let cell = *cell;
            Direction::ALL
                .into_iter()
                .filter_map(|direction| {
                    let next = cell.checked_step(direction)?;
                    (window.contains(next) && !is_blocked(cell, direction)).then_some(next)
                })
                .collect::<Vec<_>>()
        };

        match bfs(&start, successors, |cell| *cell == goal) {
            Some(cells) => Path { cells, found: true },
            None => Path::not_found(start),
        }
    }
}

/// Finds a route with the default [`PathFinder`].
///
/// # Examples
///
/// ```
/// use tilechase::{find_path, Cell};
///
/// let start = Cell::new(2, 2);
/// assert_eq!(find_path(start, start, |_, _| false).cells(), &[start]);
/// ```
pub fn find_path<F>(start: Cell, goal: Cell, is_blocked: F) -> Path
where
    F: Fn(Cell, Direction) -> bool,
{
    PathFinder::new().find(start, goal, is_blocked)
}
