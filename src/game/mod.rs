//! # Game Module
//!
//! Grid primitives, agents and level rules.
//!
//! This module contains the building blocks of a chase level:
//! - Cell coordinates and the four movement directions
//! - World/grid mapping and the spatial queries an engine provides
//! - Perception, step movement and the enemy/player/route movers
//! - The level session that owns everything and applies the rules

pub mod enemy;
pub mod movement;
pub mod occupancy;
pub mod perception;
pub mod player;
pub mod route;
pub mod sequence;
pub mod settings;
pub mod state;
pub mod world;

pub use enemy::*;
pub use movement::*;
pub use occupancy::*;
pub use perception::*;
pub use player::*;
pub use route::*;
pub use sequence::*;
pub use settings::*;
pub use state::*;
pub use world::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a cell of the implicit grid lattice as (column, row).
///
/// Rows grow upwards, matching world space.
///
/// # Examples
///
/// ```
/// use tilechase::{Cell, Direction};
///
/// let cell = Cell::new(2, 3);
/// assert_eq!(cell.step(Direction::Up), Cell::new(2, 4));
/// assert_eq!(cell.manhattan_distance(Cell::new(0, 0)), 5);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    /// Creates a new cell with the given coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell one step in `direction`.
    ///
    /// At the edge of the `i32` lattice the step saturates and the cell itself
    /// is returned.
    pub fn step(self, direction: Direction) -> Cell {
        self.checked_step(direction).unwrap_or(self)
    }

    /// Returns the neighbouring cell, or `None` past the edge of the lattice.
    pub fn checked_step(self, direction: Direction) -> Option<Cell> {
        let (dx, dy) = direction.delta();
        Some(Cell::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Calculates the Manhattan distance to another cell.
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// Returns true when `other` is exactly one orthogonal step away.
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four grid directions.
///
/// [`Direction::ALL`] fixes the iteration order used everywhere a search or a
/// random pick enumerates directions: up, down, left, right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in search order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Converts a direction to a cell delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::Direction;
    ///
    /// assert_eq!(Direction::Up.delta(), (0, 1));
    /// assert_eq!(Direction::Left.delta(), (-1, 0));
    /// ```
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Returns the reverse direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Reduces the offset between two cells to a single direction.
    ///
    /// The dominant axis wins; the horizontal axis only wins when it is strictly
    /// larger. Returns `None` when both cells are the same.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::{Cell, Direction};
    ///
    /// let from = Cell::new(0, 0);
    /// assert_eq!(Direction::toward(from, Cell::new(3, 1)), Some(Direction::Right));
    /// assert_eq!(Direction::toward(from, Cell::new(2, -2)), Some(Direction::Down));
    /// assert_eq!(Direction::toward(from, from), None);
    /// ```
    pub fn toward(from: Cell, to: Cell) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx.abs() > dy.abs() {
            Some(if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else if dy != 0 {
            Some(if dy > 0 { Direction::Up } else { Direction::Down })
        } else {
            None
        }
    }

    /// Lowercase name, as used in logs and scripts.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Unique identifier for moving agents (enemies and hazards).
pub type AgentId = Uuid;

/// Unique identifier for things agents can chase.
pub type TargetId = Uuid;

/// Creates a new unique agent or target id.
pub fn new_entity_id() -> Uuid {
    Uuid::new_v4()
}

/// Creates a v4 id from `rng`, so seeded runs hand out the same ids every time.
pub fn entity_id_from_rng<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}
