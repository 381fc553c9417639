//! # World Module
//!
//! Mapping between world space and the cell lattice, the query interface the
//! host engine supplies, and [`Level`], the in-crate implementation of it.

use crate::{AgentId, Cell, ChaseError, ChaseResult, TargetId};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Maps continuous world positions to cells and back.
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use tilechase::{Cell, GridIndex};
///
/// let grid = GridIndex::new(Vec2::ZERO, 2.0).unwrap();
/// assert_eq!(grid.world_to_cell(Vec2::new(3.9, -0.1)), Cell::new(1, -1));
/// assert_eq!(grid.cell_to_world_center(Cell::new(1, -1)), Vec2::new(3.0, -1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridIndex {
    origin: Vec2,
    cell_size: f32,
}

impl GridIndex {
    /// Creates a grid whose cell (0, 0) has its lower-left corner at `origin`.
    pub fn new(origin: Vec2, cell_size: f32) -> ChaseResult<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ChaseError::InvalidConfig(format!(
                "cell size must be positive, got {}",
                cell_size
            )));
        }
        if !origin.is_finite() {
            return Err(ChaseError::InvalidConfig(
                "grid origin must be finite".to_string(),
            ));
        }
        Ok(Self { origin, cell_size })
    }

    /// Unit cells with the origin at zero.
    pub fn unit() -> Self {
        Self {
            origin: Vec2::ZERO,
            cell_size: 1.0,
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Returns the cell containing `position`.
    pub fn world_to_cell(&self, position: Vec2) -> Cell {
        let local = (position - self.origin) / self.cell_size;
        Cell::new(local.x.floor() as i32, local.y.floor() as i32)
    }

    /// Returns the world position of the centre of `cell`.
    pub fn cell_to_world_center(&self, cell: Cell) -> Vec2 {
        self.origin + (Vec2::new(cell.x as f32, cell.y as f32) + Vec2::splat(0.5)) * self.cell_size
    }
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::unit()
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Cell,
    pub max: Cell,
}

impl Bounds {
    /// Creates bounds spanning both corners, whatever order they come in.
    pub fn new(a: Cell, b: Cell) -> Self {
        Self {
            min: Cell::new(a.x.min(b.x), a.y.min(b.y)),
            max: Cell::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Bounds of a `width` x `height` grid starting at (0, 0).
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(
            Cell::new(0, 0),
            Cell::new(width.max(1) as i32 - 1, height.max(1) as i32 - 1),
        )
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Grows the rectangle by `margin` cells on every side, stopping at the
    /// edge of the lattice.
    pub fn expand(self, margin: i32) -> Self {
        Self {
            min: Cell::new(
                self.min.x.saturating_sub(margin),
                self.min.y.saturating_sub(margin),
            ),
            max: Cell::new(
                self.max.x.saturating_add(margin),
                self.max.y.saturating_add(margin),
            ),
        }
    }

    pub fn width(&self) -> u32 {
        self.min.x.abs_diff(self.max.x).saturating_add(1)
    }

    pub fn height(&self) -> u32 {
        self.min.y.abs_diff(self.max.y).saturating_add(1)
    }
}

/// A chaseable thing as reported by a radius query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: TargetId,
    pub position: Vec2,
}

/// Queries the AI needs from the collision layer.
///
/// Implementations must answer consistently for the duration of a tick; in
/// particular `targets_within_radius` must return the same order when asked twice
/// in one tick so tie-breaks stay deterministic.
pub trait SpatialQueries {
    /// Grid used for world/cell conversion.
    fn grid(&self) -> &GridIndex;

    /// Whether a static wall occupies `cell`.
    fn is_wall_at(&self, cell: Cell) -> bool;

    /// Whether an agent other than `self_id` occupies `cell`.
    fn is_occupied_by_other_agent(&self, cell: Cell, self_id: AgentId) -> bool;

    /// Whether a straight segment between two points crosses no wall.
    fn raycast_clear(&self, from: Vec2, to: Vec2) -> bool;

    /// Targets within `radius` of `position`.
    fn targets_within_radius(&self, position: Vec2, radius: f32) -> Vec<TargetRef>;

    /// Current position of a target, or `None` once it is gone.
    fn target_position(&self, target: TargetId) -> Option<Vec2>;

    /// Finite window path searches are confined to, if the world has one.
    fn search_bounds(&self) -> Option<Bounds> {
        None
    }
}

/// Static walls plus the dynamic occupants of one level.
///
/// Gate cells behave as walls until [`Level::open_gates`] is called. Agents
/// register the cells they occupy through [`Level::claim`]; targets through
/// [`Level::set_target`].
#[derive(Debug, Clone)]
pub struct Level {
    grid: GridIndex,
    bounds: Option<Bounds>,
    walls: HashSet<Cell>,
    gates: HashSet<Cell>,
    gates_open: bool,
    keys: BTreeSet<Cell>,
    goals: HashSet<Cell>,
    occupants: HashMap<AgentId, Vec<Cell>>,
    targets: Vec<TargetRef>,
}

impl Level {
    /// Creates an empty, unbounded level.
    pub fn new(grid: GridIndex) -> Self {
        Self {
            grid,
            bounds: None,
            walls: HashSet::new(),
            gates: HashSet::new(),
            gates_open: false,
            keys: BTreeSet::new(),
            goals: HashSet::new(),
            occupants: HashMap::new(),
            targets: Vec::new(),
        }
    }

    /// Restricts path searches to `bounds`.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn add_wall(&mut self, cell: Cell) {
        self.walls.insert(cell);
    }

    pub fn remove_wall(&mut self, cell: Cell) {
        self.walls.remove(&cell);
    }

    pub fn walls(&self) -> impl Iterator<Item = &Cell> {
        self.walls.iter()
    }

    pub fn add_gate(&mut self, cell: Cell) {
        self.gates.insert(cell);
    }

    pub fn is_gate(&self, cell: Cell) -> bool {
        self.gates.contains(&cell)
    }

    pub fn gates_open(&self) -> bool {
        self.gates_open
    }

    /// Makes every gate cell passable.
    pub fn open_gates(&mut self) {
        self.gates_open = true;
    }

    pub fn close_gates(&mut self) {
        self.gates_open = false;
    }

    pub fn add_key(&mut self, cell: Cell) {
        self.keys.insert(cell);
    }

    pub fn has_key(&self, cell: Cell) -> bool {
        self.keys.contains(&cell)
    }

    /// Removes the key at `cell`, returning whether there was one.
    pub fn take_key(&mut self, cell: Cell) -> bool {
        self.keys.remove(&cell)
    }

    pub fn remaining_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn add_goal(&mut self, cell: Cell) {
        self.goals.insert(cell);
    }

    pub fn is_goal(&self, cell: Cell) -> bool {
        self.goals.contains(&cell)
    }

    /// Records the cells `agent` currently occupies, replacing earlier claims.
    pub fn claim(&mut self, agent: AgentId, cells: Vec<Cell>) {
        self.occupants.insert(agent, cells);
    }

    pub fn release(&mut self, agent: AgentId) {
        self.occupants.remove(&agent);
    }

    /// Returns the agents claiming `cell`.
    pub fn occupants_of(&self, cell: Cell) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self
            .occupants
            .iter()
            .filter(|(_, cells)| cells.contains(&cell))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Adds or moves a target. New targets go to the end of the query order.
    pub fn set_target(&mut self, id: TargetId, position: Vec2) {
        match self.targets.iter_mut().find(|target| target.id == id) {
            Some(target) => target.position = position,
            None => self.targets.push(TargetRef { id, position }),
        }
    }

    pub fn remove_target(&mut self, id: TargetId) {
        self.targets.retain(|target| target.id != id);
    }

    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }
}

impl SpatialQueries for Level {
    fn grid(&self) -> &GridIndex {
        &self.grid
    }

    fn is_wall_at(&self, cell: Cell) -> bool {
        self.walls.contains(&cell) || (!self.gates_open && self.gates.contains(&cell))
    }

    fn is_occupied_by_other_agent(&self, cell: Cell, self_id: AgentId) -> bool {
        self.occupants
            .iter()
            .any(|(id, cells)| *id != self_id && cells.contains(&cell))
    }

    /// Walks every cell the segment touches (Amanatides-Woo traversal).
    fn raycast_clear(&self, from: Vec2, to: Vec2) -> bool {
        let start = self.grid.world_to_cell(from);
        let end = self.grid.world_to_cell(to);
        let steps = start.manhattan_distance(end);

        let local = (from - self.grid.origin()) / self.grid.cell_size();
        let dir = (to - from) / self.grid.cell_size();

        let axis = |origin: f32, cell: i32, d: f32| -> (i32, f32, f32) {
            if d > 0.0 {
                (1, ((cell + 1) as f32 - origin) / d, 1.0 / d)
            } else if d < 0.0 {
                (-1, (cell as f32 - origin) / d, -1.0 / d)
            } else {
                (0, f32::INFINITY, f32::INFINITY)
            }
        };
        let (step_x, mut t_max_x, t_delta_x) = axis(local.x, start.x, dir.x);
        let (step_y, mut t_max_y, t_delta_y) = axis(local.y, start.y, dir.y);

        let mut cell = start;
        for _ in 0..=steps {
            if self.is_wall_at(cell) {
                return false;
            }
            if cell == end {
                break;
            }
            if t_max_x < t_max_y {
                cell.x += step_x;
                t_max_x += t_delta_x;
            } else {
                cell.y += step_y;
                t_max_y += t_delta_y;
            }
        }
        true
    }

    fn targets_within_radius(&self, position: Vec2, radius: f32) -> Vec<TargetRef> {
        self.targets
            .iter()
            .filter(|target| target.position.distance(position) <= radius)
            .copied()
            .collect()
    }

    fn target_position(&self, target: TargetId) -> Option<Vec2> {
        self.targets
            .iter()
            .find(|candidate| candidate.id == target)
            .map(|candidate| candidate.position)
    }

    fn search_bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}
