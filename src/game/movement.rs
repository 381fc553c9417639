//! # Step Movement
//!
//! Moves an actor one whole cell at a time.
//!
//! A step is requested in the decision phase and carried out over one or more
//! movement-phase ticks. The logical cell stays on the cell the step started
//! from until the physical position reaches the destination centre; only then
//! does the cell advance, exactly once.

use crate::{approx_same, move_towards, Cell, Direction, GridIndex};
use glam::Vec2;

/// Outcome of [`StepMover::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRequest {
    /// A new step toward the given cell began
    Started(Cell),
    /// A step is in flight; the direction was queued instead
    Buffered,
}

/// Cell-by-cell mover shared by enemies and the player.
///
/// # Examples
///
/// ```
/// use tilechase::{Cell, Direction, GridIndex, StepMover, StepRequest};
///
/// let grid = GridIndex::unit();
/// let mut mover = StepMover::new(Cell::new(0, 0), 2.0, &grid);
/// assert_eq!(mover.request(Direction::Right, &grid), StepRequest::Started(Cell::new(1, 0)));
///
/// assert_eq!(mover.tick(0.25, &grid), None);
/// assert_eq!(mover.cell(), Cell::new(0, 0));
/// assert_eq!(mover.tick(0.25, &grid), Some(Cell::new(1, 0)));
/// assert!(!mover.in_transit());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StepMover {
    cell: Cell,
    position: Vec2,
    destination: Option<Cell>,
    target_position: Vec2,
    base_speed: f32,
    speed_factor: f32,
    buffered: Option<Direction>,
}

impl StepMover {
    /// Creates a mover resting on the centre of `cell`.
    ///
    /// `base_speed` is in cells per second.
    pub fn new(cell: Cell, base_speed: f32, grid: &GridIndex) -> Self {
        let position = grid.cell_to_world_center(cell);
        Self {
            cell,
            position,
            destination: None,
            target_position: position,
            base_speed,
            speed_factor: 1.0,
            buffered: None,
        }
    }

    /// Logical cell; fixed while a step is in flight.
    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn destination(&self) -> Option<Cell> {
        self.destination
    }

    pub fn in_transit(&self) -> bool {
        self.destination.is_some()
    }

    /// Effective speed in cells per second.
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_factor
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = factor;
    }

    pub fn reset_speed(&mut self) {
        self.speed_factor = 1.0;
    }

    /// Cells this mover is physically touching: its cell plus any destination.
    pub fn claimed_cells(&self) -> Vec<Cell> {
        match self.destination {
            Some(destination) => vec![self.cell, destination],
            None => vec![self.cell],
        }
    }

    /// Starts a step in `direction`, or queues it if a step is in flight.
    ///
    /// No blocking check happens here; callers decide whether the step is legal.
    pub fn request(&mut self, direction: Direction, grid: &GridIndex) -> StepRequest {
        if self.in_transit() {
            self.buffered = Some(direction);
            return StepRequest::Buffered;
        }
        let destination = self.cell.step(direction);
        self.destination = Some(destination);
        self.target_position = grid.cell_to_world_center(destination);
        log::trace!("step {} -> {} ({})", self.cell, destination, direction.name());
        StepRequest::Started(destination)
    }

    pub fn buffered(&self) -> Option<Direction> {
        self.buffered
    }

    pub fn take_buffered(&mut self) -> Option<Direction> {
        self.buffered.take()
    }

    pub fn clear_buffered(&mut self) {
        self.buffered = None;
    }

    /// Advances the in-flight step; returns the new cell on arrival.
    pub fn tick(&mut self, dt: f32, grid: &GridIndex) -> Option<Cell> {
        let destination = self.destination?;
        let max_delta = self.speed() * grid.cell_size() * dt.max(0.0);
        self.position = move_towards(self.position, self.target_position, max_delta);

        if approx_same(self.position, self.target_position) {
            self.position = self.target_position;
            self.cell = destination;
            self.destination = None;
            return Some(destination);
        }
        None
    }

    /// Abandons any in-flight step and queued direction, snapping back to the
    /// centre of the logical cell. Safe to call repeatedly.
    pub fn halt(&mut self, grid: &GridIndex) {
        self.destination = None;
        self.buffered = None;
        self.position = grid.cell_to_world_center(self.cell);
        self.target_position = self.position;
    }

    /// Places the mover on `cell` with nothing in flight.
    pub fn teleport(&mut self, cell: Cell, grid: &GridIndex) {
        self.cell = cell;
        self.halt(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_fixed_during_transit_and_advances_once() {
        let grid = GridIndex::unit();
        let mut mover = StepMover::new(Cell::new(0, 0), 1.0, &grid);
        mover.request(Direction::Up, &grid);

        for _ in 0..3 {
            assert_eq!(mover.tick(0.25, &grid), None);
            assert_eq!(mover.cell(), Cell::new(0, 0));
            assert!(mover.in_transit());
        }
        assert_eq!(mover.tick(0.25, &grid), Some(Cell::new(0, 1)));
        assert_eq!(mover.cell(), Cell::new(0, 1));
        assert_eq!(mover.tick(0.25, &grid), None);
        assert_eq!(mover.cell(), Cell::new(0, 1));
    }

    #[test]
    fn test_request_while_moving_is_buffered() {
        let grid = GridIndex::unit();
        let mut mover = StepMover::new(Cell::new(0, 0), 1.0, &grid);
        mover.request(Direction::Right, &grid);
        assert_eq!(mover.request(Direction::Up, &grid), StepRequest::Buffered);
        assert_eq!(mover.destination(), Some(Cell::new(1, 0)));
        assert_eq!(mover.take_buffered(), Some(Direction::Up));
        assert_eq!(mover.buffered(), None);
    }

    #[test]
    fn test_speed_factor_scales_travel() {
        let grid = GridIndex::new(Vec2::ZERO, 2.0).unwrap();
        let mut mover = StepMover::new(Cell::new(0, 0), 1.0, &grid);
        mover.set_speed_factor(2.0);
        mover.request(Direction::Right, &grid);
        assert_eq!(mover.tick(0.5, &grid), Some(Cell::new(1, 0)));
        mover.reset_speed();
        assert_eq!(mover.speed(), 1.0);
    }

    #[test]
    fn test_halt_snaps_back_and_is_idempotent() {
        let grid = GridIndex::unit();
        let mut mover = StepMover::new(Cell::new(2, 2), 1.0, &grid);
        mover.request(Direction::Left, &grid);
        mover.request(Direction::Down, &grid);
        mover.tick(0.4, &grid);
        assert_ne!(mover.position(), grid.cell_to_world_center(Cell::new(2, 2)));

        mover.halt(&grid);
        let snapshot = mover.clone();
        mover.halt(&grid);
        assert_eq!(mover, snapshot);
        assert!(!mover.in_transit());
        assert_eq!(mover.buffered(), None);
        assert_eq!(mover.position(), grid.cell_to_world_center(Cell::new(2, 2)));
    }

    #[test]
    fn test_claimed_cells_cover_destination() {
        let grid = GridIndex::unit();
        let mut mover = StepMover::new(Cell::new(0, 0), 1.0, &grid);
        assert_eq!(mover.claimed_cells(), vec![Cell::new(0, 0)]);
        mover.request(Direction::Down, &grid);
        assert_eq!(mover.claimed_cells(), vec![Cell::new(0, 0), Cell::new(0, -1)]);
        mover.teleport(Cell::new(5, 5), &grid);
        assert_eq!(mover.claimed_cells(), vec![Cell::new(5, 5)]);
    }
}
