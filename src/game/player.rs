//! # Player Movement
//!
//! Grid movement for the player, on the same [`StepMover`] the enemies use.
//!
//! Input comes in two flavours: a press queues a turn that is taken at the first
//! cell where it is open, and a held direction (an on-screen button) is
//! re-applied at every cell. Between inputs the player keeps walking in its
//! heading and stops at the first wall.

use crate::{
    new_entity_id, Cell, ChaseResult, Direction, GridIndex, PlayerConfig, SpatialQueries,
    StepMover, TargetId,
};
use glam::Vec2;

/// The player's grid controller.
#[derive(Debug, Clone)]
pub struct PlayerMover {
    id: TargetId,
    start: Cell,
    mover: StepMover,
    heading: Option<Direction>,
    queued: Option<Direction>,
    held: Option<Direction>,
    locked: bool,
}

impl PlayerMover {
    pub fn new(start: Cell, config: &PlayerConfig, grid: &GridIndex) -> ChaseResult<Self> {
        config.validate()?;
        Ok(Self {
            id: new_entity_id(),
            start,
            mover: StepMover::new(start, config.move_speed, grid),
            heading: None,
            queued: None,
            held: None,
            locked: false,
        })
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: TargetId) -> Self {
        self.id = id;
        self
    }

    /// Id the player is known by as a chase target.
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn cell(&self) -> Cell {
        self.mover.cell()
    }

    pub fn position(&self) -> Vec2 {
        self.mover.position()
    }

    pub fn heading(&self) -> Option<Direction> {
        self.heading
    }

    pub fn queued(&self) -> Option<Direction> {
        self.queued
    }

    pub fn mover(&self) -> &StepMover {
        &self.mover
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Queues a turn. Ignored while locked.
    pub fn press(&mut self, direction: Direction) {
        if !self.locked {
            self.queued = Some(direction);
        }
    }

    pub fn hold(&mut self, direction: Direction) {
        self.held = Some(direction);
    }

    pub fn release(&mut self) {
        self.held = None;
    }

    /// Decision phase: picks the next step when standing on a cell.
    pub fn update<Q>(&mut self, queries: &Q) -> Option<Direction>
    where
        Q: SpatialQueries + ?Sized,
    {
        if self.locked || self.mover.in_transit() {
            return None;
        }

        let cell = self.mover.cell();
        let can_move = |direction: Direction| !queries.is_wall_at(cell.step(direction));

        if let Some(queued) = self.queued {
            if can_move(queued) {
                self.heading = Some(queued);
                self.queued = None;
            }
        }
        if let Some(held) = self.held {
            if can_move(held) {
                self.heading = Some(held);
            }
        }

        match self.heading {
            Some(heading) if can_move(heading) => {
                self.mover.request(heading, queries.grid());
                Some(heading)
            }
            Some(heading) => {
                log::trace!("player stopped at {} facing {}", cell, heading.name());
                self.heading = None;
                None
            }
            None => None,
        }
    }

    /// Movement phase; returns the new cell when a step completes.
    pub fn fixed_update(&mut self, dt: f32, grid: &GridIndex) -> Option<Cell> {
        if self.locked {
            return None;
        }
        self.mover.tick(dt, grid)
    }

    /// Stops dead on the current cell and ignores presses until unlocked.
    pub fn lock(&mut self, grid: &GridIndex) {
        self.locked = true;
        self.mover.halt(grid);
        self.heading = None;
        self.queued = None;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Puts the player back on the start cell, locked.
    pub fn reset_to_start(&mut self, grid: &GridIndex) {
        self.mover.teleport(self.start, grid);
        self.lock(grid);
    }

    /// Forgets every input.
    pub fn set_idle(&mut self) {
        self.heading = None;
        self.queued = None;
        self.held = None;
    }
}
