//! # Chasing Enemies
//!
//! [`ChaseAgent`] ties perception, path finding and step movement together.
//!
//! Each frame runs in two phases:
//! - [`ChaseAgent::update`] decides: perception first, then, when no step is in
//!   flight, either the next step along the chase path or a patrol step.
//! - [`ChaseAgent::fixed_update`] moves: it only advances the step chosen
//!   earlier.
//!
//! Patrolling agents keep walking in their heading and pick a random open
//! direction (never straight back) when they run into something. A chasing
//! agent whose target cannot be reached patrols the same way until a route
//! appears or the chase ends.

use crate::{
    is_blocked, new_entity_id, open_directions, AgentConfig, AgentId, Cell, ChaseResult,
    Direction, GridIndex, Path, PathFinder, Perception, PerceptionEvent, SpatialQueries,
    StepMover,
};
use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

/// What a chase tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseStep {
    /// Took the next step of the path
    Stepped(Direction),
    /// Standing on the target's cell
    Arrived,
    /// Next step was blocked; the path was dropped and will be recomputed
    Blocked,
    /// No route to the target exists
    NoRoute,
}

/// An enemy that patrols until it notices a target and then chases it.
#[derive(Debug, Clone)]
pub struct ChaseAgent {
    id: AgentId,
    config: AgentConfig,
    perception: Perception,
    mover: StepMover,
    heading: Option<Direction>,
    path: Option<Path>,
    path_step: usize,
    locked: bool,
}

impl ChaseAgent {
    /// Creates an agent standing on `cell`, heading up.
    ///
    /// Fails when `config` does not validate.
    pub fn new(cell: Cell, config: AgentConfig, grid: &GridIndex) -> ChaseResult<Self> {
        config.validate()?;
        Ok(Self {
            id: new_entity_id(),
            perception: Perception::new(&config),
            mover: StepMover::new(cell, config.move_speed, grid),
            config,
            heading: Some(Direction::Up),
            path: None,
            path_step: 0,
            locked: false,
        })
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: AgentId) -> Self {
        self.id = id;
        self
    }

    pub fn with_heading(mut self, heading: Option<Direction>) -> Self {
        self.heading = heading;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
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

    pub fn perception(&self) -> &Perception {
        &self.perception
    }

    pub fn mover(&self) -> &StepMover {
        &self.mover
    }

    pub fn is_chasing(&self) -> bool {
        self.perception.is_chasing()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Current chase path, if one is being followed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Index into [`ChaseAgent::path`] of the cell the agent last stepped to.
    pub fn path_step(&self) -> usize {
        self.path_step
    }

    pub fn claimed_cells(&self) -> Vec<Cell> {
        self.mover.claimed_cells()
    }

    /// Decision phase.
    pub fn update<Q, R>(&mut self, dt: f32, queries: &Q, rng: &mut R) -> Vec<PerceptionEvent>
    where
        Q: SpatialQueries + ?Sized,
        R: Rng + ?Sized,
    {
        if self.locked {
            return Vec::new();
        }

        let events = self.perception.update(dt, self.mover.position(), queries);
        for event in &events {
            match event {
                PerceptionEvent::ChaseStarted { .. } => {
                    self.mover
                        .set_speed_factor(self.config.chase_speed_multiplier);
                }
                PerceptionEvent::ChaseEnded { .. } => self.mover.reset_speed(),
            }
            self.clear_path();
        }

        if self.mover.in_transit() {
            return events;
        }

        let target_position = self
            .perception
            .target()
            .and_then(|target| queries.target_position(target));
        match target_position {
            Some(position) => {
                if self.chase(position, queries) == ChaseStep::NoRoute {
                    self.patrol(queries, rng);
                }
            }
            None => {
                self.patrol(queries, rng);
            }
        }

        events
    }

    /// Movement phase; returns the new cell when a step completes.
    pub fn fixed_update(&mut self, dt: f32, grid: &GridIndex) -> Option<Cell> {
        if self.locked {
            return None;
        }
        self.mover.tick(dt, grid)
    }

    /// Takes the next step toward `target_position`, recomputing the path when it
    /// is missing, used up or aimed at a cell the target has left.
    pub fn chase<Q>(&mut self, target_position: Vec2, queries: &Q) -> ChaseStep
    where
        Q: SpatialQueries + ?Sized,
    {
        let grid = *queries.grid();
        let cell = self.mover.cell();
        let goal = grid.world_to_cell(target_position);
        let id = self.id;

        let stale = match &self.path {
            None => true,
            Some(path) => self.path_step >= path.len() || path.last() != Some(goal),
        };
        if stale {
            let finder = PathFinder::new()
                .with_margin(self.config.search_margin)
                .with_bounds(queries.search_bounds());
            let path = finder.find(cell, goal, |from, direction| {
                is_blocked(queries, from, direction, id)
            });
            log::trace!(
                "agent {} repath {} -> {}: {} hops (found: {})",
                id,
                cell,
                goal,
                path.hop_count(),
                path.is_found()
            );
            self.path = Some(path);
            self.path_step = 0;
        }

        let Some(path) = self.path.as_ref() else {
            return ChaseStep::NoRoute;
        };
        if !path.is_found() {
            self.clear_path();
            return ChaseStep::NoRoute;
        }

        let Some(next) = path.get(self.path_step + 1) else {
            self.clear_path();
            return ChaseStep::Arrived;
        };

        match Direction::toward(cell, next) {
            Some(direction) if !is_blocked(queries, cell, direction, id) => {
                self.heading = Some(direction);
                self.mover.request(direction, &grid);
                self.path_step += 1;
                ChaseStep::Stepped(direction)
            }
            _ => {
                log::trace!("agent {} blocked at {}, dropping path", id, cell);
                self.clear_path();
                ChaseStep::Blocked
            }
        }
    }

    /// Continues along the heading, or turns to a random open direction that is
    /// not a U-turn. Stays put when nothing is open.
    pub fn patrol<Q, R>(&mut self, queries: &Q, rng: &mut R) -> Option<Direction>
    where
        Q: SpatialQueries + ?Sized,
        R: Rng + ?Sized,
    {
        let grid = *queries.grid();
        let cell = self.mover.cell();

        if let Some(heading) = self.heading {
            if !is_blocked(queries, cell, heading, self.id) {
                self.mover.request(heading, &grid);
                return Some(heading);
            }
        }

        let exclude = self.heading.map(Direction::opposite);
        let open = open_directions(queries, cell, exclude, self.id);
        self.heading = open.choose(rng).copied();
        if let Some(heading) = self.heading {
            self.mover.request(heading, &grid);
        }
        self.heading
    }

    /// Freezes the agent: drops the in-flight step, heading, path and chase.
    ///
    /// Idempotent; the agent always ends up centred on its logical cell.
    pub fn lock(&mut self, grid: &GridIndex) -> Option<PerceptionEvent> {
        self.locked = true;
        self.mover.halt(grid);
        self.mover.reset_speed();
        self.heading = None;
        self.clear_path();
        self.perception.reset()
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Moves the agent to `cell` and forgets everything it was doing.
    pub fn respawn(&mut self, cell: Cell, grid: &GridIndex) {
        self.mover.teleport(cell, grid);
        self.mover.reset_speed();
        self.perception.reset();
        self.heading = Some(Direction::Up);
        self.clear_path();
    }

    fn clear_path(&mut self) {
        self.path = None;
        self.path_step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_entity_id, Bounds, DetectionMode, Level};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_level(size: u32) -> Level {
        Level::new(GridIndex::unit()).with_bounds(Bounds::from_size(size, size))
    }

    fn fenced_level(size: u32) -> Level {
        let mut level = open_level(size);
        for i in -1..=size as i32 {
            level.add_wall(Cell::new(i, -1));
            level.add_wall(Cell::new(i, size as i32));
            level.add_wall(Cell::new(-1, i));
            level.add_wall(Cell::new(size as i32, i));
        }
        level
    }

    fn proximity(radius: f32) -> AgentConfig {
        AgentConfig {
            detection_mode: DetectionMode::Proximity,
            detection_radius: radius,
            ..AgentConfig::default()
        }
    }

    fn run_until_idle(agent: &mut ChaseAgent, grid: &GridIndex) {
        for _ in 0..1000 {
            if agent.fixed_update(0.05, grid).is_some() {
                return;
            }
        }
        panic!("step never finished");
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = AgentConfig {
            move_speed: -1.0,
            ..AgentConfig::default()
        };
        assert!(ChaseAgent::new(Cell::new(0, 0), config, &GridIndex::unit()).is_err());
    }

    #[test]
    fn test_chase_starts_and_speeds_up() {
        let mut level = fenced_level(5);
        let grid = *level.grid();
        let target = new_entity_id();
        level.set_target(target, grid.cell_to_world_center(Cell::new(4, 4)));
        let mut agent = ChaseAgent::new(Cell::new(0, 0), proximity(10.0), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let events = agent.update(0.02, &level, &mut rng);
        assert_eq!(events, vec![PerceptionEvent::ChaseStarted { target }]);
        assert!(agent.is_chasing());
        assert!((agent.mover().speed() - 1.1 * 1.4).abs() < 1e-5);
        assert_eq!(agent.path().map(Path::len), Some(9));
        assert_eq!(agent.mover().destination(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_chase_reaches_target_cell_monotonically() {
        let mut level = fenced_level(5);
        let grid = *level.grid();
        let goal = Cell::new(4, 4);
        level.set_target(new_entity_id(), grid.cell_to_world_center(goal));
        let mut agent = ChaseAgent::new(Cell::new(0, 0), proximity(10.0), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let mut previous = agent.cell().manhattan_distance(goal);
        for _ in 0..8 {
            agent.update(0.02, &level, &mut rng);
            run_until_idle(&mut agent, &grid);
            let distance = agent.cell().manhattan_distance(goal);
            assert_eq!(distance + 1, previous);
            previous = distance;
        }
        assert_eq!(agent.cell(), goal);

        agent.update(0.02, &level, &mut rng);
        assert!(!agent.mover().in_transit());
    }

    #[test]
    fn test_blocked_step_drops_path() {
        let mut level = fenced_level(5);
        let grid = *level.grid();
        level.set_target(new_entity_id(), grid.cell_to_world_center(Cell::new(0, 4)));
        let mut agent = ChaseAgent::new(Cell::new(0, 0), proximity(10.0), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        agent.update(0.02, &level, &mut rng);
        run_until_idle(&mut agent, &grid);
        assert!(agent.path().is_some());

        // Another agent steps into the route after it was planned.
        level.claim(new_entity_id(), vec![Cell::new(0, 2)]);
        let target = level.targets()[0].position;
        assert_eq!(agent.chase(target, &level), ChaseStep::Blocked);
        assert!(agent.path().is_none());

        // Next tick routes around the blocker.
        agent.update(0.02, &level, &mut rng);
        assert_eq!(agent.mover().destination(), Some(Cell::new(1, 1)));
    }

    #[test]
    fn test_unreachable_target_falls_back_to_patrol() {
        let mut level = fenced_level(5);
        let grid = *level.grid();
        let goal = Cell::new(3, 3);
        for direction in Direction::ALL {
            level.add_wall(goal.step(direction));
        }
        level.set_target(new_entity_id(), grid.cell_to_world_center(goal));
        let mut agent = ChaseAgent::new(Cell::new(0, 0), proximity(10.0), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        agent.update(0.02, &level, &mut rng);
        assert!(agent.is_chasing());
        assert!(agent.path().is_none());
        assert_eq!(agent.mover().destination(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_patrol_keeps_heading_while_open() {
        let level = fenced_level(5);
        let grid = *level.grid();
        let mut agent = ChaseAgent::new(Cell::new(2, 0), AgentConfig::default(), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        for expected in 1..=4 {
            agent.update(0.02, &level, &mut rng);
            run_until_idle(&mut agent, &grid);
            assert_eq!(agent.cell(), Cell::new(2, expected));
        }
    }

    #[test]
    fn test_patrol_turn_never_reverses() {
        let level = fenced_level(5);
        let grid = *level.grid();
        for seed in 0..20 {
            let mut agent =
                ChaseAgent::new(Cell::new(2, 4), AgentConfig::default(), &grid).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let turned = agent.patrol(&level, &mut rng);
            assert!(matches!(turned, Some(Direction::Left) | Some(Direction::Right)));
        }
    }

    #[test]
    fn test_patrol_stays_when_boxed_in() {
        let mut level = open_level(3);
        let start = Cell::new(1, 1);
        for direction in Direction::ALL {
            level.add_wall(start.step(direction));
        }
        let grid = *level.grid();
        let mut agent = ChaseAgent::new(start, AgentConfig::default(), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        agent.update(0.02, &level, &mut rng);
        assert!(!agent.mover().in_transit());
        assert_eq!(agent.heading(), None);
    }

    #[test]
    fn test_lock_clears_everything_and_is_idempotent() {
        let mut level = fenced_level(5);
        let grid = *level.grid();
        let target = new_entity_id();
        level.set_target(target, grid.cell_to_world_center(Cell::new(4, 4)));
        let mut agent = ChaseAgent::new(Cell::new(0, 0), proximity(10.0), &grid).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        agent.update(0.02, &level, &mut rng);
        agent.fixed_update(0.3, &grid);

        assert!(agent.lock(&grid).is_some());
        assert!(agent.lock(&grid).is_none());
        assert!(!agent.is_chasing());
        assert!(agent.path().is_none());
        assert!(!agent.mover().in_transit());
        assert_eq!(agent.position(), grid.cell_to_world_center(Cell::new(0, 0)));
        assert_eq!(agent.mover().speed(), agent.mover().base_speed());

        assert!(agent.update(0.02, &level, &mut rng).is_empty());
        assert_eq!(agent.fixed_update(10.0, &grid), None);

        agent.unlock();
        agent.update(0.02, &level, &mut rng);
        assert!(agent.is_chasing());
    }
}
