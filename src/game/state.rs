//! # Level Session
//!
//! Runs one level: owns the map, the player, every enemy and hazard, and applies
//! the level rules on top of their movement.
//!
//! A session is driven like the agents it owns. [`LevelSession::update`] runs
//! the decision phase and any due cinematic cues, and
//! [`LevelSession::fixed_update`] runs movement and the contact, key and goal
//! checks. Every call returns the [`GameEvent`]s it produced.
//!
//! Cinematics (intro, respawn, key reveal) are [`Sequence`]s of [`SessionCue`]s.
//! Only one runs at a time and every one of them ends by unlocking the actors.

use crate::{
    entity_id_from_rng, AgentId, Cell, ChaseAgent, ChaseEndReason, ChaseError, ChaseResult,
    Direction, GridIndex, Level, LevelLayout, PerceptionEvent, PlayerMover, RouteMover, Sequence,
    SessionConfig, SpatialQueries, TargetId,
};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Something that happened during a session tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ChaseStarted {
        agent: AgentId,
        target: TargetId,
    },
    ChaseEnded {
        agent: AgentId,
        target: TargetId,
        reason: ChaseEndReason,
    },
    HeartLost {
        remaining: u32,
    },
    PlayerRespawned,
    KeyCollected {
        cell: Cell,
        collected: u32,
        required: u32,
    },
    AllKeysCollected,
    GatesOpened,
    /// The player stands on a goal; the level waits for [`LevelSession::answer`]
    GoalReached,
    LevelWon {
        stars: u32,
    },
    LevelLost,
}

impl GameEvent {
    fn from_perception(agent: AgentId, event: PerceptionEvent) -> Self {
        match event {
            PerceptionEvent::ChaseStarted { target } => GameEvent::ChaseStarted { agent, target },
            PerceptionEvent::ChaseEnded { target, reason } => GameEvent::ChaseEnded {
                agent,
                target,
                reason,
            },
        }
    }
}

/// Where the level stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    /// Goal reached, waiting for the question to be answered
    AwaitingAnswer,
    Won { stars: u32 },
    Lost,
}

/// Steps of the session cinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCue {
    UnlockAll,
    ResetPlayer,
    OpenGates,
}

/// Running totals for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub chases_started: u32,
    pub hearts_lost: u32,
    pub keys_collected: u32,
    pub player_steps: u64,
}

impl SessionStatistics {
    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ChaseStarted { .. } => self.chases_started += 1,
            GameEvent::HeartLost { .. } => self.hearts_lost += 1,
            GameEvent::KeyCollected { .. } => self.keys_collected += 1,
            _ => {}
        }
    }
}

/// One level in play.
#[derive(Debug, Clone)]
pub struct LevelSession {
    config: SessionConfig,
    layout: LevelLayout,
    seed: u64,
    rng: StdRng,
    level: Level,
    player: PlayerMover,
    agents: Vec<ChaseAgent>,
    hazards: Vec<RouteMover>,
    lives: u32,
    keys_collected: u32,
    keys_required: u32,
    gates_pending: bool,
    completion: GameCompletionState,
    sequence: Sequence<SessionCue>,
    heart_cooldown: f32,
    player_down: bool,
    statistics: SessionStatistics,
    ticks: u64,
}

impl LevelSession {
    /// Builds a session and starts the intro cinematic.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::{GameCompletionState, LevelLayout, LevelSession, SessionConfig};
    ///
    /// let layout = LevelLayout::parse("#####\n#P.E#\n#####").unwrap();
    /// let session = LevelSession::from_layout(layout, SessionConfig::default(), 7).unwrap();
    /// assert_eq!(session.agents().len(), 1);
    /// assert_eq!(session.completion(), GameCompletionState::Playing);
    /// assert!(session.player().is_locked());
    /// ```
    pub fn from_layout(layout: LevelLayout, config: SessionConfig, seed: u64) -> ChaseResult<Self> {
        config.validate()?;
        let grid = GridIndex::new(Vec2::ZERO, config.cell_size)?;
        let mut level = layout.build_level(grid);
        // Ids come from the session rng so a seed replays the same events.
        let mut rng = StdRng::seed_from_u64(seed);

        let player = PlayerMover::new(layout.player, &config.player, &grid)?
            .with_id(entity_id_from_rng(&mut rng));
        level.set_target(player.id(), player.position());

        let agents = layout
            .enemies
            .iter()
            .map(|cell| {
                ChaseAgent::new(*cell, config.agent.clone(), &grid)
                    .map(|agent| agent.with_id(entity_id_from_rng(&mut rng)))
            })
            .collect::<ChaseResult<Vec<_>>>()?;
        for agent in &agents {
            level.claim(agent.id(), agent.claimed_cells());
        }

        let hazards = layout
            .hazards
            .iter()
            .map(|cell| {
                Self::spawn_hazard(*cell, &config, &grid)
                    .map(|hazard| hazard.with_id(entity_id_from_rng(&mut rng)))
            })
            .collect::<ChaseResult<Vec<_>>>()?;

        let available = layout.keys.len() as u32;
        let keys_required = match config.keys_required {
            Some(required) if required > available => {
                log::warn!(
                    "layout has {} keys but {} are required; requiring all of them",
                    available,
                    required
                );
                available
            }
            Some(required) => required,
            None => available,
        };
        if keys_required == 0 {
            level.open_gates();
        }

        let mut session = Self {
            lives: config.lives,
            config,
            layout,
            seed,
            rng,
            level,
            player,
            agents,
            hazards,
            keys_collected: 0,
            keys_required,
            gates_pending: false,
            completion: GameCompletionState::Playing,
            sequence: Sequence::new(),
            heart_cooldown: 0.0,
            player_down: false,
            statistics: SessionStatistics::default(),
            ticks: 0,
        };

        session.lock_all();
        session.sequence = Sequence::new().then(session.config.intro_duration, SessionCue::UnlockAll);
        log::debug!(
            "session started: {} enemies, {} hazards, {} keys required (seed {})",
            session.agents.len(),
            session.hazards.len(),
            session.keys_required,
            seed
        );
        Ok(session)
    }

    fn spawn_hazard(cell: Cell, config: &SessionConfig, grid: &GridIndex) -> ChaseResult<RouteMover> {
        let end = Cell::new(cell.x + config.hazard.span as i32, cell.y);
        let waypoints = vec![grid.cell_to_world_center(cell), grid.cell_to_world_center(end)];
        let speed = config.hazard.speed * grid.cell_size();
        let route = RouteMover::new(waypoints, speed, config.hazard.mode)?;
        match config.hazard.random_speed {
            Some((min, max)) => route.with_random_speed(min * grid.cell_size(), max * grid.cell_size()),
            None => Ok(route),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn grid(&self) -> GridIndex {
        *self.level.grid()
    }

    pub fn player(&self) -> &PlayerMover {
        &self.player
    }

    pub fn agents(&self) -> &[ChaseAgent] {
        &self.agents
    }

    /// Looks up an enemy by id.
    pub fn agent(&self, id: AgentId) -> ChaseResult<&ChaseAgent> {
        self.agents
            .iter()
            .find(|agent| agent.id() == id)
            .ok_or(ChaseError::UnknownAgent(id))
    }

    pub fn hazards(&self) -> &[RouteMover] {
        &self.hazards
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn keys_collected(&self) -> u32 {
        self.keys_collected
    }

    pub fn keys_required(&self) -> u32 {
        self.keys_required
    }

    pub fn completion(&self) -> GameCompletionState {
        self.completion
    }

    /// Won or lost.
    pub fn is_over(&self) -> bool {
        matches!(
            self.completion,
            GameCompletionState::Won { .. } | GameCompletionState::Lost
        )
    }

    /// Whether a cinematic is still running.
    pub fn in_cinematic(&self) -> bool {
        !self.sequence.is_finished()
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn press(&mut self, direction: Direction) {
        self.player.press(direction);
    }

    pub fn hold(&mut self, direction: Direction) {
        self.player.hold(direction);
    }

    pub fn release(&mut self) {
        self.player.release();
    }

    /// Decision phase: cinematic cues, then the player, then every enemy.
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.completion != GameCompletionState::Playing {
            return events;
        }
        self.ticks += 1;
        self.heart_cooldown = (self.heart_cooldown - dt).max(0.0);

        for cue in self.sequence.tick(dt) {
            self.apply_cue(cue, &mut events);
        }

        self.player.update(&self.level);

        for agent in &mut self.agents {
            for event in agent.update(dt, &self.level, &mut self.rng) {
                events.push(GameEvent::from_perception(agent.id(), event));
            }
            // Later agents must see this one's new destination.
            self.level.claim(agent.id(), agent.claimed_cells());
        }

        self.record(&events);
        events
    }

    /// Movement phase plus the contact, key and goal rules.
    pub fn fixed_update(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.completion != GameCompletionState::Playing {
            return events;
        }
        let grid = self.grid();

        if let Some(cell) = self.player.fixed_update(dt, &grid) {
            self.statistics.player_steps += 1;
            self.on_player_arrived(cell, &mut events);
        }
        if !self.player_down {
            self.level.set_target(self.player.id(), self.player.position());
        }

        for agent in &mut self.agents {
            agent.fixed_update(dt, &grid);
            self.level.claim(agent.id(), agent.claimed_cells());
        }
        for hazard in &mut self.hazards {
            hazard.tick(dt, &mut self.rng);
        }

        self.check_contacts(&mut events);
        self.record(&events);
        events
    }

    /// Runs both phases with the same `dt`.
    pub fn advance(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = self.update(dt);
        events.extend(self.fixed_update(dt));
        events
    }

    /// Resolves the question asked at the goal.
    ///
    /// A right answer wins with one star per remaining life; a wrong one loses
    /// the level outright.
    pub fn answer(&mut self, correct: bool) -> ChaseResult<Vec<GameEvent>> {
        if self.completion != GameCompletionState::AwaitingAnswer {
            return Err(ChaseError::InvalidState(format!(
                "no question is pending (state: {:?})",
                self.completion
            )));
        }
        let mut events = Vec::new();
        if correct {
            let stars = self.lives;
            self.completion = GameCompletionState::Won { stars };
            log::info!("level won with {} stars", stars);
            events.push(GameEvent::LevelWon { stars });
        } else {
            self.lives = 0;
            self.lose(&mut events);
        }
        self.record(&events);
        Ok(events)
    }

    /// Starts the level over with the original layout, settings and seed.
    pub fn restart(&mut self) -> ChaseResult<()> {
        log::debug!("restarting level (seed {})", self.seed);
        *self = Self::from_layout(self.layout.clone(), self.config.clone(), self.seed)?;
        Ok(())
    }

    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            self.statistics.update_from_event(event);
        }
    }

    fn apply_cue(&mut self, cue: SessionCue, events: &mut Vec<GameEvent>) {
        log::trace!("cue {:?}", cue);
        match cue {
            SessionCue::UnlockAll => {
                if self.gates_pending {
                    self.open_gates(events);
                }
                self.unlock_all();
            }
            SessionCue::ResetPlayer => {
                let grid = self.grid();
                self.player.reset_to_start(&grid);
                self.player_down = false;
                self.level.set_target(self.player.id(), self.player.position());
                events.push(GameEvent::PlayerRespawned);
            }
            SessionCue::OpenGates => self.open_gates(events),
        }
    }

    fn open_gates(&mut self, events: &mut Vec<GameEvent>) {
        self.gates_pending = false;
        if !self.level.gates_open() {
            self.level.open_gates();
            log::debug!("gates opened");
            events.push(GameEvent::GatesOpened);
        }
    }

    fn lock_all(&mut self) -> Vec<GameEvent> {
        let grid = self.grid();
        self.player.lock(&grid);
        let mut events = Vec::new();
        for agent in &mut self.agents {
            if let Some(event) = agent.lock(&grid) {
                events.push(GameEvent::from_perception(agent.id(), event));
            }
            self.level.claim(agent.id(), agent.claimed_cells());
        }
        for hazard in &mut self.hazards {
            hazard.lock();
        }
        events
    }

    fn unlock_all(&mut self) {
        self.player.unlock();
        for agent in &mut self.agents {
            agent.unlock();
        }
        for hazard in &mut self.hazards {
            hazard.unlock();
        }
    }

    fn on_player_arrived(&mut self, cell: Cell, events: &mut Vec<GameEvent>) {
        if self.level.take_key(cell) {
            self.keys_collected += 1;
            log::debug!("key {} collected at {}", self.keys_collected, cell);
            events.push(GameEvent::KeyCollected {
                cell,
                collected: self.keys_collected,
                required: self.keys_required,
            });
            if self.keys_collected == self.keys_required && !self.level.gates_open() {
                events.push(GameEvent::AllKeysCollected);
                self.gates_pending = true;
                events.extend(self.lock_all());
                self.sequence = Sequence::new()
                    .then(self.config.focus_duration, SessionCue::OpenGates)
                    .then(self.config.key_reveal_duration, SessionCue::UnlockAll);
            }
        }

        if self.level.is_goal(cell) {
            log::info!("goal reached at {}", cell);
            events.extend(self.lock_all());
            self.sequence.cancel();
            self.completion = GameCompletionState::AwaitingAnswer;
            events.push(GameEvent::GoalReached);
        }
    }

    fn check_contacts(&mut self, events: &mut Vec<GameEvent>) {
        if self.completion != GameCompletionState::Playing
            || self.player_down
            || self.player.is_locked()
            || self.heart_cooldown > 0.0
        {
            return;
        }
        let reach = self.config.contact_radius * self.grid().cell_size();
        let position = self.player.position();
        let touched = self
            .agents
            .iter()
            .map(ChaseAgent::position)
            .chain(self.hazards.iter().map(RouteMover::position))
            .any(|other| other.distance(position) < reach);
        if touched {
            self.lose_heart(events);
        }
    }

    fn lose_heart(&mut self, events: &mut Vec<GameEvent>) {
        self.lives = self.lives.saturating_sub(1);
        self.heart_cooldown = self.config.heart_cooldown;
        log::info!("heart lost, {} remaining", self.lives);
        events.push(GameEvent::HeartLost {
            remaining: self.lives,
        });

        self.player_down = true;
        self.level.remove_target(self.player.id());
        events.extend(self.lock_all());

        if self.lives == 0 {
            self.lose(events);
        } else {
            self.sequence = Sequence::new()
                .then(self.config.focus_duration, SessionCue::ResetPlayer)
                .then(self.config.respawn_buffer, SessionCue::UnlockAll);
        }
    }

    fn lose(&mut self, events: &mut Vec<GameEvent>) {
        events.extend(self.lock_all());
        self.player.set_idle();
        self.sequence.cancel();
        self.completion = GameCompletionState::Lost;
        log::info!("level lost");
        events.push(GameEvent::LevelLost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DetectionMode;

    const DT: f32 = 0.02;

    fn session(map: &str) -> LevelSession {
        let layout = LevelLayout::parse(map).unwrap();
        LevelSession::from_layout(layout, SessionConfig::without_cinematics(), 1).unwrap()
    }

    fn run(session: &mut LevelSession, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| session.advance(DT)).collect()
    }

    /// Lets the intro unlock fire, then presses right until the goal.
    fn walk_to_goal(session: &mut LevelSession) {
        run(session, 1);
        session.press(Direction::Right);
        let events = run(session, 40);
        assert!(events.contains(&GameEvent::GoalReached));
        assert_eq!(session.completion(), GameCompletionState::AwaitingAnswer);
    }

    #[test]
    fn test_intro_locks_until_duration() {
        let layout = LevelLayout::parse("P..E").unwrap();
        let mut config = SessionConfig::default();
        config.intro_duration = 0.5;
        let mut session = LevelSession::from_layout(layout, config, 3).unwrap();

        run(&mut session, 20);
        assert!(session.player().is_locked());
        assert!(session.agents()[0].is_locked());
        run(&mut session, 6);
        assert!(!session.player().is_locked());
        assert!(!session.in_cinematic());
    }

    #[test]
    fn test_invalid_config_refused() {
        let layout = LevelLayout::parse("P").unwrap();
        let mut config = SessionConfig::default();
        config.cell_size = 0.0;
        assert!(LevelSession::from_layout(layout, config, 0).is_err());
    }

    #[test]
    fn test_key_collection_opens_gate() {
        let mut s = session("PKKD.G");
        assert_eq!(s.keys_required(), 2);
        assert!(s.level().is_wall_at(Cell::new(3, 0)));

        s.hold(Direction::Right);
        let events = run(&mut s, 60);
        assert!(events.contains(&GameEvent::AllKeysCollected));
        assert!(events.contains(&GameEvent::GatesOpened));
        assert!(!s.level().is_wall_at(Cell::new(3, 0)));
        assert!(events.contains(&GameEvent::GoalReached));
        assert_eq!(s.completion(), GameCompletionState::AwaitingAnswer);
    }

    #[test]
    fn test_keys_required_clamped_to_available() {
        let s = session("PK.D.G");
        assert_eq!(s.keys_required(), 1);
    }

    #[test]
    fn test_correct_answer_wins_with_lives_as_stars() {
        let mut s = session("P.G");
        walk_to_goal(&mut s);
        assert_eq!(s.completion(), GameCompletionState::AwaitingAnswer);
        assert!(s.answer(true).unwrap().contains(&GameEvent::LevelWon { stars: 3 }));
        assert!(s.is_over());
        assert!(s.answer(true).is_err());
    }

    #[test]
    fn test_wrong_answer_loses() {
        let mut s = session("P.G");
        walk_to_goal(&mut s);
        let events = s.answer(false).unwrap();
        assert!(events.contains(&GameEvent::LevelLost));
        assert_eq!(s.lives(), 0);
        assert_eq!(s.completion(), GameCompletionState::Lost);
    }

    #[test]
    fn test_press_before_unlock_is_dropped() {
        let mut s = session("P.G");
        assert!(s.player().is_locked());
        s.press(Direction::Right);
        run(&mut s, 40);
        assert_eq!(s.player().cell(), Cell::new(0, 0));
        assert_eq!(s.completion(), GameCompletionState::Playing);
    }

    #[test]
    fn test_answer_before_goal_is_invalid_state() {
        let mut s = session("P.G");
        assert!(matches!(s.answer(true), Err(ChaseError::InvalidState(_))));
    }

    #[test]
    fn test_enemy_contact_costs_heart_and_respawns() {
        let mut s = session("#####\n#P.E#\n#####");
        let events = run(&mut s, 200);
        assert!(events.contains(&GameEvent::HeartLost { remaining: 2 }));
        assert!(events.contains(&GameEvent::PlayerRespawned));
        assert!(s.lives() < 3);
        assert_eq!(s.statistics().hearts_lost, 3 - s.lives());
    }

    #[test]
    fn test_last_heart_loses_level() {
        let layout = LevelLayout::parse("#####\n#P.E#\n#####").unwrap();
        let mut config = SessionConfig::without_cinematics();
        config.lives = 1;
        let mut s = LevelSession::from_layout(layout, config, 1).unwrap();
        let events = run(&mut s, 200);
        assert!(events.contains(&GameEvent::LevelLost));
        assert!(s.is_over());
        assert!(s.advance(DT).is_empty());
    }

    #[test]
    fn test_player_withdrawn_as_target_while_down() {
        let layout = LevelLayout::parse("#####\n#P.E#\n#####").unwrap();
        let mut config = SessionConfig::without_cinematics();
        config.focus_duration = 1.0;
        let mut s = LevelSession::from_layout(layout, config, 1).unwrap();
        let player = s.player().id();
        let mut down = false;
        for _ in 0..400 {
            let events = s.advance(DT);
            if events.iter().any(|e| matches!(e, GameEvent::HeartLost { .. })) {
                down = true;
                assert!(s.level().target_position(player).is_none());
                assert!(s.agents().iter().all(|agent| !agent.is_chasing()));
            }
            if events.contains(&GameEvent::PlayerRespawned) {
                assert!(down);
                assert!(s.level().target_position(player).is_some());
                return;
            }
        }
        panic!("player never respawned");
    }

    #[test]
    fn test_proximity_enemy_chases_player() {
        let layout = LevelLayout::parse("#######\n#P...E#\n#######").unwrap();
        let mut config = SessionConfig::without_cinematics();
        config.agent.detection_mode = DetectionMode::Proximity;
        let mut s = LevelSession::from_layout(layout, config, 1).unwrap();
        let events = s.advance(DT);
        let agent = s.agents()[0].id();
        assert!(events.contains(&GameEvent::ChaseStarted {
            agent,
            target: s.player().id()
        }));
        assert!(s.agent(agent).unwrap().is_chasing());
        assert!(matches!(
            s.agent(crate::new_entity_id()),
            Err(ChaseError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut s = session("PK.G");
        s.hold(Direction::Right);
        run(&mut s, 20);
        assert_eq!(s.keys_collected(), 1);
        s.restart().unwrap();
        assert_eq!(s.keys_collected(), 0);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.player().cell(), Cell::new(0, 0));
        assert!(s.level().has_key(Cell::new(1, 0)));
    }

    #[test]
    fn test_same_seed_replays_same_events() {
        let layout = crate::generate_layout(&crate::GenerationConfig::for_testing(4)).unwrap();
        let mut config = SessionConfig::without_cinematics();
        config.agent.detection_mode = DetectionMode::Proximity;
        config.agent.detection_radius = 20.0;
        let mut a = LevelSession::from_layout(layout.clone(), config.clone(), 8).unwrap();
        let mut b = LevelSession::from_layout(layout, config, 8).unwrap();

        assert_eq!(a.player().id(), b.player().id());
        let first = run(&mut a, 300);
        assert!(first
            .iter()
            .any(|event| matches!(event, GameEvent::ChaseStarted { .. })));
        assert_eq!(first, run(&mut b, 300));

        let agent = a.agents()[0].id();
        a.restart().unwrap();
        assert_eq!(a.agents()[0].id(), agent);
        assert_eq!(run(&mut a, 300), first);
    }

    #[test]
    fn test_hazard_contact() {
        let layout = LevelLayout::parse("P..H..").unwrap();
        let mut config = SessionConfig::without_cinematics();
        config.hazard.span = 2;
        let mut s = LevelSession::from_layout(layout, config, 4).unwrap();
        assert_eq!(s.hazards().len(), 1);
        s.hold(Direction::Right);
        let events = run(&mut s, 200);
        assert!(events.iter().any(|e| matches!(e, GameEvent::HeartLost { .. })));
    }
}
