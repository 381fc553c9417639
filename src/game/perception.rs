//! # Perception
//!
//! The patrol/chase state machine of an enemy.
//!
//! While patrolling, each tick looks for a target inside the detection radius.
//! Once a target is found the agent chases it for a fixed duration; the chase
//! ends when that timer runs out or the target disappears. Detection is not
//! re-evaluated during a chase, so the timer is never refreshed mid-chase.

use crate::{AgentConfig, SpatialQueries, TargetId};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How an agent decides a target is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// First target in radius with an unobstructed ray to the agent
    #[default]
    LineOfSight,
    /// Nearest target in radius, walls ignored
    Proximity,
}

/// Current perception state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerceptionState {
    Patrol,
    Chasing { target: TargetId, remaining: f32 },
}

/// Why a chase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaseEndReason {
    /// The chase timer ran out
    Expired,
    /// The target no longer exists
    TargetLost,
    /// The agent was locked or reset
    Reset,
}

/// Transitions reported by [`Perception::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerceptionEvent {
    ChaseStarted { target: TargetId },
    ChaseEnded { target: TargetId, reason: ChaseEndReason },
}

/// Patrol/chase state machine.
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use tilechase::{new_entity_id, AgentConfig, GridIndex, Level, Perception};
///
/// let mut level = Level::new(GridIndex::unit());
/// let player = new_entity_id();
/// level.set_target(player, Vec2::new(3.5, 0.5));
///
/// let mut perception = Perception::new(&AgentConfig::default());
/// perception.update(0.1, Vec2::new(0.5, 0.5), &level);
/// assert_eq!(perception.target(), Some(player));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    mode: DetectionMode,
    radius: f32,
    chase_duration: f32,
    state: PerceptionState,
}

impl Perception {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            mode: config.detection_mode,
            radius: config.detection_radius,
            chase_duration: config.chase_duration,
            state: PerceptionState::Patrol,
        }
    }

    pub fn state(&self) -> PerceptionState {
        self.state
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn is_chasing(&self) -> bool {
        matches!(self.state, PerceptionState::Chasing { .. })
    }

    pub fn target(&self) -> Option<TargetId> {
        match self.state {
            PerceptionState::Chasing { target, .. } => Some(target),
            PerceptionState::Patrol => None,
        }
    }

    /// Seconds left on the chase timer, zero while patrolling.
    pub fn remaining(&self) -> f32 {
        match self.state {
            PerceptionState::Chasing { remaining, .. } => remaining,
            PerceptionState::Patrol => 0.0,
        }
    }

    /// Runs the detection test from `position` without changing state.
    pub fn detect<Q>(&self, position: Vec2, queries: &Q) -> Option<TargetId>
    where
        Q: SpatialQueries + ?Sized,
    {
        let candidates = queries.targets_within_radius(position, self.radius);
        match self.mode {
            DetectionMode::LineOfSight => candidates
                .into_iter()
                .find(|target| queries.raycast_clear(position, target.position))
                .map(|target| target.id),
            DetectionMode::Proximity => candidates
                .into_iter()
                .min_by(|a, b| {
                    a.position
                        .distance(position)
                        .total_cmp(&b.position.distance(position))
                })
                .map(|target| target.id),
        }
    }

    /// Advances the state machine by one tick.
    ///
    /// Detection runs first, then the chase timer counts down, so the tick that
    /// starts a chase also spends `dt` of it.
    pub fn update<Q>(&mut self, dt: f32, position: Vec2, queries: &Q) -> Vec<PerceptionEvent>
    where
        Q: SpatialQueries + ?Sized,
    {
        let mut events = Vec::new();

        if !self.is_chasing() {
            if let Some(target) = self.detect(position, queries) {
                log::debug!("target {} detected, chasing for {}s", target, self.chase_duration);
                self.state = PerceptionState::Chasing {
                    target,
                    remaining: self.chase_duration,
                };
                events.push(PerceptionEvent::ChaseStarted { target });
            }
        }

        if let PerceptionState::Chasing { target, remaining } = &mut self.state {
            *remaining -= dt;
            let reason = if queries.target_position(*target).is_none() {
                Some(ChaseEndReason::TargetLost)
            } else if *remaining <= 0.0 {
                Some(ChaseEndReason::Expired)
            } else {
                None
            };
            if let Some(reason) = reason {
                let target = *target;
                log::debug!("chase of {} ended: {:?}", target, reason);
                self.state = PerceptionState::Patrol;
                events.push(PerceptionEvent::ChaseEnded { target, reason });
            }
        }

        events
    }

    /// Drops any chase immediately.
    pub fn reset(&mut self) -> Option<PerceptionEvent> {
        let target = self.target()?;
        self.state = PerceptionState::Patrol;
        Some(PerceptionEvent::ChaseEnded {
            target,
            reason: ChaseEndReason::Reset,
        })
    }
}
