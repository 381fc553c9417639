//! # Settings
//!
//! Runtime tuning for agents, the player and level sessions.
//!
//! All settings deserialize from JSON with every field optional; missing fields
//! take the defaults from [`crate::config`]. Values are checked once with
//! `validate` before anything is built from them.

use crate::config::*;
use crate::{ChaseError, ChaseResult, DetectionMode, RouteMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn require(condition: bool, message: impl FnOnce() -> String) -> ChaseResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ChaseError::InvalidConfig(message()))
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Tuning for one chasing enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// How targets are noticed
    pub detection_mode: DetectionMode,
    /// Detection radius in world units
    pub detection_radius: f32,
    /// Seconds a chase lasts
    pub chase_duration: f32,
    /// Speed multiplier while chasing
    pub chase_speed_multiplier: f32,
    /// Base speed in cells per second
    pub move_speed: f32,
    /// Extra cells around start/goal searched when the level is unbounded
    pub search_margin: i32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            detection_mode: DetectionMode::LineOfSight,
            detection_radius: DEFAULT_DETECTION_RADIUS,
            chase_duration: DEFAULT_CHASE_DURATION,
            chase_speed_multiplier: DEFAULT_CHASE_SPEED_MULTIPLIER,
            move_speed: DEFAULT_AGENT_SPEED,
            search_margin: DEFAULT_SEARCH_MARGIN,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> ChaseResult<()> {
        require(non_negative(self.detection_radius), || {
            format!("detection radius must be >= 0, got {}", self.detection_radius)
        })?;
        require(positive(self.chase_duration), || {
            format!("chase duration must be > 0, got {}", self.chase_duration)
        })?;
        require(positive(self.chase_speed_multiplier), || {
            format!(
                "chase speed multiplier must be > 0, got {}",
                self.chase_speed_multiplier
            )
        })?;
        require(positive(self.move_speed), || {
            format!("agent move speed must be > 0, got {}", self.move_speed)
        })?;
        require(self.search_margin >= 0, || {
            format!("search margin must be >= 0, got {}", self.search_margin)
        })
    }
}

/// Tuning for the player mover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed in cells per second
    pub move_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_PLAYER_SPEED,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> ChaseResult<()> {
        require(positive(self.move_speed), || {
            format!("player move speed must be > 0, got {}", self.move_speed)
        })
    }
}

/// Tuning for waypoint hazards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Speed in cells per second
    pub speed: f32,
    /// What happens at the end of the route
    pub mode: RouteMode,
    /// Optional `[min, max)` range drawn from at the start of every lap
    pub random_speed: Option<(f32, f32)>,
    /// Route length in cells when a hazard patrols horizontally from its spawn
    pub span: u32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            mode: RouteMode::PingPong,
            random_speed: None,
            span: 3,
        }
    }
}

impl HazardConfig {
    pub fn validate(&self) -> ChaseResult<()> {
        require(positive(self.speed), || {
            format!("hazard speed must be > 0, got {}", self.speed)
        })?;
        if let Some((min, max)) = self.random_speed {
            require(positive(min) && positive(max) && min < max, || {
                format!("random speed range must satisfy 0 < min < max, got [{}, {})", min, max)
            })?;
        }
        require(self.span >= 1, || "hazard span must be at least one cell".to_string())
    }
}

/// Everything a [`crate::LevelSession`] needs besides the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World units per cell
    pub cell_size: f32,
    pub agent: AgentConfig,
    pub player: PlayerConfig,
    pub hazard: HazardConfig,
    /// Lives at the start of the level
    pub lives: u32,
    /// Keys needed to open the gates; `None` means every key in the layout
    pub keys_required: Option<u32>,
    /// Seconds after a hit during which no further heart is lost
    pub heart_cooldown: f32,
    /// Contact distance between player and enemy, as a fraction of a cell
    pub contact_radius: f32,
    /// Seconds everything stays locked at level start
    pub intro_duration: f32,
    /// Seconds between a hit and the player reset
    pub focus_duration: f32,
    /// Seconds between the player reset and unlocking
    pub respawn_buffer: f32,
    /// Seconds the key cinematic holds everything locked before the gates open
    pub key_reveal_duration: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            agent: AgentConfig::default(),
            player: PlayerConfig::default(),
            hazard: HazardConfig::default(),
            lives: DEFAULT_LIVES,
            keys_required: Some(DEFAULT_KEYS_REQUIRED),
            heart_cooldown: DEFAULT_HEART_COOLDOWN,
            contact_radius: 0.5,
            intro_duration: 2.5,
            focus_duration: 1.0,
            respawn_buffer: 0.3,
            key_reveal_duration: 1.5,
        }
    }
}

impl SessionConfig {
    /// Settings with every cinematic pause removed, handy for tests and replays.
    pub fn without_cinematics() -> Self {
        Self {
            intro_duration: 0.0,
            focus_duration: 0.0,
            respawn_buffer: 0.0,
            key_reveal_duration: 0.0,
            ..Self::default()
        }
    }

    /// Parses and validates settings from a JSON string.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::{DetectionMode, SessionConfig};
    ///
    /// let config = SessionConfig::from_json_str(
    ///     r#"{ "lives": 5, "agent": { "detection_mode": "proximity" } }"#,
    /// ).unwrap();
    /// assert_eq!(config.lives, 5);
    /// assert_eq!(config.agent.detection_mode, DetectionMode::Proximity);
    /// assert_eq!(config.agent.chase_duration, 10.0);
    /// ```
    pub fn from_json_str(json: &str) -> ChaseResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ChaseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> ChaseResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ChaseResult<()> {
        require(positive(self.cell_size), || {
            format!("cell size must be > 0, got {}", self.cell_size)
        })?;
        self.agent.validate()?;
        self.player.validate()?;
        self.hazard.validate()?;
        require(self.lives >= 1, || "a level needs at least one life".to_string())?;
        require(non_negative(self.heart_cooldown), || {
            format!("heart cooldown must be >= 0, got {}", self.heart_cooldown)
        })?;
        require(positive(self.contact_radius), || {
            format!("contact radius must be > 0, got {}", self.contact_radius)
        })?;
        for (name, value) in [
            ("intro duration", self.intro_duration),
            ("focus duration", self.focus_duration),
            ("respawn buffer", self.respawn_buffer),
            ("key reveal duration", self.key_reveal_duration),
        ] {
            require(non_negative(value), || format!("{} must be >= 0, got {}", name, value))?;
        }
        Ok(())
    }
}
