//! # Tilechase
//!
//! Grid pathfinding, patrol and chase AI for tile-based stealth levels.
//!
//! ## Architecture Overview
//!
//! Tilechase is a pure in-process library that a host engine drives once per frame.
//! The engine supplies spatial queries (walls, other agents, line of sight, nearby
//! targets) through the [`SpatialQueries`] trait; the crate answers with movement
//! decisions and game events.
//!
//! - **Grid**: [`Cell`], [`Direction`] and [`GridIndex`] map world positions onto an
//!   implicit integer lattice
//! - **Path finding**: breadth-first search with a fixed direction order, so equal-length
//!   routes always resolve the same way
//! - **Agents**: [`ChaseAgent`] combines perception, patrol and step movement;
//!   [`PlayerMover`] and [`RouteMover`] cover the other movers in a level
//! - **Session**: [`LevelSession`] wires everything together and applies the level rules
//!   (lives, keys, goal, respawn sequences)
//!
//! Every frame is split into a decision phase (`update`) and a movement phase
//! (`fixed_update`). Decisions never move anything; positions only change in the
//! movement phase.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for the Tilechase engine.
#[derive(thiserror::Error, Debug)]
pub enum ChaseError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration is unusable; raised at setup time, never mid-tick
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Level text could not be parsed into a layout
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Input command could not be understood
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Session state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No agent with the given id exists in the session
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),
}

/// Result type used throughout the Tilechase codebase.
pub type ChaseResult<T> = Result<T, ChaseError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tuning constants.
pub mod config {
    /// Radius (world units) inside which an agent notices a target
    pub const DEFAULT_DETECTION_RADIUS: f32 = 8.0;

    /// Seconds a chase lasts once started
    pub const DEFAULT_CHASE_DURATION: f32 = 10.0;

    /// Speed multiplier applied while chasing
    pub const DEFAULT_CHASE_SPEED_MULTIPLIER: f32 = 1.4;

    /// Enemy walking speed in cells per second
    pub const DEFAULT_AGENT_SPEED: f32 = 1.1;

    /// Player walking speed in cells per second
    pub const DEFAULT_PLAYER_SPEED: f32 = 7.0;

    /// Extra cells searched around the start/goal rectangle when no bounds are known
    pub const DEFAULT_SEARCH_MARGIN: i32 = 32;

    /// Lives at the start of a level
    pub const DEFAULT_LIVES: u32 = 3;

    /// Keys needed to open the gate
    pub const DEFAULT_KEYS_REQUIRED: u32 = 3;

    /// Seconds after losing a heart during which no further heart can be lost
    pub const DEFAULT_HEART_COOLDOWN: f32 = 0.5;

    /// Simulation rate used by the CLI
    pub const TARGET_TPS: u32 = 50;

    /// Longest command script accepted, in ticks (about five and a half hours at 50 Hz)
    pub const MAX_SCRIPT_COMMANDS: usize = 1_000_000;
}
