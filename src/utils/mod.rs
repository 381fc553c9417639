//! # Utilities Module
//!
//! Vector math and path finding used by the movers.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use self::pathfinding::*;
