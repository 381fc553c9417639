//! # Rendering Module
//!
//! Debug text output. A real frontend draws from the same session accessors.

pub mod display;

pub use display::*;
