//! # Generation Module
//!
//! Level layouts, both hand-written and procedurally generated.
//!
//! Hand-written levels come from the text format in [`layout`]. For demos and
//! benchmarks, [`MazeGenerator`] carves seeded mazes into the same
//! [`LevelLayout`] shape, so a given seed always yields the same level.

pub mod layout;
pub mod maze;

pub use layout::*;
pub use maze::*;

use crate::{ChaseError, ChaseResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Map width in cells; even values are rounded up to the next odd one
    pub width: u32,
    /// Map height in cells; even values are rounded up to the next odd one
    pub height: u32,
    /// Chasing enemies to place
    pub enemy_count: u32,
    /// Keys to place; a gate guards the goal when this is non-zero
    pub key_count: u32,
    /// Probability of knocking out an extra wall to create loops (0.0 to 1.0)
    pub loop_chance: f64,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: 21,
            height: 15,
            enemy_count: 2,
            key_count: 3,
            loop_chance: 0.1,
        }
    }

    /// Small maze for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 11,
            height: 9,
            enemy_count: 1,
            key_count: 1,
            loop_chance: 0.0,
        }
    }

    /// Same settings with another size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> ChaseResult<()> {
        if self.width < 5 || self.height < 5 {
            return Err(ChaseError::InvalidConfig(format!(
                "maze must be at least 5x5, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.loop_chance) {
            return Err(ChaseError::InvalidConfig(format!(
                "loop chance must be within [0, 1], got {}",
                self.loop_chance
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> ChaseResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> ChaseResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Creates a seeded random number generator from the config.
pub fn create_rng(config: &GenerationConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}

/// Generates and validates a maze level for `config`.
///
/// # Examples
///
/// ```
/// use tilechase::{generate_layout, GenerationConfig};
///
/// let config = GenerationConfig::for_testing(3);
/// let a = generate_layout(&config).unwrap();
/// let b = generate_layout(&config).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_layout(config: &GenerationConfig) -> ChaseResult<LevelLayout> {
    let generator = MazeGenerator::new();
    let mut rng = create_rng(config);
    let layout = generator.generate(config, &mut rng)?;
    generator.validate(&layout, config)?;
    log::debug!(
        "{} generator produced {}x{} level (seed {})",
        generator.generator_type(),
        layout.width,
        layout.height,
        config.seed
    );
    Ok(layout)
}
