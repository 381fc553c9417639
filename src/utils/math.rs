//! # Game Mathematics
//!
//! Small vector helpers shared by the movers.

use glam::Vec2;

/// Distance under which two positions count as the same point.
pub const ARRIVAL_EPSILON: f32 = 1e-4;

/// Moves `current` toward `target` by at most `max_delta`, landing exactly on
/// `target` when it is within reach.
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use tilechase::move_towards;
///
/// let halfway = move_towards(Vec2::ZERO, Vec2::new(2.0, 0.0), 1.0);
/// assert_eq!(halfway, Vec2::new(1.0, 0.0));
/// assert_eq!(move_towards(halfway, Vec2::new(2.0, 0.0), 5.0), Vec2::new(2.0, 0.0));
/// ```
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta + ARRIVAL_EPSILON || distance == 0.0 {
        target
    } else {
        current + offset / distance * max_delta
    }
}

/// Whether two points are within [`ARRIVAL_EPSILON`] of each other.
pub fn approx_same(a: Vec2, b: Vec2) -> bool {
    a.distance(b) <= ARRIVAL_EPSILON
}
