//! # Waypoint Routes
//!
//! Hazards that glide along a fixed list of waypoints at constant speed. They
//! ignore the grid entirely and never chase anything.

use crate::{move_towards, new_entity_id, AgentId, ChaseError, ChaseResult};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What a route does after its last waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// Stop at the last waypoint
    Once,
    /// Return to the first waypoint and go round again
    Loop,
    /// Walk back through the waypoints in reverse, then repeat
    #[default]
    PingPong,
}

/// Follows waypoints at a constant speed.
///
/// A lap always starts from wherever the mover currently is, so changing the
/// speed mid-route restarts the lap without a jump.
///
/// # Examples
///
/// ```
/// use glam::Vec2;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use tilechase::{RouteMode, RouteMover};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let waypoints = vec![Vec2::ZERO, Vec2::new(4.0, 0.0)];
/// let mut route = RouteMover::new(waypoints, 2.0, RouteMode::Once).unwrap();
///
/// route.tick(1.0, &mut rng);
/// assert_eq!(route.position(), Vec2::new(2.0, 0.0));
/// route.tick(5.0, &mut rng);
/// assert!(route.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct RouteMover {
    id: AgentId,
    waypoints: Vec<Vec2>,
    mode: RouteMode,
    speed: f32,
    random_speed: Option<(f32, f32)>,
    roll_pending: bool,
    position: Vec2,
    lap: Vec<Vec2>,
    next: usize,
    laps: u32,
    finished: bool,
    locked: bool,
}

impl RouteMover {
    /// Creates a route starting on the first waypoint.
    ///
    /// Needs at least two waypoints that are not all the same point, and a
    /// positive speed in world units per second.
    pub fn new(waypoints: Vec<Vec2>, speed: f32, mode: RouteMode) -> ChaseResult<Self> {
        if waypoints.len() < 2 {
            return Err(ChaseError::InvalidConfig(format!(
                "a route needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if waypoints.iter().any(|point| !point.is_finite()) {
            return Err(ChaseError::InvalidConfig(
                "route waypoints must be finite".to_string(),
            ));
        }
        if waypoints.iter().all(|point| *point == waypoints[0]) {
            return Err(ChaseError::InvalidConfig(
                "route waypoints must not all coincide".to_string(),
            ));
        }
        check_speed(speed)?;

        let position = waypoints[0];
        let lap = circuit(&waypoints, mode);
        Ok(Self {
            id: new_entity_id(),
            waypoints,
            mode,
            speed,
            random_speed: None,
            roll_pending: false,
            position,
            lap,
            next: 0,
            laps: 0,
            finished: false,
            locked: false,
        })
    }

    /// Draws a fresh speed from `[min, max)` at the start of every lap.
    pub fn with_random_speed(mut self, min: f32, max: f32) -> ChaseResult<Self> {
        check_speed(min)?;
        check_speed(max)?;
        if min >= max {
            return Err(ChaseError::InvalidConfig(format!(
                "random speed range is empty: [{}, {})",
                min, max
            )));
        }
        self.random_speed = Some((min, max));
        self.roll_pending = true;
        Ok(self)
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: AgentId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn laps_completed(&self) -> u32 {
        self.laps
    }

    /// Only `Once` routes ever finish.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Changes the speed and restarts the lap from the current position.
    pub fn set_speed(&mut self, speed: f32) -> ChaseResult<()> {
        check_speed(speed)?;
        self.speed = speed;
        self.roll_pending = false;
        self.lap = circuit(&self.waypoints, self.mode);
        self.next = 0;
        self.finished = false;
        Ok(())
    }

    /// Moves along the route; returns how many laps were completed.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> u32 {
        if self.locked || self.finished {
            return 0;
        }
        if self.roll_pending {
            self.roll_speed(rng);
        }

        let mut completed = 0;
        let mut budget = self.speed * dt.max(0.0);
        loop {
            if self.next >= self.lap.len() {
                completed += 1;
                self.laps += 1;
                if self.mode == RouteMode::Once {
                    self.finished = true;
                    break;
                }
                self.lap = circuit(&self.waypoints, self.mode);
                self.next = 0;
                self.roll_speed(rng);
            }
            if budget <= 0.0 {
                break;
            }

            let target = self.lap[self.next];
            let distance = self.position.distance(target);
            if distance <= budget {
                self.position = target;
                budget -= distance;
                self.next += 1;
            } else {
                self.position = move_towards(self.position, target, budget);
                budget = 0.0;
            }
        }
        completed
    }

    /// Freezes the route in place.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Puts the mover back on the first waypoint with a fresh lap.
    pub fn reset(&mut self) {
        self.position = self.waypoints[0];
        self.lap = circuit(&self.waypoints, self.mode);
        self.next = 0;
        self.laps = 0;
        self.finished = false;
        self.roll_pending = self.random_speed.is_some();
    }

    fn roll_speed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.roll_pending = false;
        if let Some((min, max)) = self.random_speed {
            self.speed = rng.gen_range(min..max);
            log::trace!("route {} lap speed {:.2}", self.id, self.speed);
        }
    }
}

fn check_speed(speed: f32) -> ChaseResult<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(ChaseError::InvalidConfig(format!(
            "route speed must be > 0, got {}",
            speed
        )))
    }
}

/// Points visited in one lap, excluding the starting point.
fn circuit(waypoints: &[Vec2], mode: RouteMode) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = waypoints[1..].to_vec();
    match mode {
        RouteMode::Once => {}
        RouteMode::Loop => points.push(waypoints[0]),
        RouteMode::PingPong => points.extend(waypoints[..waypoints.len() - 1].iter().rev()),
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
        ]
    }

    #[test]
    fn test_needs_two_distinct_waypoints() {
        assert!(RouteMover::new(vec![Vec2::ZERO], 1.0, RouteMode::Loop).is_err());
        assert!(RouteMover::new(vec![Vec2::ONE, Vec2::ONE], 1.0, RouteMode::Loop).is_err());
        assert!(RouteMover::new(square(), 0.0, RouteMode::Loop).is_err());
    }

    #[test]
    fn test_circuit_shapes() {
        let points = square();
        assert_eq!(circuit(&points, RouteMode::Once), points[1..].to_vec());
        assert_eq!(circuit(&points, RouteMode::Loop).last(), Some(&points[0]));
        assert_eq!(
            circuit(&points, RouteMode::PingPong),
            vec![points[1], points[2], points[1], points[0]]
        );
    }

    #[test]
    fn test_loop_wraps_to_start() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::Loop).unwrap();
        // Perimeter: 2 + 2 + sqrt(8)
        let lap = 4.0 + 8.0f32.sqrt();
        assert_eq!(route.tick(lap + 0.01, &mut rng), 1);
        assert!(route.position().distance(Vec2::ZERO) < 0.02);
        assert!(!route.is_finished());
    }

    #[test]
    fn test_ping_pong_turns_around() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::PingPong).unwrap();
        route.tick(5.0, &mut rng);
        assert!(route.position().distance(Vec2::new(2.0, 1.0)) < 1e-4);
        route.tick(3.0, &mut rng);
        assert!(route.position().distance(Vec2::ZERO) < 1e-4);
        assert_eq!(route.laps_completed(), 1);
    }

    #[test]
    fn test_once_stops_at_end() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::Once).unwrap();
        assert_eq!(route.tick(100.0, &mut rng), 1);
        assert!(route.is_finished());
        assert_eq!(route.position(), Vec2::new(2.0, 2.0));
        assert_eq!(route.tick(1.0, &mut rng), 0);
    }

    #[test]
    fn test_set_speed_restarts_lap_from_current_position() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::Loop).unwrap();
        route.tick(3.0, &mut rng);
        let here = route.position();
        route.set_speed(2.0).unwrap();
        assert_eq!(route.position(), here);
        // Lap restarts toward the second waypoint.
        route.tick(0.25, &mut rng);
        assert!(route.position().y < here.y);
    }

    #[test]
    fn test_random_speed_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::PingPong)
            .unwrap()
            .with_random_speed(1.5, 3.0)
            .unwrap();
        for _ in 0..50 {
            route.tick(0.5, &mut rng);
            assert!((1.5..3.0).contains(&route.speed()));
        }
        assert!(route.laps_completed() > 0);
    }

    #[test]
    fn test_lock_freezes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut route = RouteMover::new(square(), 1.0, RouteMode::Loop).unwrap();
        route.lock();
        route.tick(1.0, &mut rng);
        assert_eq!(route.position(), Vec2::ZERO);
        route.unlock();
        route.tick(1.0, &mut rng);
        assert_eq!(route.position(), Vec2::new(1.0, 0.0));
    }
}
