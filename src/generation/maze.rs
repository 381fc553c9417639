//! # Maze Generation
//!
//! Recursive-backtracker mazes with optional loops.
//!
//! Rooms sit on odd coordinates and start out fully walled; a depth-first walk
//! knocks out the wall between each room and an unvisited neighbour. The
//! player starts in the bottom-left room and the goal lands on the room
//! farthest from it. When keys are requested, the last cell before the goal
//! becomes a gate and keys go on cells reachable without crossing it.

use crate::{find_path, Bounds, Cell, ChaseError, ChaseResult, Direction, PathFinder};
use crate::{GenerationConfig, Generator, LevelLayout};
use ::pathfinding::prelude::bfs_reach;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Minimum Manhattan distance between the player start and any enemy spawn.
const SAFE_RADIUS: u32 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct MazeGenerator;

impl MazeGenerator {
    pub fn new() -> Self {
        Self
    }

    fn carve(width: i32, height: i32, rng: &mut StdRng) -> BTreeSet<Cell> {
        let mut walls: BTreeSet<Cell> = (0..width)
            .flat_map(|x| (0..height).map(move |y| Cell::new(x, y)))
            .collect();

        let start = Cell::new(1, 1);
        walls.remove(&start);
        let mut stack = vec![start];
        let mut visited = BTreeSet::from([start]);

        while let Some(&room) = stack.last() {
            let mut directions = Direction::ALL;
            directions.shuffle(rng);
            let next = directions.into_iter().find_map(|direction| {
                let (dx, dy) = direction.delta();
                let neighbour = Cell::new(room.x + 2 * dx, room.y + 2 * dy);
                let inside = neighbour.x > 0
                    && neighbour.y > 0
                    && neighbour.x < width - 1
                    && neighbour.y < height - 1;
                (inside && !visited.contains(&neighbour)).then_some((direction, neighbour))
            });

            match next {
                Some((direction, neighbour)) => {
                    walls.remove(&room.step(direction));
                    walls.remove(&neighbour);
                    visited.insert(neighbour);
                    stack.push(neighbour);
                }
                None => {
                    stack.pop();
                }
            }
        }
        walls
    }

    fn add_loops(walls: &mut BTreeSet<Cell>, width: i32, height: i32, chance: f64, rng: &mut StdRng) {
        if chance <= 0.0 {
            return;
        }
        let candidates: Vec<Cell> = walls
            .iter()
            .copied()
            .filter(|cell| cell.x > 0 && cell.y > 0 && cell.x < width - 1 && cell.y < height - 1)
            .filter(|cell| (cell.x % 2 == 0) != (cell.y % 2 == 0))
            .collect();
        for cell in candidates {
            if rng.gen_bool(chance) {
                walls.remove(&cell);
            }
        }
    }

    fn reachable(walls: &BTreeSet<Cell>, blocked: Option<Cell>, from: Cell) -> Vec<Cell> {
        bfs_reach(from, |cell: &Cell| {
            let cell = *cell;
            Direction::ALL
                .into_iter()
                .map(move |direction| cell.step(direction))
                .filter(|next| !walls.contains(next) && Some(*next) != blocked)
                .collect::<Vec<_>>()
        })
        .collect()
    }
}

impl Generator<LevelLayout> for MazeGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> ChaseResult<LevelLayout> {
        config.validate()?;
        let width = (config.width | 1) as i32;
        let height = (config.height | 1) as i32;

        let mut walls = Self::carve(width, height, rng);
        Self::add_loops(&mut walls, width, height, config.loop_chance, rng);

        let player = Cell::new(1, 1);
        let order = Self::reachable(&walls, None, player);
        let goal = order.last().copied().unwrap_or(player);
        if goal == player {
            return Err(ChaseError::InvalidLayout(
                "maze has no room besides the start".to_string(),
            ));
        }

        let bounds = Bounds::from_size(width as u32, height as u32);
        let route = PathFinder::new()
            .with_bounds(Some(bounds))
            .find(player, goal, |cell, direction| walls.contains(&cell.step(direction)));

        let gate = if config.key_count > 0 && route.len() > 2 {
            route.get(route.len() - 2)
        } else {
            None
        };

        let mut open: Vec<Cell> = Self::reachable(&walls, gate, player)
            .into_iter()
            .filter(|cell| *cell != player && *cell != goal)
            .collect();
        open.sort();
        open.shuffle(rng);

        let keys: Vec<Cell> = open.iter().copied().take(config.key_count as usize).collect();
        let enemies: Vec<Cell> = open
            .iter()
            .copied()
            .skip(keys.len())
            .filter(|cell| cell.manhattan_distance(player) >= SAFE_RADIUS)
            .take(config.enemy_count as usize)
            .collect();

        if keys.len() < config.key_count as usize || enemies.len() < config.enemy_count as usize {
            return Err(ChaseError::InvalidConfig(format!(
                "{}x{} maze is too small for {} keys and {} enemies",
                width, height, config.key_count, config.enemy_count
            )));
        }

        Ok(LevelLayout {
            width: width as u32,
            height: height as u32,
            walls,
            player,
            enemies,
            keys,
            goals: vec![goal],
            gates: gate.into_iter().collect(),
            hazards: Vec::new(),
        })
    }

    fn validate(&self, layout: &LevelLayout, config: &GenerationConfig) -> ChaseResult<()> {
        if layout.keys.len() != config.key_count as usize {
            return Err(ChaseError::InvalidLayout(format!(
                "expected {} keys, placed {}",
                config.key_count,
                layout.keys.len()
            )));
        }

        let blocked = |cell: Cell, direction: Direction| layout.walls.contains(&cell.step(direction));
        for target in layout.keys.iter().chain(&layout.goals) {
            if !find_path(layout.player, *target, blocked).is_found() {
                return Err(ChaseError::InvalidLayout(format!(
                    "{} is unreachable from the player",
                    target
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "maze"
    }
}
