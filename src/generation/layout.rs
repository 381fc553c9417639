//! # Level Layouts
//!
//! Plain-text level maps.
//!
//! | Char        | Meaning                                   |
//! |-------------|-------------------------------------------|
//! | `#`         | wall                                      |
//! | `.` / space | floor                                     |
//! | `P`         | player start (exactly one)                |
//! | `E`         | chasing enemy spawn                       |
//! | `K`         | key                                       |
//! | `G`         | goal                                      |
//! | `D`         | gate, a wall until the keys are collected |
//! | `H`         | hazard route start                        |
//!
//! The first line of text is the top row, so it gets the highest `y`.

use crate::{Bounds, Cell, ChaseError, ChaseResult, GridIndex, Level};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A parsed level map.
///
/// # Examples
///
/// ```
/// use tilechase::{Cell, LevelLayout};
///
/// let layout = LevelLayout::parse("#####\n#P.G#\n#####").unwrap();
/// assert_eq!(layout.width, 5);
/// assert_eq!(layout.player, Cell::new(1, 1));
/// assert_eq!(layout.goals, vec![Cell::new(3, 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub width: u32,
    pub height: u32,
    pub walls: BTreeSet<Cell>,
    pub player: Cell,
    pub enemies: Vec<Cell>,
    pub keys: Vec<Cell>,
    pub goals: Vec<Cell>,
    pub gates: Vec<Cell>,
    pub hazards: Vec<Cell>,
}

impl LevelLayout {
    /// Parses a text map. Blank lines before and after the map are ignored.
    pub fn parse(text: &str) -> ChaseResult<Self> {
        let lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
        let first = lines.iter().position(|line| !line.trim().is_empty());
        let last = lines.iter().rposition(|line| !line.trim().is_empty());
        let rows = match (first, last) {
            (Some(first), Some(last)) => &lines[first..=last],
            _ => return Err(ChaseError::InvalidLayout("layout is empty".to_string())),
        };

        let height = rows.len() as u32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as u32;

        let mut walls = BTreeSet::new();
        let mut players = Vec::new();
        let mut enemies = Vec::new();
        let mut keys = Vec::new();
        let mut goals = Vec::new();
        let mut gates = Vec::new();
        let mut hazards = Vec::new();

        for (line_index, row) in rows.iter().enumerate() {
            let y = (height as usize - 1 - line_index) as i32;
            for (x, ch) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, y);
                match ch {
                    '#' => {
                        walls.insert(cell);
                    }
                    '.' | ' ' => {}
                    'P' => players.push(cell),
                    'E' => enemies.push(cell),
                    'K' => keys.push(cell),
                    'G' => goals.push(cell),
                    'D' => gates.push(cell),
                    'H' => hazards.push(cell),
                    other => {
                        return Err(ChaseError::InvalidLayout(format!(
                            "unknown tile '{}' at line {}, column {}",
                            other,
                            line_index + 1,
                            x + 1
                        )))
                    }
                }
            }
        }

        let player = match players.as_slice() {
            [player] => *player,
            found => {
                return Err(ChaseError::InvalidLayout(format!(
                    "layout needs exactly one player, found {}",
                    found.len()
                )))
            }
        };

        Ok(Self {
            width,
            height,
            walls,
            player,
            enemies,
            keys,
            goals,
            gates,
            hazards,
        })
    }

    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<std::path::Path>) -> ChaseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(self.width, self.height)
    }

    /// Character for `cell`, as [`LevelLayout::parse`] would read it.
    pub fn tile_at(&self, cell: Cell) -> char {
        if cell == self.player {
            'P'
        } else if self.walls.contains(&cell) {
            '#'
        } else if self.gates.contains(&cell) {
            'D'
        } else if self.goals.contains(&cell) {
            'G'
        } else if self.keys.contains(&cell) {
            'K'
        } else if self.enemies.contains(&cell) {
            'E'
        } else if self.hazards.contains(&cell) {
            'H'
        } else {
            '.'
        }
    }

    /// Writes the layout back out as text.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for y in (0..self.height as i32).rev() {
            for x in 0..self.width as i32 {
                text.push(self.tile_at(Cell::new(x, y)));
            }
            text.push('\n');
        }
        text
    }

    /// Builds the static part of a level: walls, gates, keys and goals.
    ///
    /// The map is fenced in by a ring of walls just outside its bounds, so
    /// nothing can walk off an edge left open in the text.
    pub fn build_level(&self, grid: GridIndex) -> Level {
        let bounds = self.bounds();
        let mut level = Level::new(grid).with_bounds(bounds);

        for wall in &self.walls {
            level.add_wall(*wall);
        }
        let fence = bounds.expand(1);
        for x in fence.min.x..=fence.max.x {
            level.add_wall(Cell::new(x, fence.min.y));
            level.add_wall(Cell::new(x, fence.max.y));
        }
        for y in fence.min.y..=fence.max.y {
            level.add_wall(Cell::new(fence.min.x, y));
            level.add_wall(Cell::new(fence.max.x, y));
        }

        for gate in &self.gates {
            level.add_gate(*gate);
        }
        for key in &self.keys {
            level.add_key(*key);
        }
        for goal in &self.goals {
            level.add_goal(*goal);
        }
        level
    }
}
