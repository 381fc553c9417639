//! # Display Management
//!
//! Plain-text snapshots of a running session, for logs and the headless CLI.

use crate::{Cell, GameCompletionState, LevelSession, SpatialQueries};

/// Characters used for each kind of cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyphs {
    pub wall: char,
    pub floor: char,
    pub player: char,
    pub enemy: char,
    pub chasing_enemy: char,
    pub hazard: char,
    pub key: char,
    pub goal: char,
    pub closed_gate: char,
    pub open_gate: char,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            wall: '#',
            floor: '.',
            player: 'P',
            enemy: 'E',
            chasing_enemy: '!',
            hazard: 'H',
            key: 'K',
            goal: 'G',
            closed_gate: 'D',
            open_gate: '/',
        }
    }
}

/// Renders sessions as text grids.
#[derive(Debug, Clone, Default)]
pub struct AsciiRenderer {
    pub glyphs: Glyphs,
    /// Append a status line under the map
    pub show_status: bool,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self {
            glyphs: Glyphs::default(),
            show_status: true,
        }
    }

    /// Draws the map with every actor on its current cell, top row first.
    ///
    /// Actors in transit are drawn on the cell their position falls in.
    pub fn render(&self, session: &LevelSession) -> String {
        let bounds = session.layout().bounds();
        let mut text = String::new();
        for y in (bounds.min.y..=bounds.max.y).rev() {
            for x in bounds.min.x..=bounds.max.x {
                text.push(self.glyph_at(session, Cell::new(x, y)));
            }
            text.push('\n');
        }
        if self.show_status {
            text.push_str(&status_line(session));
            text.push('\n');
        }
        text
    }

    fn glyph_at(&self, session: &LevelSession, cell: Cell) -> char {
        let grid = session.grid();
        let level = session.level();
        let g = &self.glyphs;

        if grid.world_to_cell(session.player().position()) == cell {
            return g.player;
        }
        if let Some(agent) = session
            .agents()
            .iter()
            .find(|agent| grid.world_to_cell(agent.position()) == cell)
        {
            return if agent.is_chasing() {
                g.chasing_enemy
            } else {
                g.enemy
            };
        }
        if session
            .hazards()
            .iter()
            .any(|hazard| grid.world_to_cell(hazard.position()) == cell)
        {
            return g.hazard;
        }
        if level.is_gate(cell) {
            return if level.gates_open() {
                g.open_gate
            } else {
                g.closed_gate
            };
        }
        if level.is_wall_at(cell) {
            g.wall
        } else if level.has_key(cell) {
            g.key
        } else if level.is_goal(cell) {
            g.goal
        } else {
            g.floor
        }
    }
}

/// One-line summary: lives, keys, completion state and tick count.
pub fn status_line(session: &LevelSession) -> String {
    let state = match session.completion() {
        GameCompletionState::Playing if session.in_cinematic() => "cinematic".to_string(),
        GameCompletionState::Playing => "playing".to_string(),
        GameCompletionState::AwaitingAnswer => "awaiting answer".to_string(),
        GameCompletionState::Won { stars } => format!("won ({} stars)", stars),
        GameCompletionState::Lost => "lost".to_string(),
    };
    format!(
        "tick {} | lives {} | keys {}/{} | {}",
        session.ticks(),
        session.lives(),
        session.keys_collected(),
        session.keys_required(),
        state
    )
}

/// Renders `session` with the default glyphs and a status line.
///
/// # Examples
///
/// ```
/// use tilechase::{render_ascii, LevelLayout, LevelSession, SessionConfig};
///
/// let layout = LevelLayout::parse("#####\n#P.G#\n#####").unwrap();
/// let session = LevelSession::from_layout(layout, SessionConfig::default(), 0).unwrap();
/// assert!(render_ascii(&session).starts_with("#####\n#P.G#\n#####\n"));
/// ```
pub fn render_ascii(session: &LevelSession) -> String {
    AsciiRenderer::new().render(session)
}
