//! # Input Module
//!
//! Turns player commands into session calls.

pub mod commands;

pub use commands::*;

use crate::{ChaseResult, GameEvent, LevelSession};

/// Applies [`PlayerCommand`]s to a session.
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    /// Commands applied so far
    pub applied: u64,
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilechase::InputHandler;
    ///
    /// let handler = InputHandler::new();
    /// assert_eq!(handler.applied, 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one command.
    ///
    /// Answering before the goal is reached is an error; everything else only
    /// changes what the player will do on the next tick.
    pub fn apply(
        &mut self,
        command: PlayerCommand,
        session: &mut LevelSession,
    ) -> ChaseResult<Vec<GameEvent>> {
        self.applied += 1;
        log::trace!("command {:?}", command);
        match command {
            PlayerCommand::Press(direction) => session.press(direction),
            PlayerCommand::Hold(direction) => session.hold(direction),
            PlayerCommand::Release => session.release(),
            PlayerCommand::Wait => {}
            PlayerCommand::Answer(correct) => return session.answer(correct),
            PlayerCommand::Restart => session.restart()?,
        }
        Ok(Vec::new())
    }
}
