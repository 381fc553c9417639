//! # Command Definitions
//!
//! Player commands and the script format used for headless runs.
//!
//! A script is a string of single-character commands, one per tick. A number
//! in front of a command repeats it, and whitespace is ignored:
//!
//! ```text
//! d 10. W 20. -  y
//! ```
//!
//! presses right, waits ten ticks, holds up for twenty ticks, releases, then
//! answers the goal question correctly.

use crate::config::MAX_SCRIPT_COMMANDS;
use crate::{ChaseError, ChaseResult, Direction};
use serde::{Deserialize, Serialize};

/// Something the player can do during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Queue a turn
    Press(Direction),
    /// Keep a direction held down
    Hold(Direction),
    /// Let go of the held direction
    Release,
    /// Do nothing this tick
    Wait,
    /// Answer the goal question
    Answer(bool),
    /// Start the level over
    Restart,
}

impl PlayerCommand {
    /// Maps one script character to a command.
    ///
    /// Lowercase `w a s d` press, uppercase `W A S D` hold.
    pub fn from_char(ch: char) -> Option<Self> {
        let direction = match ch.to_ascii_lowercase() {
            'w' => Some(Direction::Up),
            'a' => Some(Direction::Left),
            's' => Some(Direction::Down),
            'd' => Some(Direction::Right),
            _ => None,
        };
        if let Some(direction) = direction {
            return Some(if ch.is_ascii_uppercase() {
                PlayerCommand::Hold(direction)
            } else {
                PlayerCommand::Press(direction)
            });
        }

        match ch {
            '.' => Some(PlayerCommand::Wait),
            '-' => Some(PlayerCommand::Release),
            'y' => Some(PlayerCommand::Answer(true)),
            'n' => Some(PlayerCommand::Answer(false)),
            'r' => Some(PlayerCommand::Restart),
            _ => None,
        }
    }
}

/// Parses a command script into one command per tick.
///
/// # Examples
///
/// ```
/// use tilechase::{parse_script, Direction, PlayerCommand};
///
/// let commands = parse_script("d 2. y").unwrap();
/// assert_eq!(
///     commands,
///     vec![
///         PlayerCommand::Press(Direction::Right),
///         PlayerCommand::Wait,
///         PlayerCommand::Wait,
///         PlayerCommand::Answer(true),
///     ]
/// );
/// ```
pub fn parse_script(script: &str) -> ChaseResult<Vec<PlayerCommand>> {
    let mut commands = Vec::new();
    let mut repeat: Option<usize> = None;

    for (index, ch) in script.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        if let Some(digit) = ch.to_digit(10) {
            let count = repeat.unwrap_or(0);
            repeat = Some(
                count
                    .checked_mul(10)
                    .and_then(|count| count.checked_add(digit as usize))
                    .ok_or_else(|| {
                        ChaseError::InvalidCommand(format!("repeat count too large at {}", index))
                    })?,
            );
            continue;
        }
        let command = PlayerCommand::from_char(ch).ok_or_else(|| {
            ChaseError::InvalidCommand(format!("unknown command '{}' at {}", ch, index))
        })?;
        let count = repeat.take().unwrap_or(1);
        if count > MAX_SCRIPT_COMMANDS - commands.len() {
            return Err(ChaseError::InvalidCommand(format!(
                "script longer than {} commands at {}",
                MAX_SCRIPT_COMMANDS, index
            )));
        }
        commands.extend(std::iter::repeat(command).take(count));
    }

    if repeat.is_some() {
        return Err(ChaseError::InvalidCommand(
            "script ends with a repeat count but no command".to_string(),
        ));
    }
    Ok(commands)
}
