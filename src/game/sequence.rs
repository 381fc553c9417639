//! # Timed Sequences
//!
//! A cinematic is a list of `(delay, cue)` steps. Delays are relative to the
//! previous step; the session reacts to cues as [`Sequence::tick`] fires them.

use std::collections::VecDeque;

/// Ordered timed cues.
///
/// # Examples
///
/// ```
/// use tilechase::Sequence;
///
/// let mut intro = Sequence::new().then(0.0, "lock").then(2.0, "unlock");
/// assert_eq!(intro.tick(0.5), vec!["lock"]);
/// assert!(intro.tick(1.0).is_empty());
/// assert_eq!(intro.tick(0.5), vec!["unlock"]);
/// assert!(intro.is_finished());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<C> {
    steps: VecDeque<(f32, C)>,
    elapsed: f32,
}

impl<C> Default for Sequence<C> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
            elapsed: 0.0,
        }
    }
}

impl<C> Sequence<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cue firing `delay` seconds after the previous one.
    pub fn then(mut self, delay: f32, cue: C) -> Self {
        self.push(delay, cue);
        self
    }

    pub fn push(&mut self, delay: f32, cue: C) {
        self.steps.push_back((delay.max(0.0), cue));
    }

    /// Advances time and returns every cue that came due, in order.
    pub fn tick(&mut self, dt: f32) -> Vec<C> {
        self.elapsed += dt.max(0.0);
        let mut fired = Vec::new();
        while let Some((delay, _)) = self.steps.front() {
            if *delay > self.elapsed {
                break;
            }
            self.elapsed -= *delay;
            if let Some((_, cue)) = self.steps.pop_front() {
                fired.push(cue);
            }
        }
        if self.steps.is_empty() {
            self.elapsed = 0.0;
        }
        fired
    }

    /// Drops every pending cue.
    pub fn cancel(&mut self) {
        self.steps.clear();
        self.elapsed = 0.0;
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cues still waiting to fire.
    pub fn pending(&self) -> usize {
        self.steps.len()
    }
}
