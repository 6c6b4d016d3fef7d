//! Events produced by the engine.
//!
//! The presentation layer (rendering, sound, win-line overlay) observes
//! these instead of reading engine internals.

use crate::board::{Mark, WinPattern};
use crate::game::{GameMode, Scores};
use serde::{Deserialize, Serialize};

/// Something that happened in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// A move was placed and the round goes on
    MoveAccepted { index: usize, mark: Mark },

    /// A move completed a pattern
    Won {
        mark: Mark,
        pattern: WinPattern,
        /// The cell that completed the pattern
        index: usize,
    },

    /// A move filled the last cell without a winner
    Draw { mark: Mark, index: usize },

    /// The computer opponent is about to move
    OpponentThinking { mark: Mark, delay_ms: u64 },

    /// A fresh round began
    RoundStarted {
        mode: GameMode,
        scores: Scores,
        /// Whether the scores were zeroed
        scores_cleared: bool,
    },
}

impl GameEvent {
    /// Whether this event ends the round
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::Won { .. } | GameEvent::Draw { .. })
    }

    /// The cell a placement event refers to
    pub fn placed_index(&self) -> Option<usize> {
        match self {
            GameEvent::MoveAccepted { index, .. }
            | GameEvent::Won { index, .. }
            | GameEvent::Draw { index, .. } => Some(*index),
            _ => None,
        }
    }
}
