//! Computer opponent.
//!
//! The opponent follows a fixed priority list with no lookahead:
//! win now, block, center, a random corner, then any random cell.
//! It is beatable on purpose.

use crate::board::{Board, Mark, CENTER, CORNERS, WIN_PATTERNS};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the opponent "thinks" before moving.
///
/// The actual delay is `base_ms` plus a uniform draw from `0..jitter_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingDelay {
    pub base_ms: u64,
    pub jitter_ms: u64,
}

impl ThinkingDelay {
    /// No delay at all
    pub const NONE: ThinkingDelay = ThinkingDelay {
        base_ms: 0,
        jitter_ms: 0,
    };

    pub fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self { base_ms, jitter_ms }
    }

    /// Draw a delay. Saturates at `u64::MAX` milliseconds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..self.jitter_ms)
        };
        Duration::from_millis(self.base_ms.saturating_add(jitter))
    }
}

impl Default for ThinkingDelay {
    fn default() -> Self {
        Self::new(380, 260)
    }
}

/// Choose the next cell for `my_side`.
///
/// Returns `None` only when the board is full.
pub fn choose_move<R: Rng + ?Sized>(board: &Board, my_side: Mark, rng: &mut R) -> Option<usize> {
    // 1. Can we win right now?
    if let Some(index) = find_winning_cell(board, my_side) {
        return Some(index);
    }

    // 2. Block the opponent
    if let Some(index) = find_winning_cell(board, my_side.opponent()) {
        return Some(index);
    }

    // 3. Center
    if board.is_empty_cell(CENTER) {
        return Some(CENTER);
    }

    // 4. A random free corner
    let corners: Vec<usize> = CORNERS
        .iter()
        .copied()
        .filter(|&i| board.is_empty_cell(i))
        .collect();
    if let Some(&corner) = corners.choose(rng) {
        return Some(corner);
    }

    // 5. Whatever is left
    board.empty_cells().choose(rng).copied()
}

/// Find the empty cell that completes a pattern for `mark`.
///
/// Patterns are scanned in canonical order and the first match wins.
pub fn find_winning_cell(board: &Board, mark: Mark) -> Option<usize> {
    WIN_PATTERNS.iter().find_map(|pattern| {
        let owned = pattern.iter().filter(|&&i| board.get(i) == Some(mark)).count();
        let empty: Vec<usize> = pattern
            .iter()
            .copied()
            .filter(|&i| board.is_empty_cell(i))
            .collect();

        if owned == 2 && empty.len() == 1 {
            Some(empty[0])
        } else {
            None
        }
    })
}

/// A computer player with its own random source.
pub struct Bot {
    pub delay: ThinkingDelay,
    rng: StdRng,
}

impl Bot {
    pub fn new(delay: ThinkingDelay) -> Self {
        Self {
            delay,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(delay: ThinkingDelay, seed: u64) -> Self {
        Self {
            delay,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a cell for `side` on `board`
    pub fn choose_move(&mut self, board: &Board, side: Mark) -> Option<usize> {
        choose_move(board, side, &mut self.rng)
    }

    /// Draw the pause before the next move
    pub fn thinking_delay(&mut self) -> Duration {
        self.delay.sample(&mut self.rng)
    }
}

impl Default for Bot {
    fn default() -> Self {
        Self::new(ThinkingDelay::default())
    }
}
