//! Board representation and outcome evaluation.
//!
//! This module contains:
//! - The two marks a cell can hold
//! - The fixed 3x3 board, indexed 0-8 in row-major order
//! - The eight winning index triples
//! - The pure win/draw evaluator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on the board
pub const CELL_COUNT: usize = 9;

/// Index of the center cell
pub const CENTER: usize = 4;

/// Corner cell indices
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// A side in the game.
///
/// `X` is the first side and `O` the second; an empty cell is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other side
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Single-character label
    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Three cell indices that win the game when they hold the same mark.
pub type WinPattern = [usize; 3];

/// All winning patterns in scan order: rows, then columns, then diagonals.
///
/// When a move completes two patterns at once, the first one in this order
/// is the one reported.
pub const WIN_PATTERNS: [WinPattern; 8] = [
    // rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of evaluating a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// No winner yet and at least one empty cell
    Ongoing,
    /// A pattern is filled with one mark
    Won { mark: Mark, pattern: WinPattern },
    /// Every cell is filled and no pattern is complete
    Draw,
}

impl Outcome {
    /// Whether the round has ended
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }

    /// The winning mark, if any
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Won { mark, .. } => Some(*mark),
            _ => None,
        }
    }
}

/// The 3x3 playing grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from raw cells
    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    /// Content of a cell, or `None` if it is empty or out of range
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Whether `index` is on the board and empty
    pub fn is_empty_cell(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    /// Place a mark. Callers validate the index and occupancy first.
    pub(crate) fn set(&mut self, index: usize, mark: Mark) {
        self.cells[index] = Some(mark);
    }

    /// Clear every cell
    pub fn clear(&mut self) {
        self.cells = [None; CELL_COUNT];
    }

    /// Indices of all empty cells, ascending
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether every cell is filled
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of cells holding `mark`
    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|c| **c == Some(mark)).count()
    }

    /// Evaluate the board. See [`evaluate`].
    pub fn outcome(&self) -> Outcome {
        evaluate(self)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(3) {
            let line: String = row
                .iter()
                .map(|c| c.map_or('.', Mark::symbol))
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Evaluate a board.
///
/// Returns the first complete pattern in [`WIN_PATTERNS`] order, then `Draw`
/// for a full board, otherwise `Ongoing`.
pub fn evaluate(board: &Board) -> Outcome {
    for pattern in WIN_PATTERNS {
        let [a, b, c] = pattern;
        if let Some(mark) = board.cells[a] {
            if board.cells[b] == Some(mark) && board.cells[c] == Some(mark) {
                return Outcome::Won { mark, pattern };
            }
        }
    }

    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Ongoing
    }
}

/// Parse a board from a 9-character string of `X`, `O` and `.`/`_`/space.
///
/// Handy for tests and debugging tools.
pub fn parse_board(s: &str) -> Option<Board> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace() || *c == ' ').collect();
    if chars.len() != CELL_COUNT {
        return None;
    }

    let mut cells = [None; CELL_COUNT];
    for (cell, ch) in cells.iter_mut().zip(chars) {
        *cell = match ch {
            'X' | 'x' => Some(Mark::X),
            'O' | 'o' => Some(Mark::O),
            '.' | '_' | ' ' => None,
            _ => return None,
        };
    }
    Some(Board::from_cells(cells))
}
