//! Core game state machine.
//!
//! A [`Session`] owns the board, whose turn it is, the game-over flag, the
//! running score and the mode. All mutation goes through
//! [`Session::apply_move`], [`Session::new_round`] and [`Session::set_mode`].

use crate::actions::GameEvent;
use crate::board::{evaluate, Board, Mark, Outcome, CELL_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The side that opens every round.
///
/// `O` always moves first in every mode, whoever is at the keyboard.
pub const FIRST_TO_MOVE: Mark = Mark::O;

/// Who is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Two people share the board
    #[default]
    TwoPlayer,
    /// One person against the computer
    VsComputer,
}

/// Reasons a move is refused. A refused move never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MoveRejection {
    #[error("Cell is already occupied")]
    CellOccupied,

    #[error("Game is already over")]
    GameAlreadyOver,

    #[error("Not your turn")]
    WrongTurn,

    #[error("Cell index out of range")]
    IndexOutOfRange,

    #[error("Waiting for the opponent to move")]
    InputBusy,
}

/// Wins per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub x: u32,
    pub o: u32,
}

impl Scores {
    pub fn get(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    fn record_win(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }
}

/// Result of an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub outcome: Outcome,
    pub event: GameEvent,
}

/// The mutable state of one running game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The game board
    pub(crate) board: Board,
    /// Side due to move
    pub(crate) current_turn: Mark,
    /// Set once the round is won or drawn
    pub(crate) game_over: bool,
    /// Running score, kept across rounds
    pub(crate) scores: Scores,
    /// Current mode
    pub(crate) mode: GameMode,
}

impl Session {
    /// Start a game in the given mode with zeroed scores
    pub fn new(mode: GameMode) -> Self {
        Self {
            board: Board::new(),
            current_turn: FIRST_TO_MOVE,
            game_over: false,
            scores: Scores::default(),
            mode,
        }
    }

    /// Resume a game from a position, with `current_turn` due to move.
    ///
    /// The round is over if the position is already won or drawn. Scores
    /// start at zero.
    pub fn from_board(mode: GameMode, board: Board, current_turn: Mark) -> Self {
        Self {
            game_over: evaluate(&board).is_terminal(),
            board,
            current_turn,
            scores: Scores::default(),
            mode,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Outcome of the current board
    pub fn outcome(&self) -> Outcome {
        evaluate(&self.board)
    }

    /// Check a move without applying it
    pub fn validate_move(&self, index: usize, mark: Mark) -> Result<(), MoveRejection> {
        if self.game_over {
            return Err(MoveRejection::GameAlreadyOver);
        }

        if index >= CELL_COUNT {
            return Err(MoveRejection::IndexOutOfRange);
        }

        if !self.board.is_empty_cell(index) {
            return Err(MoveRejection::CellOccupied);
        }

        if mark != self.current_turn {
            return Err(MoveRejection::WrongTurn);
        }

        Ok(())
    }

    /// Place `mark` at `index`.
    ///
    /// On a win the winner's score goes up and the round ends; on a draw the
    /// round ends; otherwise the turn passes to the other side.
    pub fn apply_move(&mut self, index: usize, mark: Mark) -> Result<MoveResult, MoveRejection> {
        self.validate_move(index, mark)?;

        self.board.set(index, mark);
        let outcome = evaluate(&self.board);

        let event = match outcome {
            Outcome::Won { mark, pattern } => {
                self.scores.record_win(mark);
                self.game_over = true;
                GameEvent::Won {
                    mark,
                    pattern,
                    index,
                }
            }
            Outcome::Draw => {
                self.game_over = true;
                GameEvent::Draw { mark, index }
            }
            Outcome::Ongoing => {
                self.current_turn = self.current_turn.opponent();
                GameEvent::MoveAccepted { index, mark }
            }
        };

        Ok(MoveResult { outcome, event })
    }

    /// Reset the board for another round, optionally zeroing the score
    pub fn new_round(&mut self, keep_scores: bool) {
        self.board.clear();
        self.current_turn = FIRST_TO_MOVE;
        self.game_over = false;
        if !keep_scores {
            self.scores = Scores::default();
        }
    }

    /// Switch mode. Always starts a new round and keeps the score.
    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.new_round(true);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}
