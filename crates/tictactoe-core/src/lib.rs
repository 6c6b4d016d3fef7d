//! Tic-tac-toe game engine.
//!
//! This crate provides the core game logic, including:
//! - The 3x3 board and win/draw evaluation
//! - A scripted computer opponent (win, block, center, corner, random)
//! - The session state machine with running scores
//! - A turn controller that alternates sides and schedules the opponent
//!
//! # Architecture
//!
//! The engine does no I/O and never sleeps. Hosts (the WebSocket server, or a
//! browser through the `wasm` feature) own the opponent's thinking delay and
//! render whatever events the controller emits.
//!
//! # Modules
//!
//! - [`board`]: Marks, cells, win patterns and outcome evaluation
//! - [`bot`]: Opponent move heuristic and thinking delay
//! - [`game`]: Session state machine and move rejections
//! - [`actions`]: Events observed by the presentation layer
//! - [`controller`]: Turn alternation, busy handling and listeners

pub mod actions;
pub mod board;
pub mod bot;
pub mod controller;
pub mod game;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::GameEvent;
pub use board::{evaluate, parse_board, Board, Mark, Outcome, WinPattern, CELL_COUNT, WIN_PATTERNS};
pub use bot::{choose_move, find_winning_cell, Bot, ThinkingDelay};
pub use controller::{EventListener, GameSnapshot, OpponentTurn, TurnController};
pub use game::{GameMode, MoveRejection, MoveResult, Scores, Session, FIRST_TO_MOVE};
