//! WebSocket protocol messages.

use serde::{Deserialize, Serialize};
use tictactoe_core::{GameEvent, GameMode, GameSnapshot, MoveRejection};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Start a new round; `keep_scores: false` is a full reset
    NewRound { keep_scores: bool },

    /// Switch between two-player and vs-computer
    SetMode { mode: GameMode },

    /// Place a mark for the side due to move
    SubmitMove { index: usize },

    /// Request the current state
    GetState,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Sent once per connection
    Welcome { session_id: Uuid, state: GameSnapshot },

    /// Current game state
    State { state: GameSnapshot },

    /// Something happened in the game
    Event { event: GameEvent },

    /// A move was refused
    MoveRejected { index: usize, reason: MoveRejection },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
