//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{GameSession, SessionError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tictactoe_core::{GameSnapshot, OpponentTurn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    pub config: ServerConfig,
    /// One game per connection
    pub sessions: DashMap<Uuid, GameSession>,
    /// Mapping from session ID to the connection's message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            senders: DashMap::new(),
        }
    }

    /// Register a new game and return its outgoing message stream.
    pub fn open_session(&self, session_id: Uuid) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
        let session = GameSession::new(
            session_id,
            self.config.default_mode,
            self.config.thinking_delay,
            tx.clone(),
        );
        self.sessions.insert(session_id, session);
        self.senders.insert(session_id, tx);
        rx
    }

    /// Drop a game; aborts its pending opponent task, if any.
    pub fn close_session(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
        self.senders.remove(&session_id);
    }

    /// Send a message to a session's client.
    pub fn send_to(&self, session_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&session_id) {
            let _ = sender.send(msg);
        }
    }

    /// Run `f` against a session.
    pub fn with_session<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut GameSession) -> T,
    ) -> Result<T, SessionError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound)?;
        Ok(f(&mut session))
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tic-tac-toe server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let session_id = Uuid::new_v4();
    let mut rx = state.open_session(session_id);

    // Send welcome message
    let snapshot = state.with_session(session_id, |s| s.snapshot())?;
    let welcome = ServerMessage::Welcome {
        session_id,
        state: snapshot,
    };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(session_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", session_id, text);
                    state.send_to(
                        session_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", session_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to(session_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.close_session(session_id);
    send_task.abort();

    info!("Connection closed for {}", session_id);
    Ok(())
}

/// Handle a client message.
pub fn handle_message(session_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    let result = match msg {
        ClientMessage::SubmitMove { index } => {
            let submitted = state
                .with_session(session_id, |session| -> Result<GameSnapshot, SessionError> {
                    if let Some(turn) = session.submit_move(index)? {
                        let task = spawn_opponent_turn(state, session_id, turn);
                        session.set_opponent_task(task);
                    }
                    Ok(session.snapshot())
                })
                .and_then(|inner| inner);

            if let Err(SessionError::Rejected(reason)) = submitted {
                debug!(%session_id, index, ?reason, "move rejected");
                state.send_to(session_id, ServerMessage::MoveRejected { index, reason });
                return;
            }
            submitted
        }

        ClientMessage::NewRound { keep_scores } => state.with_session(session_id, |session| {
            session.new_round(keep_scores);
            session.snapshot()
        }),

        ClientMessage::SetMode { mode } => state.with_session(session_id, |session| {
            session.set_mode(mode);
            session.snapshot()
        }),

        ClientMessage::GetState => state.with_session(session_id, |session| session.snapshot()),

        ClientMessage::Ping => {
            state.send_to(session_id, ServerMessage::Pong);
            return;
        }
    };

    match result {
        Ok(snapshot) => state.send_to(session_id, ServerMessage::State { state: snapshot }),
        Err(e) => state.send_to(
            session_id,
            ServerMessage::Error {
                message: e.to_string(),
            },
        ),
    }
}

/// Wait out the thinking delay, then let the computer move.
fn spawn_opponent_turn(
    state: &Arc<ServerState>,
    session_id: Uuid,
    turn: OpponentTurn,
) -> tokio::task::JoinHandle<()> {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(turn.delay()).await;

        let played = state.with_session(session_id, |session| {
            session
                .finish_opponent_turn(turn)
                .map(|result| result.map(|_| session.snapshot()))
        });

        match played {
            Ok(Some(Ok(snapshot))) => {
                state.send_to(session_id, ServerMessage::State { state: snapshot });
            }
            Ok(Some(Err(reason))) => {
                warn!(%session_id, ?reason, "opponent move refused");
            }
            Ok(None) => debug!(%session_id, ticket = turn.ticket, "opponent turn was cancelled"),
            Err(_) => debug!(%session_id, "session closed before opponent moved"),
        }
    })
}
