//! Per-connection game sessions.

use thiserror::Error;
use tictactoe_core::{
    Bot, GameMode, GameSnapshot, MoveRejection, OpponentTurn, Outcome, ThinkingDelay,
    TurnController,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::protocol::ServerMessage;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error(transparent)]
    Rejected(#[from] MoveRejection),
}

/// One client's game.
///
/// Engine events are forwarded to the client's outbox as they happen. The
/// task that will play the computer's move, if any, is held here so that a
/// reset can abort it.
pub struct GameSession {
    pub id: Uuid,
    controller: TurnController,
    opponent_task: Option<JoinHandle<()>>,
}

impl GameSession {
    pub fn new(
        id: Uuid,
        mode: GameMode,
        delay: ThinkingDelay,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self::with_controller(id, TurnController::with_bot(mode, Bot::new(delay)), outbox)
    }

    pub fn with_controller(
        id: Uuid,
        mut controller: TurnController,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        controller.subscribe(move |event| {
            let _ = outbox.send(ServerMessage::Event {
                event: event.clone(),
            });
        });

        Self {
            id,
            controller,
            opponent_task: None,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.controller.snapshot()
    }

    /// Play a human move. Returns the opponent turn to schedule, if any.
    pub fn submit_move(&mut self, index: usize) -> Result<Option<OpponentTurn>, SessionError> {
        self.controller.submit_move(index)?;
        Ok(self.controller.pending_opponent_turn())
    }

    pub fn new_round(&mut self, keep_scores: bool) {
        self.cancel_opponent_task();
        self.controller.new_round(keep_scores);
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.cancel_opponent_task();
        self.controller.set_mode(mode);
    }

    /// Remember the task that will redeem the pending opponent turn
    pub fn set_opponent_task(&mut self, task: JoinHandle<()>) {
        self.cancel_opponent_task();
        self.opponent_task = Some(task);
    }

    /// Called by the opponent task once its delay has elapsed
    pub fn finish_opponent_turn(
        &mut self,
        turn: OpponentTurn,
    ) -> Option<Result<Outcome, MoveRejection>> {
        let result = self.controller.play_opponent_move(turn);
        if result.is_some() {
            // The running task is the caller; drop the handle without aborting it
            self.opponent_task = None;
        }
        result
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    fn cancel_opponent_task(&mut self) {
        if let Some(task) = self.opponent_task.take() {
            task.abort();
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.cancel_opponent_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tictactoe_core::{GameEvent, Mark};

    fn session(mode: GameMode) -> (GameSession, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller =
            TurnController::with_bot(mode, Bot::with_seed(ThinkingDelay::NONE, 3));
        (GameSession::with_controller(Uuid::new_v4(), controller, tx), rx)
    }

    fn drain_events(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::Event { event } = msg {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_two_player_session_forwards_events() {
        let (mut session, mut rx) = session(GameMode::TwoPlayer);

        assert_eq!(session.submit_move(4).unwrap(), None);
        let events = drain_events(&mut rx);
        assert_eq!(events, vec![GameEvent::MoveAccepted { index: 4, mark: Mark::O }]);
    }

    #[test]
    fn test_rejection_surfaces_reason() {
        let (mut session, _rx) = session(GameMode::TwoPlayer);
        session.submit_move(4).unwrap();

        let err = session.submit_move(4).unwrap_err();
        assert!(matches!(err, SessionError::Rejected(MoveRejection::CellOccupied)));
    }

    #[test]
    fn test_vs_computer_returns_turn_to_schedule() {
        let (mut session, mut rx) = session(GameMode::VsComputer);

        let turn = session.submit_move(0).unwrap().unwrap();
        assert_eq!(turn.mark, Mark::X);
        assert!(session.is_busy());

        let outcome = session.finish_opponent_turn(turn).unwrap().unwrap();
        assert_eq!(outcome, Outcome::Ongoing);
        assert!(!session.is_busy());

        let events = drain_events(&mut rx);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], GameEvent::MoveAccepted { index: 4, mark: Mark::X });
    }

    #[test]
    fn test_reset_discards_pending_turn() {
        let (mut session, _rx) = session(GameMode::VsComputer);
        let turn = session.submit_move(0).unwrap().unwrap();

        session.new_round(false);
        assert!(session.finish_opponent_turn(turn).is_none());
        assert_eq!(session.snapshot().board, [None::<Mark>; 9]);
    }

    /// A long sleeper that reports through the returned receiver if it ever
    /// wakes up. The receiver closes without a message once it is aborted.
    fn sentinel_task() -> (JoinHandle<()>, mpsc::UnboundedReceiver<()>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = done_tx.send(());
        });
        (task, done_rx)
    }

    #[tokio::test]
    async fn test_drop_aborts_opponent_task() {
        let (mut session, _rx) = session(GameMode::VsComputer);
        let (task, mut done_rx) = sentinel_task();
        session.set_opponent_task(task);

        drop(session);
        let woke = tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .expect("task was not aborted");
        assert_eq!(woke, None);
    }

    #[tokio::test]
    async fn test_new_round_aborts_opponent_task() {
        let (mut session, _rx) = session(GameMode::VsComputer);
        let (task, mut done_rx) = sentinel_task();
        session.set_opponent_task(task);

        session.new_round(true);
        let woke = tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .expect("task was not aborted");
        assert_eq!(woke, None);
    }
}
