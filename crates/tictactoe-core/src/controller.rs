//! Turn controller.
//!
//! Wraps a [`Session`] and drives the alternation between the two sides,
//! including the computer opponent in [`GameMode::VsComputer`]. Hosts feed it
//! human input through [`TurnController::submit_move`] and observe the results
//! through event listeners.
//!
//! The opponent's thinking delay is owned by the host. After a human move the
//! controller issues an [`OpponentTurn`] ticket and refuses further input until
//! the host redeems it with [`TurnController::play_opponent_move`]. Starting a
//! new round or switching mode invalidates any outstanding ticket.

use crate::actions::GameEvent;
use crate::board::{Board, Mark, Outcome, CELL_COUNT};
use crate::bot::Bot;
use crate::game::{GameMode, MoveRejection, Scores, Session};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Callback invoked for every event, in registration order
pub type EventListener = Box<dyn FnMut(&GameEvent) + Send + Sync>;

/// A scheduled computer move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentTurn {
    /// Unique per issued turn; stale tickets are ignored
    pub ticket: u64,
    /// Side the computer plays
    pub mark: Mark,
    /// How long the host should wait before redeeming the ticket
    pub delay_ms: u64,
}

impl OpponentTurn {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Read-only copy of the game for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: [Option<Mark>; CELL_COUNT],
    pub current_turn: Mark,
    pub game_over: bool,
    pub scores: Scores,
    pub mode: GameMode,
    /// True while waiting for the computer to move
    pub busy: bool,
    pub outcome: Outcome,
}

/// Drives one game
pub struct TurnController {
    session: Session,
    bot: Bot,
    next_ticket: u64,
    pending: Option<OpponentTurn>,
    listeners: Vec<EventListener>,
}

impl TurnController {
    /// Create a controller with a freshly seeded opponent
    pub fn new(mode: GameMode) -> Self {
        Self::with_bot(mode, Bot::default())
    }

    /// Create a controller with a specific opponent (e.g. a seeded one)
    pub fn with_bot(mode: GameMode, bot: Bot) -> Self {
        Self {
            session: Session::new(mode),
            bot,
            next_ticket: 0,
            pending: None,
            listeners: Vec::new(),
        }
    }

    /// Register an event listener
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // ==================== Accessors ====================

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn board(&self) -> &Board {
        &self.session.board
    }

    pub fn current_turn(&self) -> Mark {
        self.session.current_turn
    }

    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    pub fn scores(&self) -> Scores {
        self.session.scores
    }

    pub fn mode(&self) -> GameMode {
        self.session.mode
    }

    /// Whether input is blocked by a pending computer move
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// The computer move waiting to be played, if any
    pub fn pending_opponent_turn(&self) -> Option<OpponentTurn> {
        self.pending
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: *self.session.board.cells(),
            current_turn: self.session.current_turn,
            game_over: self.session.game_over,
            scores: self.session.scores,
            mode: self.session.mode,
            busy: self.is_busy(),
            outcome: self.session.outcome(),
        }
    }

    // ==================== Round management ====================

    /// Start a new round. `keep_scores = false` is a full reset.
    pub fn new_round(&mut self, keep_scores: bool) {
        self.cancel_pending();
        self.session.new_round(keep_scores);
        debug!(keep_scores, "new round");

        self.emit(&GameEvent::RoundStarted {
            mode: self.session.mode,
            scores: self.session.scores,
            scores_cleared: !keep_scores,
        });
    }

    /// Switch mode; starts a new round and keeps the score
    pub fn set_mode(&mut self, mode: GameMode) {
        self.cancel_pending();
        self.session.set_mode(mode);
        debug!(?mode, "mode changed");

        self.emit(&GameEvent::RoundStarted {
            mode,
            scores: self.session.scores,
            scores_cleared: false,
        });
    }

    // ==================== Moves ====================

    /// Play a human move for the side due to move.
    ///
    /// In `VsComputer` mode an accepted move that leaves the round open makes
    /// the controller busy until the returned opponent turn is played.
    pub fn submit_move(&mut self, index: usize) -> Result<Outcome, MoveRejection> {
        if self.pending.is_some() {
            return Err(MoveRejection::InputBusy);
        }

        let mark = self.session.current_turn;
        let result = self.session.apply_move(index, mark)?;
        debug!(index, %mark, outcome = ?result.outcome, "move accepted");
        self.emit(&result.event);

        if self.session.mode == GameMode::VsComputer && !result.outcome.is_terminal() {
            self.schedule_opponent();
        }

        Ok(result.outcome)
    }

    /// Redeem an opponent ticket.
    ///
    /// Returns `None` without touching the game if the ticket is no longer the
    /// pending one (the round was reset, the mode changed, or it was already
    /// played). Only the ticket number is read from `turn`; the side to play
    /// comes from the ticket the controller issued.
    pub fn play_opponent_move(
        &mut self,
        turn: OpponentTurn,
    ) -> Option<Result<Outcome, MoveRejection>> {
        let turn = match self.pending {
            Some(pending) if pending.ticket == turn.ticket => {
                self.pending = None;
                pending
            }
            _ => {
                debug!(ticket = turn.ticket, "discarding stale opponent turn");
                return None;
            }
        };

        let index = match self.bot.choose_move(&self.session.board, turn.mark) {
            Some(index) => index,
            None => return Some(Err(MoveRejection::GameAlreadyOver)),
        };

        let result = match self.session.apply_move(index, turn.mark) {
            Ok(result) => result,
            Err(e) => return Some(Err(e)),
        };
        debug!(index, mark = %turn.mark, outcome = ?result.outcome, "opponent moved");
        self.emit(&result.event);

        Some(Ok(result.outcome))
    }

    /// Play the pending opponent move right away, skipping the delay
    pub fn play_pending_now(&mut self) -> Option<Result<Outcome, MoveRejection>> {
        let turn = self.pending?;
        self.play_opponent_move(turn)
    }

    fn schedule_opponent(&mut self) {
        let delay = self.bot.thinking_delay();
        self.next_ticket += 1;

        let turn = OpponentTurn {
            ticket: self.next_ticket,
            mark: self.session.current_turn,
            delay_ms: delay.as_millis() as u64,
        };
        self.pending = Some(turn);

        self.emit(&GameEvent::OpponentThinking {
            mark: turn.mark,
            delay_ms: turn.delay_ms,
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(turn) = self.pending.take() {
            debug!(ticket = turn.ticket, "cancelled pending opponent turn");
        }
    }

    fn emit(&mut self, event: &GameEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ThinkingDelay;
    use std::sync::{Arc, Mutex};

    fn seeded(mode: GameMode) -> TurnController {
        TurnController::with_bot(mode, Bot::with_seed(ThinkingDelay::default(), 42))
    }

    fn recorder(controller: &mut TurnController) -> Arc<Mutex<Vec<GameEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        controller.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    #[test]
    fn test_two_player_never_schedules_opponent() {
        let mut controller = seeded(GameMode::TwoPlayer);
        controller.submit_move(0).unwrap();
        assert!(!controller.is_busy());
        assert_eq!(controller.current_turn(), Mark::X);
        controller.submit_move(4).unwrap();
        assert_eq!(controller.current_turn(), Mark::O);
    }

    #[test]
    fn test_vs_computer_blocks_input_until_opponent_moves() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(0).unwrap();

        let turn = controller.pending_opponent_turn().unwrap();
        assert_eq!(turn.mark, Mark::X);
        assert!(turn.delay() >= Duration::from_millis(380));
        assert_eq!(controller.submit_move(1), Err(MoveRejection::InputBusy));

        let outcome = controller.play_opponent_move(turn).unwrap().unwrap();
        assert_eq!(outcome, Outcome::Ongoing);
        // Center is the only sensible reply to a corner opening
        assert_eq!(controller.board().get(4), Some(Mark::X));
        assert!(!controller.is_busy());
        assert_eq!(controller.current_turn(), Mark::O);
    }

    #[test]
    fn test_ticket_cannot_be_redeemed_twice() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(0).unwrap();
        let turn = controller.pending_opponent_turn().unwrap();

        assert!(controller.play_opponent_move(turn).is_some());
        controller.submit_move(8).unwrap();
        assert!(controller.play_opponent_move(turn).is_none());
        assert!(controller.is_busy());
    }

    #[test]
    fn test_forged_mark_plays_issued_side() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(0).unwrap();
        let issued = controller.pending_opponent_turn().unwrap();
        let forged = OpponentTurn {
            mark: Mark::O,
            ..issued
        };

        let outcome = controller.play_opponent_move(forged).unwrap().unwrap();
        assert_eq!(outcome, Outcome::Ongoing);
        assert_eq!(controller.board().get(4), Some(Mark::X));
        assert_eq!(controller.board().count(Mark::O), 1);
        assert_eq!(controller.current_turn(), Mark::O);

        // The human still plays O
        controller.submit_move(8).unwrap();
        assert_eq!(controller.board().get(8), Some(Mark::O));
    }

    #[test]
    fn test_wrong_ticket_keeps_pending_turn() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(0).unwrap();
        let issued = controller.pending_opponent_turn().unwrap();

        let wrong = OpponentTurn {
            ticket: issued.ticket + 1,
            ..issued
        };
        assert!(controller.play_opponent_move(wrong).is_none());
        assert_eq!(controller.pending_opponent_turn(), Some(issued));
        assert_eq!(controller.submit_move(4), Err(MoveRejection::InputBusy));
    }

    #[test]
    fn test_new_round_cancels_pending_opponent() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(0).unwrap();
        let turn = controller.pending_opponent_turn().unwrap();

        controller.new_round(true);
        assert!(!controller.is_busy());
        assert!(controller.play_opponent_move(turn).is_none());
        assert_eq!(*controller.board(), Board::new());
    }

    #[test]
    fn test_mode_switch_cancels_pending_opponent() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(4).unwrap();
        let turn = controller.pending_opponent_turn().unwrap();

        controller.set_mode(GameMode::TwoPlayer);
        assert!(controller.play_opponent_move(turn).is_none());
        assert_eq!(controller.mode(), GameMode::TwoPlayer);
        assert!(controller.board().empty_cells().len() == 9);
    }

    #[test]
    fn test_events_delivered_to_listeners() {
        let mut controller = seeded(GameMode::VsComputer);
        let events = recorder(&mut controller);

        controller.submit_move(0).unwrap();
        controller.play_pending_now().unwrap().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], GameEvent::MoveAccepted { index: 0, mark: Mark::O });
        assert!(matches!(events[1], GameEvent::OpponentThinking { mark: Mark::X, .. }));
        assert_eq!(events[2], GameEvent::MoveAccepted { index: 4, mark: Mark::X });
    }

    #[test]
    fn test_rejected_move_emits_nothing() {
        let mut controller = seeded(GameMode::TwoPlayer);
        let events = recorder(&mut controller);
        controller.submit_move(0).unwrap();
        assert_eq!(controller.submit_move(0), Err(MoveRejection::CellOccupied));
        assert_eq!(controller.submit_move(12), Err(MoveRejection::IndexOutOfRange));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_full_reset_clears_scores() {
        let mut controller = seeded(GameMode::TwoPlayer);
        let events = recorder(&mut controller);
        for index in [0, 4, 1, 3, 2] {
            controller.submit_move(index).unwrap();
        }
        assert_eq!(controller.scores().o, 1);

        controller.new_round(true);
        assert_eq!(controller.scores().o, 1);
        controller.new_round(false);
        assert_eq!(controller.scores(), Scores::default());

        let events = events.lock().unwrap();
        assert_eq!(
            events.last(),
            Some(&GameEvent::RoundStarted {
                mode: GameMode::TwoPlayer,
                scores: Scores::default(),
                scores_cleared: true,
            })
        );
    }

    #[test]
    fn test_winning_human_move_does_not_schedule_opponent() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.session.board = crate::board::parse_board("OO.XX....").unwrap();

        let outcome = controller.submit_move(2).unwrap();
        assert_eq!(outcome.winner(), Some(Mark::O));
        assert!(!controller.is_busy());
        assert_eq!(controller.submit_move(5), Err(MoveRejection::GameAlreadyOver));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut controller = seeded(GameMode::VsComputer);
        controller.submit_move(8).unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.board[8], Some(Mark::O));
        assert!(snapshot.busy);
        assert_eq!(snapshot.current_turn, Mark::X);
        assert_eq!(snapshot.outcome, Outcome::Ongoing);
    }
}
