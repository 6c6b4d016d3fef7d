//! WebAssembly bindings for the tic-tac-toe engine.
//!
//! The browser page owns rendering, sound and the opponent's delay timer.
//! It calls `submitMove`, schedules `playOpponentMove` with the returned
//! ticket, and drains events with `takeEvents` after each call.

use crate::actions::GameEvent;
use crate::controller::{OpponentTurn, TurnController};
use crate::game::GameMode;
use std::sync::{Arc, Mutex};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn parse_mode(mode: &str) -> Result<GameMode, JsValue> {
    match mode {
        "pvp" | "two_player" => Ok(GameMode::TwoPlayer),
        "pve" | "vs_computer" => Ok(GameMode::VsComputer),
        other => Err(JsValue::from_str(&format!("Unknown mode: {}", other))),
    }
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    controller: TurnController,
    events: Arc<Mutex<Vec<GameEvent>>>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game; `mode` is `"pvp"` or `"pve"`
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str) -> Result<WasmGame, JsValue> {
        let mut controller = TurnController::new(parse_mode(mode)?);
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&events);
        controller.subscribe(move |event| {
            if let Ok(mut queue) = sink.lock() {
                queue.push(event.clone());
            }
        });

        Ok(WasmGame { controller, events })
    }

    /// Get the current game snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.controller.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Drain events emitted since the last call, as a JSON array
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&self) -> String {
        let drained: Vec<GameEvent> = match self.events.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        serde_json::to_string(&drained).unwrap_or_else(|_| "[]".to_string())
    }

    /// Start a new round; `keepScores = false` is a full reset
    #[wasm_bindgen(js_name = newRound)]
    pub fn new_round(&mut self, keep_scores: bool) {
        self.controller.new_round(keep_scores);
    }

    /// Switch between `"pvp"` and `"pve"`
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        self.controller.set_mode(parse_mode(mode)?);
        Ok(())
    }

    /// Play a human move. Returns the outcome JSON or throws the rejection.
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, index: usize) -> Result<String, JsValue> {
        match self.controller.submit_move(index) {
            Ok(outcome) => {
                Ok(serde_json::to_string(&outcome).unwrap_or_else(|_| "null".to_string()))
            }
            Err(e) => Err(JsValue::from_str(&format!("{:?}", e))),
        }
    }

    /// The pending opponent ticket as JSON, or `null`
    #[wasm_bindgen(js_name = getPendingOpponentTurn)]
    pub fn get_pending_opponent_turn(&self) -> String {
        serde_json::to_string(&self.controller.pending_opponent_turn())
            .unwrap_or_else(|_| "null".to_string())
    }

    /// Redeem an opponent ticket. Returns `false` if it was stale.
    #[wasm_bindgen(js_name = playOpponentMove)]
    pub fn play_opponent_move(&mut self, turn_json: &str) -> Result<bool, JsValue> {
        let turn: OpponentTurn = serde_json::from_str(turn_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid ticket JSON: {}", e)))?;

        match self.controller.play_opponent_move(turn) {
            None => Ok(false),
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(JsValue::from_str(&format!("{:?}", e))),
        }
    }

    /// Check if the round is over
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.controller.is_game_over()
    }

    /// Whether input is blocked while the computer thinks
    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }
}
