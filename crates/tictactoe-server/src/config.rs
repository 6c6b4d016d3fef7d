//! Server configuration read from the environment.

use anyhow::{bail, Context};
use std::net::SocketAddr;
use tictactoe_core::{GameMode, ThinkingDelay};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Upper bound for either delay setting
const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `THINKING_DELAY_MS` and `THINKING_JITTER_MS`
    pub thinking_delay: ThinkingDelay,
    /// `GAME_MODE`: mode new connections start in
    pub default_mode: GameMode,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR must be a socket address")?;

        let defaults = ThinkingDelay::default();
        let base_ms = parse_millis(&lookup, "THINKING_DELAY_MS", defaults.base_ms)?;
        let jitter_ms = parse_millis(&lookup, "THINKING_JITTER_MS", defaults.jitter_ms)?;

        let default_mode = match lookup("GAME_MODE").as_deref() {
            None | Some("two_player") | Some("pvp") => GameMode::TwoPlayer,
            Some("vs_computer") | Some("pve") => GameMode::VsComputer,
            Some(other) => bail!("GAME_MODE must be two_player or vs_computer, got {}", other),
        };

        Ok(Self {
            addr,
            thinking_delay: ThinkingDelay::new(base_ms, jitter_ms),
            default_mode,
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let millis = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number of milliseconds", key))?,
        None => default,
    };

    if millis > MAX_DELAY_MS {
        bail!("{} must be at most {} ms, got {}", key, MAX_DELAY_MS, millis);
    }
    Ok(millis)
}
