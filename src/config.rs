use serde::{Deserialize, Serialize};

use crate::game::constants::{ai, grid, session};

/// Simulation configuration, immutable once a run starts
///
/// Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Grid width in cells
    pub cols: u32,
    /// Grid height in cells
    pub rows: u32,
    /// Ticks per second the driver should run
    pub tick_rate: u32,
    /// Seed for the deterministic generator
    pub seed: u32,
    /// Number of AI-controlled agents
    pub ai_count: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cols: 32,
            rows: 24,
            tick_rate: 12,
            seed: 1,
            ai_count: 3,
        }
    }
}

impl GameConfig {
    pub fn new(cols: u32, rows: u32, tick_rate: u32, seed: u32, ai_count: u32) -> Self {
        Self {
            cols,
            rows,
            tick_rate,
            seed,
            ai_count,
        }
        .clamped()
    }

    /// Re-apply bounds (used after deserializing or hand-building a config)
    pub fn clamped(self) -> Self {
        Self {
            cols: self.cols.clamp(grid::MIN_DIMENSION, grid::MAX_DIMENSION),
            rows: self.rows.clamp(grid::MIN_DIMENSION, grid::MAX_DIMENSION),
            tick_rate: self.tick_rate.clamp(1, grid::MAX_TICK_RATE),
            seed: self.seed,
            ai_count: self.ai_count.min(ai::MAX_AGENTS),
        }
    }

    /// Number of cells on the board
    pub fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(cols) = env_u32("GRID_COLS") {
            config.cols = cols;
        }
        if let Some(rows) = env_u32("GRID_ROWS") {
            config.rows = rows;
        }
        if let Some(tick_rate) = env_u32("TICK_RATE") {
            config.tick_rate = tick_rate;
        }
        if let Some(seed) = env_u32("SEED") {
            config.seed = seed;
        }
        if let Some(ai_count) = env_u32("AI_COUNT") {
            config.ai_count = ai_count;
        }

        let clamped = config.clamped();
        if clamped != config {
            tracing::warn!("Game config out of range, clamped to {:?}", clamped);
        }
        clamped
    }
}

/// Driver-side settings for the headless session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on queued commands between ticks
    pub command_capacity: usize,
    /// Maximum ticks run in one real frame before the backlog is dropped
    pub max_steps_per_frame: u32,
    /// Stop after this many ticks (0 = run until game over)
    pub run_ticks: u64,
    /// Steer the player with the AI policy
    pub autopilot: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_capacity: session::COMMAND_CAPACITY,
            max_steps_per_frame: session::MAX_STEPS_PER_FRAME,
            run_ticks: 0,
            autopilot: true,
        }
    }
}

impl SessionConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(capacity) = std::env::var("COMMAND_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(parsed) if (1..=1024).contains(&parsed) => config.command_capacity = parsed,
                Ok(_) => tracing::warn!("COMMAND_CAPACITY must be 1-1024, using default"),
                Err(_) => tracing::warn!("Invalid COMMAND_CAPACITY '{}', using default", capacity),
            }
        }

        if let Some(steps) = env_u32("MAX_STEPS_PER_FRAME") {
            if steps > 0 {
                config.max_steps_per_frame = steps;
            } else {
                tracing::warn!("MAX_STEPS_PER_FRAME must be > 0, using default");
            }
        }

        if let Ok(ticks) = std::env::var("RUN_TICKS") {
            if let Ok(parsed) = ticks.parse::<u64>() {
                config.run_ticks = parsed;
            } else {
                tracing::warn!("Invalid RUN_TICKS '{}', using default", ticks);
            }
        }

        if let Ok(autopilot) = std::env::var("AUTOPILOT") {
            if let Ok(parsed) = autopilot.parse::<bool>() {
                config.autopilot = parsed;
            } else {
                tracing::warn!("Invalid AUTOPILOT '{}', using default", autopilot);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.command_capacity == 0 {
            return Err("command_capacity must be at least 1".to_string());
        }
        if self.max_steps_per_frame == 0 {
            return Err("max_steps_per_frame must be at least 1".to_string());
        }
        Ok(())
    }
}

fn env_u32(key: &str) -> Option<u32> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<u32>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}
