/// Board limits - CRITICAL: boards smaller than 8x8 cannot fit the spawn layouts
pub mod grid {
    /// Minimum width/height in cells
    pub const MIN_DIMENSION: u32 = 8;
    /// Maximum width/height in cells
    pub const MAX_DIMENSION: u32 = 256;
    /// Maximum ticks per second
    pub const MAX_TICK_RATE: u32 = 240;
}

/// Agent body constants
pub mod snake {
    /// Segment count of a freshly spawned body
    pub const SPAWN_LENGTH: usize = 3;
    /// Cells per tick before effects (accumulated, moves when >= 1)
    pub const BASE_SPEED: f64 = 0.5;
    /// Agent id of the player-controlled agent
    pub const PLAYER_ID: &str = "player";
}

/// Food constants
pub mod food {
    use crate::game::state::{EffectKind, EffectTemplate, FoodKind, FoodSpec};

    /// Maximum simultaneous food items on the board
    pub const MAX_FOOD: usize = 5;

    /// Speed boost granted by `FoodKind::Speed`
    pub const SPEED_BOOST: EffectTemplate = EffectTemplate {
        kind: EffectKind::SpeedBoost,
        multiplier: 1.8,
        duration_ticks: 40,
    };

    /// Weighted food table (weights need not sum to 1)
    pub const TABLE: [FoodSpec; 3] = [
        FoodSpec {
            kind: FoodKind::Standard,
            weight: 0.6,
            growth: 1,
            effect: None,
        },
        FoodSpec {
            kind: FoodKind::Bulk,
            weight: 0.2,
            growth: 3,
            effect: None,
        },
        FoodSpec {
            kind: FoodKind::Speed,
            weight: 0.2,
            growth: 1,
            effect: Some(SPEED_BOOST),
        },
    ];
}

/// Spawn constants
pub mod spawn {
    /// Ticks of collision immunity after a respawn
    pub const SAFE_WINDOW: u64 = 12;
    /// Ticks between an AI elimination and its first respawn attempt
    pub const RESPAWN_DELAY: u32 = 24;
    /// Minimum distance in cells between a spawn head and the board edge
    pub const MIN_MARGIN: u32 = 3;
    /// Spawn margin as a fraction of the shorter board side
    pub const MARGIN_RATIO: f64 = 0.15;
}

/// AI policy constants
pub mod ai {
    /// Maximum number of AI agents
    pub const MAX_AGENTS: u32 = 4;
    /// Score bonus for keeping the current heading (anti-jitter)
    pub const CONTINUATION_BONUS: f64 = 0.5;
    /// Amplitude of the tie-breaking noise added to each candidate score
    pub const NOISE_AMPLITUDE: f64 = 0.05;
}

/// Driver/session constants
pub mod session {
    /// Bound on queued commands between ticks
    pub const COMMAND_CAPACITY: usize = 16;
    /// Ticks run per real frame before the backlog is dropped
    pub const MAX_STEPS_PER_FRAME: u32 = 5;
    /// Rolling window for tick duration samples
    pub const BUDGET_SAMPLES: usize = 120;
}

/// Spawn margin for a board: proportional to the shorter side, never below
/// `spawn::MIN_MARGIN`
#[inline]
pub fn spawn_margin(cols: u32, rows: u32) -> u32 {
    let scaled = (cols.min(rows) as f64 * spawn::MARGIN_RATIO).floor() as u32;
    scaled.max(spawn::MIN_MARGIN)
}
