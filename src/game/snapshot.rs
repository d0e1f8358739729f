//! Read side of the simulation: HUD summary and snapshot codec

use serde::Serialize;

use crate::game::outcome::{self, Standing};
use crate::game::state::{Controller, RunStatus, WorldState};

/// Snapshot codec errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encode error: {0}")]
    Encode(String),
    #[error("snapshot decode error: {0}")]
    Decode(String),
}

/// Everything a HUD shows, derived from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSummary {
    pub tick: u64,
    /// 0 once the player is gone
    pub player_length: usize,
    pub food_count: usize,
    pub opponents_alive: usize,
    pub opponents_total: usize,
    pub boost_active: bool,
    pub status: RunStatus,
    pub standings: Vec<Standing>,
}

impl HudSummary {
    pub fn from_state(state: &WorldState) -> Self {
        let player = state.player().filter(|p| p.alive);
        let opponents = state.agents.iter().filter(|a| a.controller == Controller::Ai);

        let (opponents_alive, opponents_total) =
            opponents.fold((0, 0), |(alive, total), a| (alive + a.alive as usize, total + 1));

        Self {
            tick: state.tick,
            player_length: player.map_or(0, |p| p.len()),
            food_count: state.food.len(),
            opponents_alive,
            opponents_total,
            boost_active: player.map_or(false, |p| p.has_speed_boost()),
            status: state.status,
            standings: outcome::standings(state),
        }
    }
}

/// Encode a snapshot using bincode
pub fn encode_snapshot(state: &WorldState) -> Result<Vec<u8>, SnapshotError> {
    bincode::serde::encode_to_vec(state, bincode::config::legacy())
        .map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Decode a snapshot; the config is re-clamped
pub fn decode_snapshot(data: &[u8]) -> Result<WorldState, SnapshotError> {
    let (mut state, _): (WorldState, usize) =
        bincode::serde::decode_from_slice(data, bincode::config::legacy())
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;
    state.config = state.config.clamped();
    Ok(state)
}
