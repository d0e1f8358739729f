//! Run end detection and standings
//!
//! Decides when a run is over and ranks agents for the HUD and final log.

use serde::Serialize;

use crate::game::state::{AgentId, Controller, WorldState};

/// Reason why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunEndReason {
    /// No agent is alive at all
    NoAgents,
    /// AI agents survive but the player does not
    PlayerEliminated,
}

/// Check if the run should end after a resolved tick
///
/// AI-only survival keeps the run going only while a player-controlled
/// agent is still alive.
pub fn check_run_end(state: &WorldState) -> Option<RunEndReason> {
    if state.alive_count() == 0 {
        return Some(RunEndReason::NoAgents);
    }
    let player_alive = state
        .alive_agents()
        .any(|a| a.controller == Controller::Player);
    if !player_alive {
        return Some(RunEndReason::PlayerEliminated);
    }
    None
}

/// One agent's place in the standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub agent_id: AgentId,
    pub rank: u32,
    pub length: usize,
    pub alive: bool,
    pub is_player: bool,
}

/// Rank agents: alive first, then by length (desc), then agent list order
pub fn standings(state: &WorldState) -> Vec<Standing> {
    let mut rows: Vec<Standing> = state
        .agents
        .iter()
        .map(|a| Standing {
            agent_id: a.id.clone(),
            rank: 0,
            length: a.len(),
            alive: a.alive,
            is_player: a.controller == Controller::Player,
        })
        .collect();

    // Stable sort keeps agent list order on ties
    rows.sort_by(|a, b| b.alive.cmp(&a.alive).then_with(|| b.length.cmp(&a.length)));

    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = (i + 1) as u32;
    }
    rows
}
