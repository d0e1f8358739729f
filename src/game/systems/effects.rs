//! Timed effects and movement gating

use crate::game::state::{Agent, EffectKind, EffectSet};

/// Largest carry kept in the accumulator after a move (keeps it in [0, 1))
const MAX_CARRY: f64 = 1.0 - f64::EPSILON;

/// Drop effects whose expiry tick has been reached
pub fn prune_expired(effects: &mut EffectSet, tick: u64) {
    effects.retain(|e| e.expires_at_tick > tick);
}

/// Product of all active speed multipliers (1.0 with no boosts)
pub fn speed_multiplier(effects: &EffectSet) -> f64 {
    effects
        .iter()
        .filter(|e| e.kind == EffectKind::SpeedBoost)
        .map(|e| e.multiplier)
        .product()
}

/// Accumulate movement credit for this tick.
/// Returns true if the agent moves, consuming one cell of credit.
pub fn gate_movement(agent: &mut Agent) -> bool {
    agent.speed_accumulator += agent.speed * speed_multiplier(&agent.effects);
    if agent.speed_accumulator >= 1.0 {
        agent.speed_accumulator = (agent.speed_accumulator - 1.0).min(MAX_CARRY);
        true
    } else {
        false
    }
}
