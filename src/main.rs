use std::time::Duration;

use anyhow::Context;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use serpent_arena::config::{GameConfig, SessionConfig};
use serpent_arena::game::input_buffer::{CommandBufferError, CommandSender};
use serpent_arena::game::resolver::TickEvent;
use serpent_arena::game::rng::SeededRng;
use serpent_arena::game::session::{GameSession, SnapshotReader};
use serpent_arena::game::spatial::OccupancyGrid;
use serpent_arena::game::systems::ai;

/// Real frame interval for the driver loop (~60 Hz)
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Seconds between periodic status logs
const STATUS_INTERVAL_SECS: u64 = 10;
/// Mixed into the seed so autopilot noise never mirrors the world generator
const AUTOPILOT_SALT: u32 = 0x9E37_79B9;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Serpent Arena v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = GameConfig::load_or_default();
    let session_config = SessionConfig::load_or_default();
    session_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid session configuration")?;
    info!(
        "Configuration loaded: autopilot={}, run_ticks={}, max_steps_per_frame={}",
        session_config.autopilot, session_config.run_ticks, session_config.max_steps_per_frame
    );

    let mut session = GameSession::new(config, &session_config);
    let sender = session.sender();
    let reader = session.reader();
    let mut autopilot = SeededRng::new(config.seed ^ AUTOPILOT_SALT);

    let mut ticker = interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let status_every = config.tick_rate as u64 * STATUS_INTERVAL_SECS;
    let mut last_status_tick = 0;
    let mut last_steered_tick = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let now = tokio::select! {
            now = ticker.tick() => now.into_std(),
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl+C")?;
                info!("Shutdown signal received");
                break;
            }
        };

        if session_config.autopilot {
            steer_player(&reader, &sender, &mut autopilot, &mut last_steered_tick);
        }

        let report = session.frame(now);
        for event in &report.events {
            log_event(event);
        }

        let tick = session.state().tick;
        if tick >= last_status_tick + status_every {
            last_status_tick = tick;
            let hud = session.hud();
            info!(
                "Tick {}, length {}, opponents {}/{}, food {} | Budget: {}",
                hud.tick,
                hud.player_length,
                hud.opponents_alive,
                hud.opponents_total,
                hud.food_count,
                session.budget().status_message()
            );
        }

        if !session.state().is_running() {
            break;
        }
        if session_config.run_ticks > 0 && tick >= session_config.run_ticks {
            info!("Reached run limit of {} ticks", session_config.run_ticks);
            break;
        }
    }

    let hud = session.hud();
    info!("Final HUD: {}", serde_json::to_string(&hud)?);
    info!("Session stopped");

    Ok(())
}

/// Drive the player with the AI policy, once per new snapshot
fn steer_player(
    reader: &SnapshotReader,
    sender: &CommandSender,
    rng: &mut SeededRng,
    last_steered_tick: &mut Option<u64>,
) {
    let state = reader.latest();
    if *last_steered_tick == Some(state.tick) {
        return;
    }
    *last_steered_tick = Some(state.tick);

    let Some((index, player)) = state
        .agents
        .iter()
        .enumerate()
        .find(|(_, a)| a.alive && !a.is_ai())
    else {
        return;
    };

    let occupancy = OccupancyGrid::build(&state.agents, state.config.cols, state.config.rows);
    let Some(direction) = ai::choose_direction(player, index, &state, &occupancy, rng) else {
        return;
    };
    if direction == player.heading() {
        return;
    }

    match sender.try_send(player.id.clone(), direction) {
        Ok(()) => {}
        Err(CommandBufferError::Full) => warn!("Command buffer full, autopilot turn dropped"),
        Err(CommandBufferError::Disconnected) => warn!("Command buffer disconnected"),
    }
}

fn log_event(event: &TickEvent) {
    match event {
        TickEvent::AgentEliminated { agent_id, cause } => {
            info!("{} eliminated ({:?})", agent_id, cause);
        }
        TickEvent::AgentRespawned { agent_id, tick } => {
            info!("{} respawned at tick {}", agent_id, tick);
        }
        TickEvent::RunEnded { reason } => {
            info!("Run ended: {:?}", reason);
        }
        other => debug!("{:?}", other),
    }
}
