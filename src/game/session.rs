//! Game session - owns the current snapshot and drives the resolver
//!
//! The session is the only writer. Renderers hold a `SnapshotReader` and
//! only ever see complete, published snapshots.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::info;

use crate::config::{GameConfig, SessionConfig};
use crate::game::input_buffer::{CommandBuffer, CommandSender};
use crate::game::performance::TickBudget;
use crate::game::resolver::{advance_with_events, TickEvent};
use crate::game::scheduler::FixedStepScheduler;
use crate::game::snapshot::HudSummary;
use crate::game::state::WorldState;

/// Read-only handle to the latest published snapshot
#[derive(Clone)]
pub struct SnapshotReader {
    inner: Arc<RwLock<Arc<WorldState>>>,
}

impl SnapshotReader {
    /// Latest snapshot (cheap: clones the `Arc`)
    pub fn latest(&self) -> Arc<WorldState> {
        self.inner.read().clone()
    }

    pub fn tick(&self) -> u64 {
        self.inner.read().tick
    }
}

/// Ticks run and events produced by one real frame
#[derive(Debug, Default)]
pub struct FrameReport {
    pub steps: u32,
    pub events: Vec<TickEvent>,
}

pub struct GameSession {
    config: GameConfig,
    state: Arc<WorldState>,
    commands: CommandBuffer,
    scheduler: FixedStepScheduler,
    budget: TickBudget,
    published: Arc<RwLock<Arc<WorldState>>>,
}

impl GameSession {
    pub fn new(config: GameConfig, session: &SessionConfig) -> Self {
        let config = config.clamped();
        let state = Arc::new(WorldState::new(config));

        info!(
            "Session started: {}x{} board, {} AI, seed {}, {} Hz",
            config.cols, config.rows, config.ai_count, config.seed, config.tick_rate
        );

        Self {
            config,
            published: Arc::new(RwLock::new(state.clone())),
            state,
            commands: CommandBuffer::new(session.command_capacity),
            scheduler: FixedStepScheduler::new(config.tick_rate, session.max_steps_per_frame),
            budget: TickBudget::new(config.tick_rate),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<WorldState> {
        &self.state
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            inner: self.published.clone(),
        }
    }

    /// Sender handle for an input source
    pub fn sender(&self) -> CommandSender {
        self.commands.sender()
    }

    pub fn budget(&self) -> &TickBudget {
        &self.budget
    }

    pub fn hud(&self) -> HudSummary {
        HudSummary::from_state(&self.state)
    }

    /// Run one tick with every command queued since the last one
    pub fn step(&mut self) -> Vec<TickEvent> {
        let commands = self.commands.drain();

        self.budget.tick_start();
        let (next, events) = advance_with_events(&self.state, &commands);
        self.budget.tick_end();

        let ended = self.state.is_running() && !next.is_running();
        if next.tick != self.state.tick {
            self.state = Arc::new(next);
            self.publish();
        }

        if ended {
            // No backlog carried past the end of a run
            self.scheduler.reset();
            info!("Run over at tick {}", self.state.tick);
        }

        events
    }

    /// Run however many ticks are due at `now`
    pub fn frame(&mut self, now: Instant) -> FrameReport {
        let due = self.scheduler.frame(now);
        let mut report = FrameReport::default();

        for _ in 0..due {
            if !self.state.is_running() {
                break;
            }
            report.events.extend(self.step());
            report.steps += 1;
        }
        report
    }

    /// Start a new run from the same config
    pub fn restart(&mut self) {
        self.commands.clear();
        self.scheduler.reset();
        self.state = Arc::new(WorldState::new(self.config));
        self.publish();
        info!("Session restarted (seed {})", self.config.seed);
    }

    fn publish(&self) {
        *self.published.write() = self.state.clone();
    }
}
