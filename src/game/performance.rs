//! Tick budget monitoring
//!
//! Tracks how long each resolver call takes relative to the fixed timestep so
//! the driver can report when the simulation falls behind real time.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::constants::session::BUDGET_SAMPLES;

/// Minimum samples before the status moves off `Healthy`
const MIN_SAMPLES: usize = 10;
/// Average above this fraction of the budget is strained
const STRAINED_RATIO: f32 = 0.5;
/// Average above this fraction of the budget cannot keep up
const OVERLOADED_RATIO: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Healthy,
    /// Over half the budget spent resolving
    Strained,
    /// Ticks take longer than the timestep
    Overloaded,
}

/// Rolling window of tick durations against the timestep budget
pub struct TickBudget {
    samples: VecDeque<Duration>,
    max_samples: usize,
    budget: Duration,
    status: BudgetStatus,
    tick_start: Option<Instant>,
}

impl TickBudget {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            samples: VecDeque::with_capacity(BUDGET_SAMPLES),
            max_samples: BUDGET_SAMPLES,
            budget: Duration::from_nanos(1_000_000_000 / tick_rate.max(1) as u64),
            status: BudgetStatus::Healthy,
            tick_start: None,
        }
    }

    /// Start timing a tick
    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// End timing a tick and record the duration
    pub fn tick_end(&mut self) {
        if let Some(start) = self.tick_start.take() {
            self.record(start.elapsed());
        }
    }

    /// Record a tick duration
    pub fn record(&mut self, duration: Duration) {
        self.samples.push_back(duration);
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.samples.len() < MIN_SAMPLES {
            return;
        }

        let previous = self.status;
        let ratio = self.usage_ratio();
        self.status = if ratio < STRAINED_RATIO {
            BudgetStatus::Healthy
        } else if ratio < OVERLOADED_RATIO {
            BudgetStatus::Strained
        } else {
            BudgetStatus::Overloaded
        };

        if self.status != previous {
            tracing::warn!("Tick budget {:?} -> {:?} ({})", previous, self.status, self.status_message());
        }
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    /// 95th percentile tick duration
    pub fn p95(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort();
        let idx = sorted.len() * 95 / 100;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn usage_ratio(&self) -> f32 {
        self.average().as_secs_f32() / self.budget.as_secs_f32()
    }

    /// Human-readable summary for logs
    pub fn status_message(&self) -> String {
        format!(
            "{:?} - avg {:?}, p95 {:?}, {:.1}% of budget",
            self.status,
            self.average(),
            self.p95(),
            self.usage_ratio() * 100.0
        )
    }
}
