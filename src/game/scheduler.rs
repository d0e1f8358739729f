//! Fixed-timestep scheduler
//!
//! Converts real elapsed time into a whole number of ticks to run. It owns
//! the accumulator and previous timestamp so the driver stays a plain loop.

use std::time::{Duration, Instant};

pub struct FixedStepScheduler {
    step: Duration,
    max_steps: u32,
    accumulator: Duration,
    previous: Option<Instant>,
}

impl FixedStepScheduler {
    pub fn new(tick_rate: u32, max_steps: u32) -> Self {
        Self {
            step: Duration::from_nanos(1_000_000_000 / tick_rate.max(1) as u64),
            max_steps: max_steps.max(1),
            accumulator: Duration::ZERO,
            previous: None,
        }
    }

    /// Ticks to run for a frame observed at `now`
    ///
    /// The first frame after construction or `reset` only records the
    /// timestamp. A backlog beyond `max_steps` is discarded rather than
    /// replayed.
    pub fn frame(&mut self, now: Instant) -> u32 {
        let Some(previous) = self.previous.replace(now) else {
            return 0;
        };

        self.accumulator += now.saturating_duration_since(previous);

        let due = (self.accumulator.as_nanos() / self.step.as_nanos()) as u64;
        if due > self.max_steps as u64 {
            tracing::warn!(
                "Scheduler behind by {} ticks, running {} and dropping the rest",
                due,
                self.max_steps
            );
            self.accumulator = Duration::ZERO;
            return self.max_steps;
        }

        let due = due as u32;
        self.accumulator -= self.step * due;
        due
    }

    /// Forget accumulated time (restart or run end)
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.previous = None;
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time banked toward the next tick
    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }
}
