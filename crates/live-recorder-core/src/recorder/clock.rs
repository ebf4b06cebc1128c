use std::time::{Duration, Instant};

use tokio::time::{self, Interval, MissedTickBehavior};

/// Pause-aware stopwatch for the recorded duration.
#[derive(Debug, Clone, Default)]
pub struct DurationClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl DurationClock {
    /// Start or continue counting. No-op while running.
    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Freeze the count. No-op while paused.
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Zero the count and stop.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Whether the clock is counting.
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Total counted time.
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map(|s| s.elapsed()).unwrap_or_default()
    }
}

/// Cancellable periodic schedule owned by the state machine.
///
/// A stopped task's [`PeriodicTask::tick`] never resolves, so it can sit in a
/// `select!` unconditionally.
#[derive(Debug)]
pub struct PeriodicTask {
    period: Duration,
    interval: Option<Interval>,
}

impl PeriodicTask {
    /// Create a stopped task.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    /// Arm the schedule; the first tick fires one period from now.
    pub fn start(&mut self) {
        let mut interval = time::interval_at(time::Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    /// Disarm the schedule.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Whether the schedule is armed.
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
