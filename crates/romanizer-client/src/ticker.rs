//! Timer seam for repeating tasks.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Shortest period an [`IntervalTicker`] will run at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Source of poll ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick. Returns `false` once no further ticks will be
    /// produced, which ends the loop driving this ticker.
    async fn tick(&mut self) -> bool;
}

/// Fixed-interval ticker backed by `tokio::time::interval`.
///
/// The first tick fires one full period after construction, and a tick that
/// would fire while the previous request is still running is delayed rather
/// than bursted.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker firing every `period`, raised to [`MIN_PERIOD`] when
    /// shorter.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Configured period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let started = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_millis(2_000));
        assert_eq!(ticker.period(), Duration::from_millis(2_000));

        assert!(ticker.tick().await);
        assert!(started.elapsed() >= Duration::from_millis(2_000));

        assert!(ticker.tick().await);
        assert!(started.elapsed() >= Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_minimum() {
        let started = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::ZERO);
        assert_eq!(ticker.period(), MIN_PERIOD);

        assert!(ticker.tick().await);
        assert!(started.elapsed() >= MIN_PERIOD);
    }
}
