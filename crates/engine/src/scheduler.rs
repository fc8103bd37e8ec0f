use std::time::Duration;

use async_trait::async_trait;

use common::config::PollConfig;
use common::CycleOutcome;

/// Source of the delays between poll cycles.
///
/// `TokioScheduler` sleeps for real. Tests swap in a scheduler that records the
/// requested delays and returns immediately.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How long to wait after each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub interval: Duration,
    /// Used instead of `interval` after a fetch failure.
    pub retry_delay: Duration,
}

impl Cadence {
    pub fn new(interval: Duration, retry_delay: Duration) -> Self {
        Self {
            interval,
            retry_delay,
        }
    }

    pub fn from_config(cfg: &PollConfig) -> Self {
        Self::new(cfg.interval(), cfg.retry_delay())
    }

    pub fn delay_after(&self, outcome: &CycleOutcome) -> Duration {
        if outcome.is_skipped() {
            self.retry_delay
        } else {
            self.interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::Sample;

    #[test]
    fn skipped_cycles_use_retry_delay() {
        let cadence = Cadence::new(Duration::from_secs(30), Duration::from_secs(10));
        let skipped = CycleOutcome::Skipped { failures: vec![] };
        let baseline = CycleOutcome::Baseline(Sample {
            ratio: 1.0,
            open_interest: 1.0,
            market_cap: 1.0,
            taken_at: Utc::now(),
        });

        assert_eq!(cadence.delay_after(&skipped), Duration::from_secs(10));
        assert_eq!(cadence.delay_after(&baseline), Duration::from_secs(30));
    }

    #[test]
    fn cadence_reads_poll_config() {
        let cadence = Cadence::from_config(&PollConfig {
            interval_secs: 45,
            retry_secs: 5,
        });
        assert_eq!(cadence.interval, Duration::from_secs(45));
        assert_eq!(cadence.retry_delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn tokio_scheduler_waits_at_least_the_duration() {
        let start = tokio::time::Instant::now();
        TokioScheduler.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
