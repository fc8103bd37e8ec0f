use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use common::{
    CycleOutcome, FetchError, PollerStats, QuantitySource, Result, SourceFailure, StatusSink,
};
use strategy::RatioEvaluator;

use crate::report;
use crate::scheduler::{Cadence, Scheduler};

/// Cloneable handle for stopping the poller and reading its counters.
#[derive(Clone)]
pub struct PollerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    stats: Arc<RwLock<PollerStats>>,
}

impl PollerHandle {
    /// Ask the loop to stop. An in-flight cycle is abandoned.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub async fn stats(&self) -> PollerStats {
        self.stats.read().await.clone()
    }

    /// Wait for either `shutdown` to resolve or the poller `task` to end.
    ///
    /// On `shutdown` the loop is stopped and awaited. A task that ends first
    /// was not asked to, and is reported as `Stopped` or `Failed`.
    pub async fn supervise<F>(&self, mut task: JoinHandle<()>, shutdown: F) -> PollerExit
    where
        F: Future<Output = ()>,
    {
        let ended = tokio::select! {
            _ = shutdown => None,
            joined = &mut task => Some(joined),
        };

        match ended {
            Some(Ok(())) => PollerExit::Stopped,
            Some(Err(e)) => PollerExit::Failed(e.to_string()),
            None => {
                info!("Shutdown signal received. Stopping poller.");
                self.shutdown();
                match task.await {
                    Ok(()) => PollerExit::Interrupted,
                    Err(e) => PollerExit::Failed(e.to_string()),
                }
            }
        }
    }
}

/// How the poller task ended under `PollerHandle::supervise`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerExit {
    /// Stopped on request.
    Interrupted,
    /// Returned without a shutdown request.
    Stopped,
    /// Panicked or was cancelled.
    Failed(String),
}

/// The poll loop: fetch both quantities, evaluate the ratio, report, sleep.
pub struct Poller {
    open_interest: Arc<dyn QuantitySource>,
    market_cap: Arc<dyn QuantitySource>,
    evaluator: RatioEvaluator,
    sink: Arc<dyn StatusSink>,
    scheduler: Arc<dyn Scheduler>,
    cadence: Cadence,
    stats: Arc<RwLock<PollerStats>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Poller {
    pub fn new(
        open_interest: Arc<dyn QuantitySource>,
        market_cap: Arc<dyn QuantitySource>,
        evaluator: RatioEvaluator,
        sink: Arc<dyn StatusSink>,
        scheduler: Arc<dyn Scheduler>,
        cadence: Cadence,
    ) -> (Self, PollerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(RwLock::new(PollerStats::default()));

        let handle = PollerHandle {
            shutdown_tx: Arc::new(shutdown_tx),
            stats: stats.clone(),
        };

        let poller = Poller {
            open_interest,
            market_cap,
            evaluator,
            sink,
            scheduler,
            cadence,
            stats,
            shutdown_rx,
        };

        (poller, handle)
    }

    /// The stored baseline ratio, if any.
    pub fn previous_ratio(&self) -> Option<f64> {
        self.evaluator.previous()
    }

    /// Run until the handle requests shutdown (or is dropped).
    /// Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            interval = ?self.cadence.interval,
            retry_delay = ?self.cadence.retry_delay,
            scale = self.evaluator.scale(),
            "Poller running"
        );
        self.sink
            .line(&report::banner(self.cadence.interval, self.cadence.retry_delay));

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            let delay = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                result = self.run_cycle() => self.settle(result).await,
            };

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = self.scheduler.sleep(delay) => {}
            }
        }

        info!("Poller stopped");
    }

    /// One poll: fetch both quantities, then evaluate and report.
    ///
    /// Fetch failures are not errors here: they produce `CycleOutcome::Skipped`
    /// and leave the baseline alone. Only ratio arithmetic can fail.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let taken_at = Utc::now();
        let cycle = self.stats.read().await.cycles + 1;
        for line in report::cycle_header(cycle, taken_at) {
            self.sink.line(&line);
        }

        // Both are always attempted so that every failing source is reported.
        let open_interest = self.open_interest.fetch().await;
        let market_cap = self.market_cap.fetch().await;

        if let Ok(value) = open_interest {
            self.sink
                .line(&report::open_interest(self.open_interest.name(), value));
        }
        if let Ok(value) = market_cap {
            self.sink
                .line(&report::market_cap(self.market_cap.name(), value));
        }

        let (open_interest, market_cap) = match (open_interest, market_cap) {
            (Ok(oi), Ok(mc)) => (oi, mc),
            (oi, mc) => {
                let failures = [
                    failure(self.open_interest.name(), oi.err()),
                    failure(self.market_cap.name(), mc.err()),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();

                for f in &failures {
                    warn!(source = %f.source, error = %f.error, "Fetch failed");
                    self.sink.line(&report::fetch_failed(f));
                }
                self.sink.line(&report::skipped(self.cadence.retry_delay));
                return Ok(CycleOutcome::Skipped { failures });
            }
        };

        let outcome = self
            .evaluator
            .evaluate(open_interest, market_cap, taken_at)?;

        match &outcome {
            CycleOutcome::Baseline(sample) => {
                self.sink.line(&report::ratio(sample.ratio));
                self.sink.line(&report::baseline());
                debug!(ratio = sample.ratio, "Baseline ratio stored");
            }
            CycleOutcome::Signalled { sample, report: summary } => {
                self.sink.line(&report::ratio(sample.ratio));
                for line in report::signal_block(summary) {
                    self.sink.line(&line);
                }
                debug!(
                    signal = %summary.signal,
                    previous = summary.previous,
                    current = summary.current,
                    change_pct = summary.change_pct,
                    "Signal"
                );
            }
            CycleOutcome::Skipped { .. } => {}
        }

        Ok(outcome)
    }

    /// Record the cycle result and pick the delay before the next one.
    async fn settle(&self, result: Result<CycleOutcome>) -> Duration {
        let mut stats = self.stats.write().await;
        match result {
            Ok(outcome) => {
                stats.record(&outcome);
                self.cadence.delay_after(&outcome)
            }
            Err(e) => {
                error!(error = %e, "Poll cycle failed");
                self.sink.line(&report::cycle_failed(&e));
                stats.record_error();
                self.cadence.interval
            }
        }
    }
}

fn failure(source: &str, error: Option<FetchError>) -> Option<SourceFailure> {
    error.map(|error| SourceFailure {
        source: source.to_string(),
        error,
    })
}
