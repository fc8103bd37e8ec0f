use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, ConsoleSink};
use engine::{Cadence, Poller, PollerExit, Sources, TokioScheduler};
use strategy::RatioEvaluator;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    // stdout carries the status lines; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::load().unwrap_or_else(|e| panic!("Failed to load configuration: {e}"));
    info!(
        symbol = %cfg.open_interest.symbol,
        interval_secs = cfg.poll.interval_secs,
        retry_secs = cfg.poll.retry_secs,
        scale = cfg.ratio.scale,
        "OI signal bot starting"
    );

    // ── Sources ───────────────────────────────────────────────────────────────
    let sources =
        Sources::from_config(&cfg).unwrap_or_else(|e| panic!("Failed to build sources: {e}"));

    // ── Poller ────────────────────────────────────────────────────────────────
    let (poller, handle) = Poller::new(
        sources.open_interest,
        sources.market_cap,
        RatioEvaluator::new(cfg.ratio.scale),
        Arc::new(ConsoleSink::stdout()),
        Arc::new(TokioScheduler),
        Cadence::from_config(&cfg.poll),
    );
    let task = tokio::spawn(poller.run());

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    };
    match handle.supervise(task, ctrl_c).await {
        PollerExit::Interrupted => {}
        PollerExit::Stopped => warn!("Poller stopped without a shutdown request"),
        PollerExit::Failed(e) => error!("Poller task ended abnormally: {e}"),
    }

    let stats = handle.stats().await;
    info!(
        cycles = stats.cycles,
        signals = stats.signals,
        skipped = stats.skipped,
        errors = stats.errors,
        last_ratio = ?stats.last_sample.map(|s| s.ratio),
        "Stopped"
    );
}
