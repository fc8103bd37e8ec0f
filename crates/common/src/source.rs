use async_trait::async_trait;

use crate::FetchError;

/// One upstream quantity (open interest, market cap) behind a fetch.
///
/// The HTTP-backed sources in `crates/engine` implement this for live polling.
/// Tests substitute in-memory sources to inject values and failures.
#[async_trait]
pub trait QuantitySource: Send + Sync {
    /// Short label used in logs and warnings, e.g. "binance-oi".
    fn name(&self) -> &str;

    /// Fetch the current value of the quantity.
    async fn fetch(&self) -> Result<f64, FetchError>;
}
