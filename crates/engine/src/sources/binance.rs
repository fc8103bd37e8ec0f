use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use common::config::{MarketCapConfig, OpenInterestConfig, OpenInterestKind};
use common::{FetchError, QuantitySource};

use super::http::{number_at, RestClient};

/// Binance USDⓈ-M futures open interest for one symbol.
///
/// `Contracts` reads the live snapshot (base-asset units); `Notional` reads the
/// latest bucket of the history endpoint (USD value).
pub struct BinanceOpenInterest {
    rest: RestClient,
    kind: OpenInterestKind,
    url: String,
    symbol: String,
    period: String,
}

impl BinanceOpenInterest {
    pub fn new(rest: RestClient, cfg: &OpenInterestConfig) -> Self {
        let base = cfg.futures_base_url.trim_end_matches('/');
        let url = match cfg.source {
            OpenInterestKind::Contracts => format!("{base}/fapi/v1/openInterest"),
            OpenInterestKind::Notional => format!("{base}/futures/data/openInterestHist"),
        };
        Self {
            rest,
            kind: cfg.source,
            url,
            symbol: cfg.symbol.to_uppercase(),
            period: cfg.period.clone(),
        }
    }
}

#[async_trait]
impl QuantitySource for BinanceOpenInterest {
    fn name(&self) -> &str {
        match self.kind {
            OpenInterestKind::Contracts => "binance-oi",
            OpenInterestKind::Notional => "binance-oi-usd",
        }
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        let oi = match self.kind {
            OpenInterestKind::Contracts => {
                let body = self
                    .rest
                    .get_json(&self.url, &[("symbol", self.symbol.as_str())])
                    .await?;
                parse_open_interest(&body)?
            }
            OpenInterestKind::Notional => {
                let body = self
                    .rest
                    .get_json(
                        &self.url,
                        &[
                            ("symbol", self.symbol.as_str()),
                            ("period", self.period.as_str()),
                            ("limit", "1"),
                        ],
                    )
                    .await?;
                parse_open_interest_value(&body)?
            }
        };
        debug!(symbol = %self.symbol, oi, "Open interest fetched");
        Ok(oi)
    }
}

/// Binance spot price multiplied by a fixed circulating supply.
pub struct BinanceSpotMarketCap {
    rest: RestClient,
    url: String,
    symbol: String,
    circulating_supply: f64,
}

impl BinanceSpotMarketCap {
    pub fn new(rest: RestClient, cfg: &MarketCapConfig) -> Self {
        Self {
            rest,
            url: format!(
                "{}/api/v3/ticker/price",
                cfg.spot_base_url.trim_end_matches('/')
            ),
            symbol: cfg.spot_symbol.to_uppercase(),
            circulating_supply: cfg.circulating_supply,
        }
    }
}

#[async_trait]
impl QuantitySource for BinanceSpotMarketCap {
    fn name(&self) -> &str {
        "binance-spot"
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        let body = self
            .rest
            .get_json(&self.url, &[("symbol", self.symbol.as_str())])
            .await?;
        let price = parse_spot_price(&body)?;
        debug!(symbol = %self.symbol, price, "Spot price fetched");
        Ok(price * self.circulating_supply)
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

/// `{"openInterest":"10659.509","symbol":"BTCUSDT","time":1589437530011}`
fn parse_open_interest(body: &Value) -> Result<f64, FetchError> {
    number_at(body, &["openInterest"])
}

/// `[{"symbol":"BTCUSDT","sumOpenInterest":"20403.637","sumOpenInterestValue":"150570784.07",...}]`
///
/// The newest bucket is last.
fn parse_open_interest_value(body: &Value) -> Result<f64, FetchError> {
    let buckets = body.as_array().ok_or_else(|| {
        FetchError::Malformed("open interest history is not an array".to_string())
    })?;
    let latest = buckets
        .last()
        .ok_or_else(|| FetchError::MissingField("sumOpenInterestValue".to_string()))?;
    number_at(latest, &["sumOpenInterestValue"])
}

/// `{"symbol":"BTCUSDT","price":"67187.33"}`
fn parse_spot_price(body: &Value) -> Result<f64, FetchError> {
    number_at(body, &["price"])
}
