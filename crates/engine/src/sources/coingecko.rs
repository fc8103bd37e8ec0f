use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use common::config::MarketCapConfig;
use common::{FetchError, QuantitySource};

use super::http::{number_at, RestClient};

/// Market capitalization from CoinGecko's `simple/price` endpoint.
pub struct CoinGeckoMarketCap {
    rest: RestClient,
    url: String,
    coin_id: String,
    vs_currency: String,
}

impl CoinGeckoMarketCap {
    pub fn new(rest: RestClient, cfg: &MarketCapConfig) -> Self {
        Self {
            rest,
            url: format!(
                "{}/api/v3/simple/price",
                cfg.coingecko_base_url.trim_end_matches('/')
            ),
            coin_id: cfg.coin_id.to_lowercase(),
            vs_currency: cfg.vs_currency.to_lowercase(),
        }
    }
}

#[async_trait]
impl QuantitySource for CoinGeckoMarketCap {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<f64, FetchError> {
        let body = self
            .rest
            .get_json(
                &self.url,
                &[
                    ("ids", self.coin_id.as_str()),
                    ("vs_currencies", self.vs_currency.as_str()),
                    ("include_market_cap", "true"),
                ],
            )
            .await?;
        let market_cap = parse_market_cap(&body, &self.coin_id, &self.vs_currency)?;
        debug!(coin = %self.coin_id, market_cap, "Market cap fetched");
        Ok(market_cap)
    }
}

/// `{"bitcoin":{"usd":67187.33,"usd_market_cap":1317802988326.25}}`
fn parse_market_cap(body: &Value, coin_id: &str, vs_currency: &str) -> Result<f64, FetchError> {
    let field = format!("{vs_currency}_market_cap");
    number_at(body, &[coin_id, field.as_str()])
}
