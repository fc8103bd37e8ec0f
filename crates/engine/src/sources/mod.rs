pub mod binance;
pub mod coingecko;
pub mod http;

use std::sync::Arc;

use tracing::info;

use common::config::MarketCapKind;
use common::{Config, QuantitySource, Result};

pub use binance::{BinanceOpenInterest, BinanceSpotMarketCap};
pub use coingecko::CoinGeckoMarketCap;
pub use http::RestClient;

/// The two quantities a poll cycle needs.
pub struct Sources {
    pub open_interest: Arc<dyn QuantitySource>,
    pub market_cap: Arc<dyn QuantitySource>,
}

impl Sources {
    /// Build both sources from config, sharing one HTTP client.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let rest = RestClient::new(&cfg.http)?;

        let open_interest: Arc<dyn QuantitySource> =
            Arc::new(BinanceOpenInterest::new(rest.clone(), &cfg.open_interest));

        let market_cap: Arc<dyn QuantitySource> = match cfg.market_cap.source {
            MarketCapKind::Coingecko => Arc::new(CoinGeckoMarketCap::new(rest, &cfg.market_cap)),
            MarketCapKind::SpotSupply => Arc::new(BinanceSpotMarketCap::new(rest, &cfg.market_cap)),
        };

        info!(
            open_interest = open_interest.name(),
            market_cap = market_cap.name(),
            "Sources configured"
        );
        Ok(Self {
            open_interest,
            market_cap,
        })
    }
}
