use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// Environment variable naming an optional TOML file layered over the defaults.
pub const CONFIG_PATH_ENV: &str = "OI_SIGNAL_CONFIG";

/// All runtime settings. `Config::default()` holds the compiled-in constants;
/// a TOML file may override any subset of them.
///
/// Example `config/oi-signal.toml`:
/// ```toml
/// [poll]
/// interval_secs = 60
/// retry_secs = 15
///
/// [open_interest]
/// source = "notional"
///
/// [ratio]
/// scale = 1.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub poll: PollConfig,
    pub http: HttpConfig,
    pub open_interest: OpenInterestConfig,
    pub market_cap: MarketCapConfig,
    pub ratio: RatioConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between cycles after a normal cycle.
    pub interval_secs: u64,
    /// Shorter delay used after a fetch failure.
    pub retry_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            retry_secs: 10,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("oi-signal/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which Binance futures endpoint supplies quantity A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenInterestKind {
    /// `/fapi/v1/openInterest`, in base-asset units.
    Contracts,
    /// `/futures/data/openInterestHist`, in USD.
    Notional,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenInterestConfig {
    pub source: OpenInterestKind,
    pub symbol: String,
    pub futures_base_url: String,
    /// Bucket size for the notional history endpoint.
    pub period: String,
}

impl Default for OpenInterestConfig {
    fn default() -> Self {
        Self {
            source: OpenInterestKind::Contracts,
            symbol: "BTCUSDT".to_string(),
            futures_base_url: "https://fapi.binance.com".to_string(),
            period: "5m".to_string(),
        }
    }
}

/// Which endpoint supplies quantity B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCapKind {
    /// CoinGecko `simple/price` with `include_market_cap`.
    Coingecko,
    /// Binance spot price times a fixed circulating supply.
    SpotSupply,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarketCapConfig {
    pub source: MarketCapKind,
    pub coingecko_base_url: String,
    pub coin_id: String,
    pub vs_currency: String,
    pub spot_base_url: String,
    pub spot_symbol: String,
    pub circulating_supply: f64,
}

impl Default for MarketCapConfig {
    fn default() -> Self {
        Self {
            source: MarketCapKind::Coingecko,
            coingecko_base_url: "https://api.coingecko.com".to_string(),
            coin_id: "bitcoin".to_string(),
            vs_currency: "usd".to_string(),
            spot_base_url: "https://api.binance.com".to_string(),
            spot_symbol: "BTCUSDT".to_string(),
            circulating_supply: 19_700_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RatioConfig {
    /// Multiplier applied to open interest before dividing by market cap.
    pub scale: f64,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self { scale: 1e8 }
    }
}

impl Config {
    /// Load `.env` if present, then layer the TOML file named by
    /// `OI_SIGNAL_CONFIG` (if set) over the compiled-in defaults.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let cfg = match optional_env(CONFIG_PATH_ENV) {
            Some(path) => {
                info!(path = %path, "Loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            return Err(Error::Config("poll.interval_secs must be > 0".into()));
        }
        if self.poll.retry_secs == 0 {
            return Err(Error::Config("poll.retry_secs must be > 0".into()));
        }
        if self.poll.retry_secs > self.poll.interval_secs {
            return Err(Error::Config(format!(
                "poll.retry_secs ({}) must not exceed poll.interval_secs ({})",
                self.poll.retry_secs, self.poll.interval_secs
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be > 0".into()));
        }
        if !self.ratio.scale.is_finite() || self.ratio.scale <= 0.0 {
            return Err(Error::Config(format!(
                "ratio.scale must be a positive number, got {}",
                self.ratio.scale
            )));
        }
        if self.market_cap.source == MarketCapKind::SpotSupply
            && !(self.market_cap.circulating_supply.is_finite()
                && self.market_cap.circulating_supply > 0.0)
        {
            return Err(Error::Config(format!(
                "market_cap.circulating_supply must be positive, got {}",
                self.market_cap.circulating_supply
            )));
        }
        if self.open_interest.symbol.is_empty() {
            return Err(Error::Config("open_interest.symbol must not be empty".into()));
        }
        Ok(())
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.poll.interval(), Duration::from_secs(30));
        assert!(cfg.poll.retry_delay() < cfg.poll.interval());
        assert_eq!(cfg.ratio.scale, 1e8);
        assert_eq!(cfg.open_interest.source, OpenInterestKind::Contracts);
        assert_eq!(cfg.market_cap.source, MarketCapKind::Coingecko);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = Config::from_toml_str(
            r#"
            [poll]
            interval_secs = 60

            [open_interest]
            source = "notional"

            [market_cap]
            source = "spot_supply"
            circulating_supply = 21000000.0

            [ratio]
            scale = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.poll.interval_secs, 60);
        assert_eq!(cfg.poll.retry_secs, 10);
        assert_eq!(cfg.open_interest.source, OpenInterestKind::Notional);
        assert_eq!(cfg.open_interest.symbol, "BTCUSDT");
        assert_eq!(cfg.market_cap.source, MarketCapKind::SpotSupply);
        assert_eq!(cfg.market_cap.circulating_supply, 21_000_000.0);
        assert_eq!(cfg.ratio.scale, 1.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_source_kind_is_rejected() {
        let err = Config::from_toml_str("[open_interest]\nsource = \"spot\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn zero_retry_delay_is_rejected() {
        let mut cfg = Config::default();
        cfg.poll.retry_secs = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn retry_longer_than_interval_is_rejected() {
        let mut cfg = Config::default();
        cfg.poll.retry_secs = cfg.poll.interval_secs + 1;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let mut cfg = Config::default();
        cfg.ratio.scale = 0.0;
        assert!(cfg.validate().is_err());
        cfg.ratio.scale = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_supply_only_matters_for_spot_supply_source() {
        let mut cfg = Config::default();
        cfg.market_cap.circulating_supply = 0.0;
        assert!(cfg.validate().is_ok());
        cfg.market_cap.source = MarketCapKind::SpotSupply;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn example_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/oi-signal.example.toml");
        let cfg = Config::from_file(path).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_file("/nonexistent/oi-signal.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
