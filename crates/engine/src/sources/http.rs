use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::config::HttpConfig;
use common::{Error, FetchError, Result};

/// Longest slice of an error body carried into a `FetchError::Status`.
const MAX_ERROR_BODY: usize = 256;

/// Shared HTTP plumbing for every source: one client, one timeout, JSON in.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    timeout_secs: u64,
}

impl RestClient {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .user_agent(cfg.user_agent.as_str())
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            timeout_secs: cfg.timeout_secs,
        })
    }

    /// GET `url` with `query` and parse the body as untyped JSON.
    /// Any non-2xx status is an error regardless of the body.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        debug!(url, ?query, "GET");
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Read a non-negative number at `path` inside `value`.
///
/// Exchanges send quantities either as JSON numbers or as decimal strings;
/// both are accepted.
pub fn number_at(value: &Value, path: &[&str]) -> Result<f64, FetchError> {
    let mut node = value;
    for key in path {
        node = match node {
            Value::Object(map) => map
                .get(*key)
                .ok_or_else(|| FetchError::MissingField(path.join(".")))?,
            other => {
                return Err(FetchError::Malformed(format!(
                    "expected object at '{key}', got {}",
                    kind(other)
                )))
            }
        };
    }

    let number = match node {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        FetchError::Malformed(format!("'{}' is not numeric: {node}", path.join(".")))
    })?;

    if !number.is_finite() || number < 0.0 {
        return Err(FetchError::Malformed(format!(
            "'{}' out of range: {number}",
            path.join(".")
        )));
    }
    Ok(number)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
