use common::{ComputationError, Signal};

/// `(open_interest * scale) / market_cap`.
///
/// Fails on a zero market cap and on any non-finite input or result, so a bad
/// upstream value never becomes a baseline.
pub fn compute_ratio(
    open_interest: f64,
    market_cap: f64,
    scale: f64,
) -> Result<f64, ComputationError> {
    if !open_interest.is_finite() {
        return Err(ComputationError::NonFinite("open interest"));
    }
    if !market_cap.is_finite() {
        return Err(ComputationError::NonFinite("market cap"));
    }
    if market_cap == 0.0 {
        return Err(ComputationError::ZeroDenominator("market cap"));
    }
    let ratio = (open_interest * scale) / market_cap;
    if !ratio.is_finite() {
        return Err(ComputationError::NonFinite("ratio"));
    }
    Ok(ratio)
}

/// Falling ratio is `Long`, rising ratio is `Short`, unchanged is `Neutral`.
pub fn classify(previous: f64, current: f64) -> Signal {
    if current < previous {
        Signal::Long
    } else if current > previous {
        Signal::Short
    } else {
        Signal::Neutral
    }
}

/// `(current - previous) / previous * 100`. Undefined for a zero baseline.
pub fn percent_change(previous: f64, current: f64) -> Result<f64, ComputationError> {
    if previous == 0.0 {
        return Err(ComputationError::ZeroDenominator("previous ratio"));
    }
    Ok((current - previous) / previous * 100.0)
}
