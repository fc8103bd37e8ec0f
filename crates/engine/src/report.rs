//! Human-readable status lines written to the console sink.

use std::time::Duration;

use chrono::{DateTime, Utc};

use common::{Error, Signal, SignalReport, SourceFailure};

const RULE_WIDTH: usize = 50;

pub fn banner(interval: Duration, retry_delay: Duration) -> String {
    format!(
        "🚀 OI/MarketCap signal bot started: polling every {}s (retry after {}s)",
        interval.as_secs(),
        retry_delay.as_secs()
    )
}

pub fn cycle_header(cycle: u64, at: DateTime<Utc>) -> [String; 2] {
    [
        format!("⏰ {} (cycle #{cycle})", at.format("%Y-%m-%d %H:%M:%S UTC")),
        "-".repeat(RULE_WIDTH),
    ]
}

pub fn open_interest(source: &str, value: f64) -> String {
    format!("✓ Open interest ({source}): {}", group_thousands(value, 2))
}

pub fn market_cap(source: &str, value: f64) -> String {
    format!("✓ Market cap ({source}): ${}", group_thousands(value, 0))
}

pub fn fetch_failed(failure: &SourceFailure) -> String {
    format!("✗ {failure}")
}

pub fn skipped(retry_delay: Duration) -> String {
    format!(
        "⚠️ Data unavailable, retrying in {}s",
        retry_delay.as_secs()
    )
}

pub fn ratio(value: f64) -> String {
    format!("📊 OI/MarketCap ratio: {value:.6}")
}

pub fn baseline() -> String {
    "⏳ Baseline ratio stored, first signal on the next cycle".to_string()
}

pub fn cycle_failed(error: &Error) -> String {
    format!("❌ Cycle failed: {error}")
}

pub fn signal_block(report: &SignalReport) -> Vec<String> {
    let marker = match report.signal {
        Signal::Long => "🟢",
        Signal::Short => "🔴",
        Signal::Neutral => "⚪",
    };
    vec![
        "=".repeat(RULE_WIDTH),
        format!("SIGNAL: {marker} {}", report.signal),
        format!("Ratio change: {}", format_change(report)),
        format!("Previous ratio: {:.6}", report.previous),
        format!("Current ratio: {:.6}", report.current),
        "=".repeat(RULE_WIDTH),
    ]
}

/// Signed to four places; an unchanged ratio prints as a bare `0.0000%`.
pub fn format_change(report: &SignalReport) -> String {
    match report.signal {
        Signal::Neutral => format!("{:.4}%", report.change_pct.abs()),
        _ => format!("{:+.4}%", report.change_pct),
    }
}

/// `1234567.891` with 2 decimals becomes `1,234,567.89`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    if value.is_sign_negative() && value != 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FetchError;

    fn report(signal: Signal, previous: f64, current: f64, change_pct: f64) -> SignalReport {
        SignalReport {
            signal,
            previous,
            current,
            change_pct,
        }
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1_000.0, 0), "1,000");
        assert_eq!(group_thousands(2_000_000_000.0, 0), "2,000,000,000");
        assert_eq!(group_thousands(-12_345.5, 1), "-12,345.5");
        assert_eq!(group_thousands(0.0, 2), "0.00");
    }

    #[test]
    fn long_block_shows_signed_change() {
        let lines = signal_block(&report(Signal::Long, 1.0, 0.95, -5.000000000000004));
        assert_eq!(lines[1], "SIGNAL: 🟢 LONG");
        assert_eq!(lines[2], "Ratio change: -5.0000%");
        assert_eq!(lines[3], "Previous ratio: 1.000000");
        assert_eq!(lines[4], "Current ratio: 0.950000");
    }

    #[test]
    fn neutral_change_has_no_sign() {
        let r = report(Signal::Neutral, 1.0, 1.0, 0.0);
        assert_eq!(format_change(&r), "0.0000%");
    }

    #[test]
    fn short_change_has_plus_sign() {
        let r = report(Signal::Short, 1.0, 1.1, 10.0);
        assert_eq!(format_change(&r), "+10.0000%");
    }

    #[test]
    fn failure_line_names_the_source() {
        let failure = SourceFailure {
            source: "binance-oi".into(),
            error: FetchError::Timeout(10),
        };
        assert_eq!(
            fetch_failed(&failure),
            "✗ binance-oi: request timed out after 10s"
        );
    }

    #[test]
    fn quantity_lines_are_grouped() {
        assert_eq!(
            open_interest("binance-oi", 85_123.456),
            "✓ Open interest (binance-oi): 85,123.46"
        );
        assert_eq!(
            market_cap("coingecko", 1_317_802_988_326.25),
            "✓ Market cap (coingecko): $1,317,802,988,326"
        );
    }
}
