use chrono::{DateTime, Utc};
use tracing::debug;

use common::{ComputationError, CycleOutcome, Sample, SignalReport};

use crate::ratio::{classify, compute_ratio, percent_change};

/// Holds the single previous-ratio slot and turns fresh quantities into
/// cycle outcomes.
///
/// The slot starts empty, is filled by the first successful sample and is
/// overwritten by every later one. Nothing else clears it.
#[derive(Debug, Clone)]
pub struct RatioEvaluator {
    scale: f64,
    previous: Option<f64>,
}

impl RatioEvaluator {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            previous: None,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The stored baseline, if any sample has been taken yet.
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Compute the ratio for one pair of quantities and compare it to the
    /// stored baseline.
    ///
    /// A ratio that cannot be computed leaves the baseline untouched. Once a
    /// ratio exists it always replaces the baseline, even when the percent
    /// change against a zero baseline then fails.
    pub fn evaluate(
        &mut self,
        open_interest: f64,
        market_cap: f64,
        taken_at: DateTime<Utc>,
    ) -> Result<CycleOutcome, ComputationError> {
        let ratio = compute_ratio(open_interest, market_cap, self.scale)?;
        let sample = Sample {
            ratio,
            open_interest,
            market_cap,
            taken_at,
        };

        match self.previous.replace(ratio) {
            None => {
                debug!(ratio, "Baseline ratio stored");
                Ok(CycleOutcome::Baseline(sample))
            }
            Some(previous) => {
                let change_pct = percent_change(previous, ratio)?;
                let report = SignalReport {
                    signal: classify(previous, ratio),
                    previous,
                    current: ratio,
                    change_pct,
                };
                debug!(previous, current = ratio, signal = %report.signal, "Ratio classified");
                Ok(CycleOutcome::Signalled { sample, report })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Signal;

    fn evaluator() -> RatioEvaluator {
        RatioEvaluator::new(1.0)
    }

    #[test]
    fn first_sample_is_baseline_only() {
        let mut ev = RatioEvaluator::new(1e8);
        let outcome = ev.evaluate(50_000.0, 2_000_000_000.0, Utc::now()).unwrap();

        match outcome {
            CycleOutcome::Baseline(sample) => assert!((sample.ratio - 2_500.0).abs() < 1e-9),
            other => panic!("expected baseline, got {other:?}"),
        }
        assert_eq!(ev.previous(), Some(2_500.0));
    }

    #[test]
    fn falling_ratio_signals_long() {
        let mut ev = evaluator();
        ev.evaluate(1.0, 1.0, Utc::now()).unwrap();
        let outcome = ev.evaluate(0.95, 1.0, Utc::now()).unwrap();

        let CycleOutcome::Signalled { report, .. } = outcome else {
            panic!("expected signal, got {outcome:?}");
        };
        assert_eq!(report.signal, Signal::Long);
        assert_eq!(format!("{:.6}", report.previous), "1.000000");
        assert_eq!(format!("{:.6}", report.current), "0.950000");
        assert_eq!(format!("{:+.4}", report.change_pct), "-5.0000");
        assert_eq!(ev.previous(), Some(0.95));
    }

    #[test]
    fn unchanged_ratio_signals_neutral() {
        let mut ev = evaluator();
        ev.evaluate(1.0, 1.0, Utc::now()).unwrap();
        let outcome = ev.evaluate(1.0, 1.0, Utc::now()).unwrap();

        assert_eq!(outcome.signal(), Some(Signal::Neutral));
        let CycleOutcome::Signalled { report, .. } = outcome else {
            unreachable!()
        };
        assert_eq!(format!("{:.4}", report.change_pct), "0.0000");
    }

    #[test]
    fn rising_ratio_signals_short() {
        let mut ev = evaluator();
        ev.evaluate(1.0, 1.0, Utc::now()).unwrap();
        let outcome = ev.evaluate(1.2, 1.0, Utc::now()).unwrap();
        assert_eq!(outcome.signal(), Some(Signal::Short));
    }

    #[test]
    fn each_signal_compares_against_the_immediately_preceding_sample() {
        let mut ev = evaluator();
        ev.evaluate(1.0, 1.0, Utc::now()).unwrap();
        ev.evaluate(2.0, 1.0, Utc::now()).unwrap();
        let outcome = ev.evaluate(1.5, 1.0, Utc::now()).unwrap();
        // 1.5 is above the first sample but below the second.
        assert_eq!(outcome.signal(), Some(Signal::Long));
    }

    #[test]
    fn zero_market_cap_keeps_previous_baseline() {
        let mut ev = evaluator();
        ev.evaluate(1.0, 1.0, Utc::now()).unwrap();

        let err = ev.evaluate(1.0, 0.0, Utc::now()).unwrap_err();
        assert_eq!(err, ComputationError::ZeroDenominator("market cap"));
        assert_eq!(ev.previous(), Some(1.0));
    }

    #[test]
    fn zero_baseline_reports_error_but_is_replaced() {
        let mut ev = evaluator();
        ev.evaluate(0.0, 1.0, Utc::now()).unwrap();
        assert_eq!(ev.previous(), Some(0.0));

        let err = ev.evaluate(0.5, 1.0, Utc::now()).unwrap_err();
        assert_eq!(err, ComputationError::ZeroDenominator("previous ratio"));
        assert_eq!(ev.previous(), Some(0.5));

        let outcome = ev.evaluate(0.4, 1.0, Utc::now()).unwrap();
        assert_eq!(outcome.signal(), Some(Signal::Long));
    }
}
