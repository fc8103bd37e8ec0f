use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FetchError;

/// One successful poll: the derived ratio plus the quantities it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ratio: f64,
    /// Quantity A, as returned by the derivatives source.
    pub open_interest: f64,
    /// Quantity B, in USD.
    pub market_cap: f64,
    pub taken_at: DateTime<Utc>,
}

/// Direction implied by the ratio moving between two polls.
///
/// A falling ratio means leverage is leaving relative to market size, which is
/// read as bullish; a rising ratio the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Everything shown to the operator when a signal fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub signal: Signal,
    pub previous: f64,
    pub current: f64,
    /// `(current - previous) / previous * 100`.
    pub change_pct: f64,
}

/// A fetch that failed during a cycle, tagged with the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: String,
    pub error: FetchError,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// What a single poll cycle ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// First successful sample; stored as the baseline, no signal.
    Baseline(Sample),
    /// A baseline existed and the new sample was classified against it.
    Signalled { sample: Sample, report: SignalReport },
    /// At least one fetch failed; the baseline is untouched.
    Skipped { failures: Vec<SourceFailure> },
}

impl CycleOutcome {
    pub fn signal(&self) -> Option<Signal> {
        match self {
            CycleOutcome::Signalled { report, .. } => Some(report.signal),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped { .. })
    }
}

/// Running counters kept by the poller, readable through its handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollerStats {
    pub cycles: u64,
    pub signals: u64,
    pub skipped: u64,
    pub errors: u64,
    pub last_sample: Option<Sample>,
}

impl PollerStats {
    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Baseline(sample) => self.last_sample = Some(*sample),
            CycleOutcome::Signalled { sample, .. } => {
                self.signals += 1;
                self.last_sample = Some(*sample);
            }
            CycleOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.cycles += 1;
        self.errors += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ratio: f64) -> Sample {
        Sample {
            ratio,
            open_interest: 1.0,
            market_cap: 1.0,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn signal_display_is_uppercase() {
        assert_eq!(Signal::Long.to_string(), "LONG");
        assert_eq!(Signal::Short.to_string(), "SHORT");
        assert_eq!(Signal::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn stats_count_each_outcome_kind() {
        let mut stats = PollerStats::default();
        stats.record(&CycleOutcome::Baseline(sample(1.0)));
        stats.record(&CycleOutcome::Signalled {
            sample: sample(0.9),
            report: SignalReport {
                signal: Signal::Long,
                previous: 1.0,
                current: 0.9,
                change_pct: -10.0,
            },
        });
        stats.record(&CycleOutcome::Skipped { failures: vec![] });
        stats.record_error();

        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.signals, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.last_sample.map(|s| s.ratio), Some(0.9));
    }

    #[test]
    fn only_signalled_outcome_carries_a_signal() {
        assert_eq!(CycleOutcome::Baseline(sample(1.0)).signal(), None);
        assert!(CycleOutcome::Skipped { failures: vec![] }.is_skipped());
    }
}
