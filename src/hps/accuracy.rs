//! Running Accuracy Bookkeeping
//!
//! Six counters compared against truth labels. The tracker is a plain value:
//! each per-jet classification returns its own contribution and callers fold
//! them together, so serial and parallel runs produce identical sums.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Signal/background accuracy counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyTracker {
    pub correct: u64,
    pub total: u64,
    pub signal_identified: u64,
    pub signal_total: u64,
    pub background_identified: u64,
    pub background_total: u64,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one considered jet
    ///
    /// Only jets with `raw_pt > min_pt` enter the signal/background tallies;
    /// `total` counts every call.
    pub fn record(&mut self, truth_is_tau: bool, raw_pt: f64, predicted_signal: bool, min_pt: f64) {
        self.total += 1;
        if !(raw_pt > min_pt) {
            return;
        }

        if truth_is_tau {
            self.signal_total += 1;
            if predicted_signal {
                self.correct += 1;
                self.signal_identified += 1;
            }
        } else {
            self.background_total += 1;
            if !predicted_signal {
                self.correct += 1;
                self.background_identified += 1;
            }
        }
    }

    /// Tracker holding a single jet's contribution
    pub fn single(truth_is_tau: bool, raw_pt: f64, predicted_signal: bool, min_pt: f64) -> Self {
        let mut tracker = Self::new();
        tracker.record(truth_is_tau, raw_pt, predicted_signal, min_pt);
        tracker
    }

    pub fn merge(&mut self, other: &Self) {
        self.correct += other.correct;
        self.total += other.total;
        self.signal_identified += other.signal_identified;
        self.signal_total += other.signal_total;
        self.background_identified += other.background_identified;
        self.background_total += other.background_total;
    }

    /// correct / total
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.correct, self.total)
    }

    /// signal identified / signal total
    pub fn efficiency(&self) -> Option<f64> {
        ratio(self.signal_identified, self.signal_total)
    }

    /// 1 − background identified / background total
    pub fn false_positive_rate(&self) -> Option<f64> {
        ratio(self.background_identified, self.background_total).map(|r| 1.0 - r)
    }

    /// Counter invariants: no "identified" count exceeds its total
    pub fn is_consistent(&self) -> bool {
        self.correct <= self.total
            && self.signal_identified <= self.signal_total
            && self.background_identified <= self.background_total
            && self.signal_total + self.background_total <= self.total
    }

    pub fn summary(&self) -> String {
        format!(
            "accuracy: {} ({}/{}), efficiency: {} ({}/{}), false positive rate: {} ({}/{} rejected)",
            format_rate(self.accuracy()),
            self.correct,
            self.total,
            format_rate(self.efficiency()),
            self.signal_identified,
            self.signal_total,
            format_rate(self.false_positive_rate()),
            self.background_identified,
            self.background_total,
        )
    }
}

impl AddAssign for AccuracyTracker {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

impl Add for AccuracyTracker {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.merge(&rhs);
        self
    }
}

impl std::iter::Sum for AccuracyTracker {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), Add::add)
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.4}", r),
        None => "n/a".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
