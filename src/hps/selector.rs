//! Hypothesis Selection
//!
//! Picks one interpretation per jet: the hypothesis with the largest
//! combined p_T across all topologies. Ties keep the earliest hypothesis,
//! which (given the engine's ordering) means the lowest topology id.

use super::hypotheses::DecayHypothesis;
use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};

/// Isolation assigned to jets that no topology could interpret
pub const UNRESOLVED_ISOLATION: f64 = 1000.0;

/// Outcome of selecting among a jet's hypotheses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Best hypothesis, above the candidate p_T threshold
    Resolved(DecayHypothesis),
    /// Best hypothesis exists but its combined p_T is too low to be a candidate
    BelowThreshold(DecayHypothesis),
    /// No hypothesis; the raw jet is hard enough to report as an unresolved candidate
    Unresolved(FourMomentum),
    /// No hypothesis and a soft jet: nothing to report
    Empty,
}

impl Selection {
    pub fn hypothesis(&self) -> Option<&DecayHypothesis> {
        match self {
            Selection::Resolved(h) | Selection::BelowThreshold(h) => Some(h),
            Selection::Unresolved(_) | Selection::Empty => None,
        }
    }

    /// Whether this selection yields a classified candidate
    pub fn produces_candidate(&self) -> bool {
        matches!(self, Selection::Resolved(_) | Selection::Unresolved(_))
    }
}

/// Selects the best hypothesis for a jet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selector {
    /// Candidates (and unresolved jets) must exceed this p_T
    pub min_pt: f64,
}

impl Default for Selector {
    fn default() -> Self {
        Self { min_pt: 20.0 }
    }
}

impl Selector {
    pub fn new(min_pt: f64) -> Self {
        Self { min_pt }
    }

    /// Decide what a jet contributes, given its hypotheses and raw momentum
    pub fn select(&self, hypotheses: &[DecayHypothesis], raw_jet: &FourMomentum) -> Selection {
        match select_best(hypotheses) {
            Some(best) if best.pt() > self.min_pt => Selection::Resolved(best.clone()),
            Some(best) => Selection::BelowThreshold(best.clone()),
            None if raw_jet.pt() > self.min_pt => Selection::Unresolved(*raw_jet),
            None => Selection::Empty,
        }
    }
}

/// Hypothesis with the maximum combined p_T; the first wins ties
pub fn select_best(hypotheses: &[DecayHypothesis]) -> Option<&DecayHypothesis> {
    hypotheses.iter().fold(None, |best, h| match best {
        Some(b) if b.pt() >= h.pt() => Some(b),
        _ => Some(h),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hps::hypotheses::Topology;

    fn hypothesis(topology: Topology, pt: f64) -> DecayHypothesis {
        let momentum = FourMomentum::from_pt_eta_phi_m(pt, 0.0, 0.0, 1.0);
        DecayHypothesis {
            topology,
            scalar_pt_sum: pt,
            momentum,
            constituents: vec![momentum],
        }
    }

    #[test]
    fn test_picks_highest_pt() {
        let guesses = vec![
            hypothesis(Topology::ThreeProng, 25.0),
            hypothesis(Topology::OneProngOneStrip, 40.0),
            hypothesis(Topology::OneProng, 30.0),
        ];
        let best = select_best(&guesses).unwrap();
        assert_eq!(best.topology, Topology::OneProngOneStrip);
    }

    #[test]
    fn test_ties_keep_topology_order() {
        let guesses = vec![
            hypothesis(Topology::OneProngTwoStrips, 30.0),
            hypothesis(Topology::OneProngOneStrip, 30.0),
        ];
        let best = select_best(&guesses).unwrap();
        assert_eq!(best.topology, Topology::OneProngTwoStrips);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let guesses = vec![
            hypothesis(Topology::ThreeProng, 22.0),
            hypothesis(Topology::OneProngOneStrip, 35.0),
            hypothesis(Topology::OneProngOneStrip, 35.0),
        ];
        let selector = Selector::default();
        let raw = FourMomentum::from_pt_eta_phi_m(50.0, 0.0, 0.0, 5.0);
        let first = selector.select(&guesses, &raw);
        let second = selector.select(&guesses, &raw);
        assert_eq!(first, second);
        assert!(std::ptr::eq(
            select_best(&guesses).unwrap(),
            select_best(&guesses).unwrap()
        ));
        assert!(std::ptr::eq(select_best(&guesses).unwrap(), &guesses[1]));
    }

    #[test]
    fn test_fallbacks() {
        let selector = Selector::default();
        let hard = FourMomentum::from_pt_eta_phi_m(45.0, 0.0, 0.0, 5.0);
        let soft = FourMomentum::from_pt_eta_phi_m(15.0, 0.0, 0.0, 5.0);

        assert_eq!(selector.select(&[], &hard), Selection::Unresolved(hard));
        assert_eq!(selector.select(&[], &soft), Selection::Empty);

        let low = vec![hypothesis(Topology::OneProng, 12.0)];
        let selection = selector.select(&low, &hard);
        assert!(matches!(selection, Selection::BelowThreshold(_)));
        assert!(!selection.produces_candidate());
        assert!(selection.hypothesis().is_some());
    }
}
