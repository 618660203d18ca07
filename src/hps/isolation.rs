//! Isolation-Based Classification
//!
//! A genuine tau decays into a narrow, isolated spray; a QCD jet carries
//! extra activity around its core. The isolation of a candidate is the
//! activity in a ΔR < 0.4 cone beyond the candidate's own constituents,
//! relative to the candidate's p_T:
//!
//! ```text
//!   iso = (Σ p_T(references in cone) − scalar p_T sum) / combined p_T
//! ```
//!
//! Candidates with `iso` above the working-point cutoff are background.

use super::hypotheses::DecayHypothesis;
use super::particles::ParticleCandidate;
use crate::{TauError, TauResult};
use serde::{Deserialize, Serialize};

/// Isolation value and decision for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationOutcome {
    pub isolation: f64,
    pub is_signal: bool,
}

/// Computes isolation and applies the working-point cutoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationClassifier {
    /// Isolation cone radius
    pub cone_radius: f64,
    /// References are only summed for candidates harder than this
    pub min_candidate_pt: f64,
    /// Working point; `None` accepts every candidate
    pub cutoff: Option<f64>,
}

impl Default for IsolationClassifier {
    fn default() -> Self {
        Self {
            cone_radius: 0.4,
            min_candidate_pt: 0.5,
            cutoff: None,
        }
    }
}

impl IsolationClassifier {
    pub fn new(cutoff: Option<f64>) -> Self {
        Self {
            cutoff,
            ..Self::default()
        }
    }

    /// Σ p_T of qualifying references inside the cone around the candidate
    pub fn nearby_pt(&self, hypothesis: &DecayHypothesis, references: &[ParticleCandidate]) -> f64 {
        if hypothesis.pt() <= self.min_candidate_pt {
            return 0.0;
        }
        references
            .iter()
            .filter(|r| r.is_isolation_reference())
            .filter(|r| hypothesis.momentum.delta_r(&r.momentum) < self.cone_radius)
            .map(ParticleCandidate::pt)
            .sum()
    }

    /// Relative isolation of the candidate
    pub fn isolation(
        &self,
        hypothesis: &DecayHypothesis,
        references: &[ParticleCandidate],
    ) -> TauResult<f64> {
        let pt = hypothesis.pt();
        if pt <= 0.0 || !pt.is_finite() {
            return Err(TauError::DegenerateVector("isolation of a zero-pT candidate"));
        }
        Ok(relative_isolation(
            self.nearby_pt(hypothesis, references),
            hypothesis.scalar_pt_sum,
            pt,
        ))
    }

    /// Whether an isolation value passes the working point
    pub fn passes(&self, isolation: f64) -> bool {
        match self.cutoff {
            Some(cutoff) => !(isolation > cutoff),
            None => true,
        }
    }

    /// Isolation plus accept/reject decision
    pub fn classify(
        &self,
        hypothesis: &DecayHypothesis,
        references: &[ParticleCandidate],
    ) -> TauResult<IsolationOutcome> {
        let isolation = self.isolation(hypothesis, references)?;
        Ok(IsolationOutcome {
            isolation,
            is_signal: self.passes(isolation),
        })
    }
}

/// (nearby − own) / combined
pub fn relative_isolation(nearby_pt: f64, scalar_pt_sum: f64, combined_pt: f64) -> f64 {
    (nearby_pt - scalar_pt_sum) / combined_pt
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hps::hypotheses::Topology;
    use crate::hps::vector::FourMomentum;

    fn one_prong(pt: f64) -> DecayHypothesis {
        let momentum = FourMomentum::from_pt_eta_phi_m(pt, 0.0, 0.0, 0.13957);
        DecayHypothesis {
            topology: Topology::OneProng,
            scalar_pt_sum: pt,
            momentum,
            constituents: vec![momentum],
        }
    }

    fn reference(pdg: i32, charge: i32, pt: f64, eta: f64, phi: f64) -> ParticleCandidate {
        ParticleCandidate::from_pdg(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0), pdg, charge)
    }

    #[test]
    fn test_empty_references_give_minus_one() {
        let classifier = IsolationClassifier::default();
        let outcome = classifier.classify(&one_prong(30.0), &[]).unwrap();
        assert!((outcome.isolation + 1.0).abs() < 1e-12);
        assert!(outcome.is_signal);
    }

    #[test]
    fn test_sums_only_qualifying_references_in_cone() {
        let references = vec![
            reference(211, 1, 30.0, 0.0, 0.0),  // the candidate itself
            reference(22, 0, 3.0, 0.1, 0.1),    // photon in cone
            reference(130, 0, 5.0, 0.1, 0.0),   // neutral hadron: ignored
            reference(-211, -1, 2.0, 0.5, 0.0), // outside cone
            reference(11, -1, 4.0, 0.0, 0.1),   // electron: ignored
        ];
        let classifier = IsolationClassifier::default();
        let nearby = classifier.nearby_pt(&one_prong(30.0), &references);
        assert!((nearby - 33.0).abs() < 1e-9);
        let iso = classifier.isolation(&one_prong(30.0), &references).unwrap();
        assert!((iso - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_cutoff_rejects_busy_candidates() {
        let references = vec![
            reference(211, 1, 30.0, 0.0, 0.0),
            reference(211, 1, 15.0, 0.2, 0.0),
        ];
        let tight = IsolationClassifier::new(Some(0.2));
        let outcome = tight.classify(&one_prong(30.0), &references).unwrap();
        assert!((outcome.isolation - 0.5).abs() < 1e-6);
        assert!(!outcome.is_signal);

        let loose = IsolationClassifier::new(None);
        assert!(loose.classify(&one_prong(30.0), &references).unwrap().is_signal);
    }

    #[test]
    fn test_isolation_monotonic_in_nearby_pt() {
        let mut previous = f64::NEG_INFINITY;
        for i in 0..20 {
            let iso = relative_isolation(i as f64 * 1.5, 25.0, 30.0);
            assert!(iso >= previous);
            previous = iso;
        }
    }

    #[test]
    fn test_zero_pt_candidate_is_degenerate() {
        let hypothesis = DecayHypothesis {
            topology: Topology::OneProng,
            scalar_pt_sum: 0.0,
            momentum: FourMomentum::new(1.0, 0.0, 0.0, 1.0),
            constituents: vec![],
        };
        let err = IsolationClassifier::default()
            .classify(&hypothesis, &[])
            .unwrap_err();
        assert!(matches!(err, TauError::DegenerateVector(_)));
    }

    #[test]
    fn test_soft_candidate_skips_reference_sum() {
        let references = vec![reference(211, 1, 3.0, 0.0, 0.0)];
        let classifier = IsolationClassifier::default();
        assert_eq!(classifier.nearby_pt(&one_prong(0.4), &references), 0.0);
    }
}
