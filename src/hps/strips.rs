//! Strip Clustering of Electromagnetic Candidates
//!
//! Photons from π⁰ decays convert in the tracker material and spread out in
//! φ (the magnetic field bends the e⁺e⁻ pairs) while staying narrow in η.
//! A "strip" merges such deposits into one pseudo-particle:
//!
//! ```text
//!         η ▲
//!           │      ┌───────────────────────┐  ±0.025 in η
//!           │      │  ●     ●  ●      ●    │  |Δφ| < 0.10
//!           │      └───────────────────────┘
//!           └──────────────────────────────────────► φ
//! ```
//!
//! Clustering is greedy: the strip axis is recomputed (p_T-weighted η, φ)
//! after every absorption, so the result depends on the visiting order.
//! In the default non-exclusive mode a candidate absorbed by one strip can
//! still seed, or join, a later strip.

use super::vector::{normalize_angle, FourMomentum};
use serde::{Deserialize, Serialize};

/// A merged electromagnetic pseudo-particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    /// Strip four-momentum (summed p_T and E, weighted η and φ)
    pub momentum: FourMomentum,
    /// Indices of the absorbed candidates; the first is the seed
    pub constituents: Vec<usize>,
}

impl Strip {
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }
}

/// Greedy strip builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripClusterer {
    /// Only the leading candidates are considered
    pub max_candidates: usize,
    /// Half-width of the η window around the running strip axis
    pub eta_half_width: f64,
    /// Maximum |Δφ| to the running strip axis
    pub max_delta_phi: f64,
    /// Strips must exceed this p_T to be emitted
    pub min_pt: f64,
    /// Absorbed candidates are unavailable to later strips
    pub exclusive: bool,
}

impl Default for StripClusterer {
    fn default() -> Self {
        Self {
            max_candidates: 6,
            eta_half_width: 0.025,
            max_delta_phi: 0.10,
            min_pt: 2.5,
            exclusive: false,
        }
    }
}

impl StripClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive variant: each candidate contributes to at most one strip
    pub fn exclusive() -> Self {
        Self {
            exclusive: true,
            ..Self::default()
        }
    }

    /// Build strips from p_T-descending electromagnetic four-vectors
    ///
    /// The input is never modified; strip kinematics are always recomputed
    /// from the original candidates.
    pub fn cluster(&self, candidates: &[FourMomentum]) -> Vec<Strip> {
        let window = candidates.len().min(self.max_candidates);
        let mut absorbed = vec![false; window];
        let mut strips = Vec::new();

        for i in 0..window {
            if self.exclusive && absorbed[i] {
                continue;
            }

            let mut constituents = vec![i];
            let mut axis = candidates[i];

            for j in (i + 1)..window {
                if self.exclusive && absorbed[j] {
                    continue;
                }
                if self.accepts(&axis, &candidates[j]) {
                    constituents.push(j);
                    axis = merge(candidates, &constituents);
                }
            }

            if self.exclusive {
                for &k in &constituents {
                    absorbed[k] = true;
                }
            }

            if axis.pt() > self.min_pt {
                strips.push(Strip {
                    momentum: axis,
                    constituents,
                });
            }
        }

        strips
    }

    /// Whether `candidate` lies inside the η-φ window around `axis`
    fn accepts(&self, axis: &FourMomentum, candidate: &FourMomentum) -> bool {
        let eta = axis.eta();
        let candidate_eta = candidate.eta();
        eta - self.eta_half_width < candidate_eta
            && candidate_eta < eta + self.eta_half_width
            && candidate.delta_phi(axis).abs() < self.max_delta_phi
    }
}

/// Strip four-vector for the given constituents
///
/// φ is averaged relative to the seed so strips straddling ±π stay intact.
fn merge(candidates: &[FourMomentum], constituents: &[usize]) -> FourMomentum {
    let seed = candidates[constituents[0]];
    let seed_phi = seed.phi();

    let mut total_pt = 0.0;
    let mut total_e = 0.0;
    let mut weighted_eta = 0.0;
    let mut weighted_dphi = 0.0;
    for &k in constituents {
        let c = &candidates[k];
        let pt = c.pt();
        total_pt += pt;
        total_e += c.energy();
        weighted_eta += c.eta() * pt;
        weighted_dphi += normalize_angle(c.phi() - seed_phi) * pt;
    }

    if total_pt <= 0.0 {
        return seed;
    }

    FourMomentum::from_pt_eta_phi_e(
        total_pt,
        weighted_eta / total_pt,
        normalize_angle(seed_phi + weighted_dphi / total_pt),
        total_e,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn photon(pt: f64, eta: f64, phi: f64) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0)
    }

    #[test]
    fn test_merges_candidates_in_window() {
        let candidates = vec![photon(6.0, 0.5, 1.0), photon(3.0, 0.51, 1.05)];
        let strips = StripClusterer::new().cluster(&candidates);

        // Seed 0 absorbs 1; seed 1 alone is above 2.5 and also emitted
        assert_eq!(strips.len(), 2);
        let strip = &strips[0];
        assert_eq!(strip.constituents, vec![0, 1]);
        assert!((strip.pt() - 9.0).abs() < 1e-9);
        assert!((strip.momentum.eta() - (0.5 * 6.0 + 0.51 * 3.0) / 9.0).abs() < 1e-9);
        assert!((strip.momentum.phi() - (1.0 * 6.0 + 1.05 * 3.0) / 9.0).abs() < 1e-9);
        let energy = candidates[0].energy() + candidates[1].energy();
        assert!((strip.momentum.energy() - energy).abs() < 1e-9);
    }

    #[test]
    fn test_exclusive_mode_consumes_members() {
        let candidates = vec![photon(6.0, 0.5, 1.0), photon(3.0, 0.51, 1.05)];
        let strips = StripClusterer::exclusive().cluster(&candidates);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].constituents, vec![0, 1]);
    }

    #[test]
    fn test_rejects_outside_eta_window() {
        let candidates = vec![photon(6.0, 0.5, 1.0), photon(3.0, 0.53, 1.0)];
        let strips = StripClusterer::new().cluster(&candidates);
        assert_eq!(strips.len(), 2);
        assert!(strips.iter().all(|s| s.constituents.len() == 1));
    }

    #[test]
    fn test_rejects_outside_phi_window_on_either_side() {
        let candidates = vec![
            photon(6.0, 0.5, 1.0),
            photon(3.0, 0.5, 1.2),
            photon(3.0, 0.5, 0.8),
        ];
        let strips = StripClusterer::new().cluster(&candidates);
        assert!(strips.iter().all(|s| s.constituents.len() == 1));
    }

    #[test]
    fn test_soft_strips_dropped() {
        let candidates = vec![photon(2.0, 0.0, 0.0), photon(1.0, 1.0, 1.0)];
        assert!(StripClusterer::new().cluster(&candidates).is_empty());
    }

    #[test]
    fn test_only_leading_six_considered() {
        let mut candidates: Vec<FourMomentum> =
            (0..8).map(|i| photon(10.0 - i as f64, i as f64 * 0.5, 0.0)).collect();
        candidates[7] = photon(3.0, 0.0, 0.0);
        let strips = StripClusterer::new().cluster(&candidates);
        assert_eq!(strips.len(), 6);
        assert!(strips.iter().all(|s| s.constituents.iter().all(|&k| k < 6)));
    }

    #[test]
    fn test_axis_wraps_across_pi() {
        let candidates = vec![photon(5.0, 0.0, PI - 0.02), photon(5.0, 0.0, -PI + 0.02)];
        let strips = StripClusterer::exclusive().cluster(&candidates);
        assert_eq!(strips.len(), 1);
        assert!((strips[0].momentum.phi().abs() - PI).abs() < 1e-6);
    }

    #[test]
    fn test_input_unchanged() {
        let candidates = vec![photon(6.0, 0.5, 1.0), photon(3.0, 0.51, 1.05)];
        let before = candidates.clone();
        let _ = StripClusterer::new().cluster(&candidates);
        assert_eq!(candidates, before);
    }
}
