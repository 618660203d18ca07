//! Truth Labels for Detector-Level Jets
//!
//! Particle-flow jets carry no flavor of their own. Visible generator taus
//! are built from the tau decay products, then each seeded jet is matched to
//! the first still-unmatched tau near its seed:
//!
//! ```text
//!   tau products ──► group by tau index ──► Σ p4 ──► keep hadronic, p_T > 20, |η| < 2.5
//!                                                          │
//!   seeded jets ─────────────────────► ΔR(seed, tau) < 0.4 ┴──► flavor 15 or 0
//! ```

use super::event::TauProductRecord;
use super::jets::Jet;
use super::particles::{CHARGED_HADRON_CODE, TAU_CODE};
use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};

/// Visible part of a generator tau
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleTau {
    pub tau_index: usize,
    pub momentum: FourMomentum,
    /// At least one charged pion among the products
    pub hadronic: bool,
}

/// Builds visible taus and matches them to jets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TauMatcher {
    /// Visible taus must exceed this p_T
    pub min_pt: f64,
    /// Visible taus must satisfy |η| below this
    pub max_eta: f64,
    /// Seed-to-tau matching radius
    pub match_radius: f64,
}

impl Default for TauMatcher {
    fn default() -> Self {
        Self {
            min_pt: 20.0,
            max_eta: 2.5,
            match_radius: 0.4,
        }
    }
}

impl TauMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum the products of each tau, keeping only hadronic taus in acceptance
    ///
    /// Taus are returned in order of first appearance of their index.
    pub fn build_visible_taus(&self, products: &[TauProductRecord]) -> Vec<VisibleTau> {
        let mut taus: Vec<VisibleTau> = Vec::new();
        for product in products {
            let momentum = product.kinematics.to_four_momentum();
            let hadronic = product.pdg_id.abs() == CHARGED_HADRON_CODE;
            match taus.iter_mut().find(|t| t.tau_index == product.tau_index) {
                Some(tau) => {
                    tau.momentum += momentum;
                    tau.hadronic |= hadronic;
                }
                None => taus.push(VisibleTau {
                    tau_index: product.tau_index,
                    momentum,
                    hadronic,
                }),
            }
        }

        taus.retain(|t| {
            t.hadronic && t.momentum.pt() > self.min_pt && t.momentum.eta().abs() < self.max_eta
        });
        taus
    }

    /// For each jet, the index of the visible tau it is matched to
    ///
    /// Jets are visited in order; each takes the first unused tau within
    /// `match_radius` of its seed.
    pub fn match_to_jets(&self, jets: &[Jet], taus: &[VisibleTau]) -> Vec<Option<usize>> {
        let mut used = vec![false; taus.len()];
        jets.iter()
            .map(|jet| {
                let found = taus.iter().enumerate().position(|(k, tau)| {
                    !used[k] && jet.seed.momentum.delta_r(&tau.momentum) < self.match_radius
                });
                if let Some(k) = found {
                    used[k] = true;
                }
                found
            })
            .collect()
    }

    /// Flavor codes for `jets`: 15 when matched, 0 otherwise
    pub fn jet_flavors(&self, jets: &[Jet], products: &[TauProductRecord]) -> Vec<i32> {
        let taus = self.build_visible_taus(products);
        self.match_to_jets(jets, &taus)
            .into_iter()
            .map(|m| if m.is_some() { TAU_CODE } else { 0 })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
