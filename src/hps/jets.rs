//! Seeded-Cone Jet Finder
//!
//! Groups particle-flow candidates into jets around high-p_T charged-hadron
//! seeds:
//!
//! ```text
//!   candidates ──► sort by p_T (desc, stable) ──► for each unused seed:
//!                                                    ├─ charged hadron, |η| < 2.5
//!                                                    ├─ take every unused candidate with ΔR < 0.4
//!                                                    └─ keep jet if Σp_T (vector) > 20
//!                                                 stop after 5 jets
//! ```
//!
//! Members of a discarded jet stay claimed, so a particle belongs to at most
//! one cone per event whether or not that cone survives the p_T cut.

use super::particles::{ParticleCandidate, ParticleKind};
use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A reconstructed jet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jet {
    /// Position in the event's jet list
    pub index: usize,
    /// Seed candidate
    pub seed: ParticleCandidate,
    /// Member candidates, in descending p_T order (the seed is first)
    pub members: Vec<ParticleCandidate>,
    /// Indices of the members in the input candidate list
    pub member_indices: Vec<usize>,
    /// Vector sum of the members
    pub momentum: FourMomentum,
}

impl Jet {
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    pub fn n_constituents(&self) -> usize {
        self.members.len()
    }
}

/// Seeded-cone jet finder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetSeeder {
    /// Cone radius in ΔR
    pub cone_radius: f64,
    /// Minimum vector-sum p_T for a jet to be kept (strict)
    pub min_pt: f64,
    /// Maximum number of jets per event
    pub max_jets: usize,
    /// Seeds must satisfy |η| below this
    pub max_seed_eta: f64,
}

impl Default for JetSeeder {
    fn default() -> Self {
        Self {
            cone_radius: 0.4,
            min_pt: 20.0,
            max_jets: 5,
            max_seed_eta: 2.5,
        }
    }
}

impl JetSeeder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster an event's candidates into at most `max_jets` jets
    ///
    /// Jets are returned in seeding order, i.e. by descending seed p_T.
    pub fn seed_jets(&self, candidates: &[ParticleCandidate]) -> Vec<Jet> {
        let order = pt_descending_order(candidates);
        let mut used = vec![false; candidates.len()];
        let mut jets = Vec::new();

        for &seed_idx in &order {
            if jets.len() >= self.max_jets {
                break;
            }
            if used[seed_idx] || !self.is_seed(&candidates[seed_idx]) {
                continue;
            }

            let seed = candidates[seed_idx];
            let member_indices = self.collect_cone(&seed, candidates, &order, &used);
            for &k in &member_indices {
                used[k] = true;
            }

            let members: Vec<ParticleCandidate> =
                member_indices.iter().map(|&k| candidates[k]).collect();
            let momentum: FourMomentum = members.iter().map(|m| m.momentum).sum();

            if momentum.pt() > self.min_pt {
                let jet = Jet {
                    index: jets.len(),
                    seed,
                    members,
                    member_indices,
                    momentum,
                };
                log::trace!(
                    "jet {} seeded at pT={:.2} with {} members, pT={:.2}",
                    jet.index,
                    seed.pt(),
                    jet.n_constituents(),
                    jet.pt()
                );
                jets.push(jet);
            }
        }

        jets
    }

    /// Seed criteria: charged hadron inside the tracker acceptance
    fn is_seed(&self, candidate: &ParticleCandidate) -> bool {
        candidate.kind == ParticleKind::ChargedHadron && candidate.eta().abs() < self.max_seed_eta
    }

    /// Unused candidates inside the cone, visited in `order`
    fn collect_cone(
        &self,
        seed: &ParticleCandidate,
        candidates: &[ParticleCandidate],
        order: &[usize],
        used: &[bool],
    ) -> Vec<usize> {
        order
            .iter()
            .copied()
            .filter(|&k| !used[k])
            .filter(|&k| seed.momentum.delta_r(&candidates[k].momentum) < self.cone_radius)
            .collect()
    }
}

/// Indices sorted by descending p_T; ties keep input order
pub fn pt_descending_order(candidates: &[ParticleCandidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .pt()
            .partial_cmp(&candidates[a].pt())
            .unwrap_or(Ordering::Equal)
    });
    order
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
