//! Candidate Pools for Hypothesis Testing
//!
//! Splits a jet's particles into the two pools the decay-mode hypotheses
//! draw from: up to five leading hadrons and the strips built from the
//! jet's electromagnetic candidates.

use super::jets::pt_descending_order;
use super::particles::{ParticleCandidate, ReconstructionMode};
use super::strips::{Strip, StripClusterer};
use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};

/// The hadron and strip pools of one jet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePools {
    /// Leading hadrons, p_T-descending
    pub hadrons: Vec<ParticleCandidate>,
    /// Strips, in seeding order
    pub strips: Vec<Strip>,
}

impl CandidatePools {
    pub fn is_empty(&self) -> bool {
        self.hadrons.is_empty() && self.strips.is_empty()
    }
}

/// Builds [`CandidatePools`] from a jet's particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateGenerator {
    /// Hadrons must exceed this p_T
    pub hadron_pt_cut: f64,
    /// Electrons and photons must exceed this p_T
    pub em_pt_cut: f64,
    /// Maximum hadrons kept
    pub max_hadrons: usize,
    pub mode: ReconstructionMode,
    pub clusterer: StripClusterer,
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self {
            hadron_pt_cut: 0.0,
            em_pt_cut: 0.0,
            max_hadrons: 5,
            mode: ReconstructionMode::Generator,
            clusterer: StripClusterer::default(),
        }
    }
}

impl CandidateGenerator {
    pub fn new(hadron_pt_cut: f64, em_pt_cut: f64, mode: ReconstructionMode) -> Self {
        Self {
            hadron_pt_cut,
            em_pt_cut,
            mode,
            ..Self::default()
        }
    }

    pub fn with_clusterer(mut self, clusterer: StripClusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    /// Partition `particles` into hadron and strip pools
    pub fn generate(&self, particles: &[ParticleCandidate]) -> CandidatePools {
        let order = pt_descending_order(particles);

        let hadrons: Vec<ParticleCandidate> = order
            .iter()
            .map(|&k| particles[k])
            .filter(|p| p.kind.is_hadron(self.mode) && p.pt() > self.hadron_pt_cut)
            .take(self.max_hadrons)
            .collect();

        let electromagnetic: Vec<FourMomentum> = order
            .iter()
            .map(|&k| particles[k])
            .filter(|p| p.kind.is_electromagnetic() && p.pt() > self.em_pt_cut)
            .map(|p| p.momentum)
            .collect();

        CandidatePools {
            hadrons,
            strips: self.clusterer.cluster(&electromagnetic),
        }
    }
}

/// Whether the jet looks like a leptonic tau decay
///
/// True when the jet carries leptons other than electrons but no electrons,
/// or an odd number of electrons (a conversion pair comes in twos).
pub fn is_leptonic_decay(particles: &[ParticleCandidate]) -> bool {
    let (electrons, others) = particles
        .iter()
        .filter(|p| p.kind.is_lepton())
        .fold((0usize, 0usize), |(e, o), p| {
            if p.kind.is_electron() {
                (e + 1, o)
            } else {
                (e, o + 1)
            }
        });

    if electrons == 0 {
        return others != 0;
    }
    electrons % 2 != 0
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
