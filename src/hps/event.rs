//! Event Input Records
//!
//! Fixed-shape records produced by an external event reader. Two encodings
//! are accepted:
//!
//! - [`EventRecord`]: one record per object (jets, particles, isolation
//!   references, optional particle-flow candidates and tau products).
//! - [`ColumnarEvent`]: the ntuple layout, one array per quantity. Arrays
//!   describing the same objects must have equal lengths.
//!
//! Both are validated before classification; a failure is a
//! [`TauError::MalformedEvent`] and the event is skipped.

use super::particles::{ParticleCandidate, TAU_CODE};
use super::vector::FourMomentum;
use crate::{TauError, TauResult};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collider kinematics as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub energy: f64,
}

impl Kinematics {
    pub fn new(pt: f64, eta: f64, phi: f64, energy: f64) -> Self {
        Self {
            pt,
            eta,
            phi,
            energy,
        }
    }

    pub fn to_four_momentum(&self) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_e(self.pt, self.eta, self.phi, self.energy)
    }

    /// Candidate carrying the recorded p_T unchanged
    pub fn to_candidate(&self, pdg_id: i32, charge: i32) -> ParticleCandidate {
        let (pt, eta, phi, energy) = (self.pt, self.eta, self.phi, self.energy);
        ParticleCandidate::from_pt_eta_phi_e(pt, eta, phi, energy, pdg_id, charge)
    }

    fn is_finite(&self) -> bool {
        self.pt.is_finite() && self.eta.is_finite() && self.phi.is_finite() && self.energy.is_finite()
    }
}

impl From<FourMomentum> for Kinematics {
    fn from(p: FourMomentum) -> Self {
        Self::new(p.pt(), p.eta(), p.phi(), p.energy())
    }
}

/// A truth-labelled generator jet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetRecord {
    /// Signed flavor code; |15| is a hadronic tau
    pub flavor: i32,
    #[serde(flatten)]
    pub kinematics: Kinematics,
}

impl JetRecord {
    pub fn is_tau(&self) -> bool {
        self.flavor.abs() == TAU_CODE
    }
}

/// A generator-level particle attached to one of the event's jets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenParticleRecord {
    pub pdg_id: i32,
    pub charge: i32,
    /// Index into [`EventRecord::jets`]
    pub jet_index: usize,
    #[serde(flatten)]
    pub kinematics: Kinematics,
}

/// A particle with identity and charge but no jet association
///
/// Used for isolation references and particle-flow candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub pdg_id: i32,
    pub charge: i32,
    #[serde(flatten)]
    pub kinematics: Kinematics,
}

impl ParticleRecord {
    pub fn to_candidate(&self) -> ParticleCandidate {
        self.kinematics.to_candidate(self.pdg_id, self.charge)
    }
}

/// A visible decay product of a generator tau
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TauProductRecord {
    /// Products sharing an index belong to the same tau
    pub tau_index: usize,
    pub pdg_id: i32,
    #[serde(flatten)]
    pub kinematics: Kinematics,
}

/// One event as delivered by the event reader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub jets: Vec<JetRecord>,
    #[serde(default)]
    pub particles: Vec<GenParticleRecord>,
    #[serde(default)]
    pub isolation: Vec<ParticleRecord>,
    #[serde(default)]
    pub pf_candidates: Vec<ParticleRecord>,
    #[serde(default)]
    pub tau_products: Vec<TauProductRecord>,
}

impl EventRecord {
    /// Check internal consistency
    pub fn validate(&self, event: u64) -> TauResult<()> {
        let n_jets = self.jets.len();
        for (k, particle) in self.particles.iter().enumerate() {
            if particle.jet_index >= n_jets {
                return Err(TauError::malformed(
                    event,
                    format!(
                        "particle {} references jet {} but the event has {} jets",
                        k, particle.jet_index, n_jets
                    ),
                ));
            }
        }

        let all_finite = self.jets.iter().all(|j| j.kinematics.is_finite())
            && self.particles.iter().all(|p| p.kinematics.is_finite())
            && self.isolation.iter().all(|p| p.kinematics.is_finite())
            && self.pf_candidates.iter().all(|p| p.kinematics.is_finite())
            && self.tau_products.iter().all(|p| p.kinematics.is_finite());
        if !all_finite {
            return Err(TauError::malformed(event, "non-finite kinematics"));
        }

        Ok(())
    }

    /// Generator particles attached to jet `jet_index`, in input order
    pub fn jet_particles(&self, jet_index: usize) -> Vec<ParticleCandidate> {
        self.particles
            .iter()
            .filter(|p| p.jet_index == jet_index)
            .map(|p| p.kinematics.to_candidate(p.pdg_id, p.charge))
            .collect()
    }

    /// All isolation reference records as candidates
    pub fn isolation_candidates(&self) -> Vec<ParticleCandidate> {
        self.isolation.iter().map(ParticleRecord::to_candidate).collect()
    }

    /// All particle-flow records as candidates
    pub fn pf_candidates(&self) -> Vec<ParticleCandidate> {
        self.pf_candidates.iter().map(ParticleRecord::to_candidate).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLUMNAR LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Ntuple-style event: one array per quantity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnarEvent {
    pub jet_flavor: Vec<i32>,
    pub jet_pt: Vec<f64>,
    pub jet_eta: Vec<f64>,
    pub jet_phi: Vec<f64>,
    pub jet_energy: Vec<f64>,

    pub particle_pdg_id: Vec<i32>,
    pub particle_charge: Vec<i32>,
    pub particle_jet_index: Vec<usize>,
    pub particle_pt: Vec<f64>,
    pub particle_eta: Vec<f64>,
    pub particle_phi: Vec<f64>,
    pub particle_energy: Vec<f64>,

    #[serde(default)]
    pub iso_pdg_id: Vec<i32>,
    #[serde(default)]
    pub iso_charge: Vec<i32>,
    #[serde(default)]
    pub iso_pt: Vec<f64>,
    #[serde(default)]
    pub iso_eta: Vec<f64>,
    #[serde(default)]
    pub iso_phi: Vec<f64>,
    #[serde(default)]
    pub iso_energy: Vec<f64>,
}

impl ColumnarEvent {
    /// Convert into row records, checking that parallel arrays agree in length
    pub fn into_record(self, event: u64) -> TauResult<EventRecord> {
        let n_jets = self.jet_flavor.len();
        check_lengths(
            event,
            "jet",
            n_jets,
            &[
                self.jet_pt.len(),
                self.jet_eta.len(),
                self.jet_phi.len(),
                self.jet_energy.len(),
            ],
        )?;

        let n_particles = self.particle_pdg_id.len();
        check_lengths(
            event,
            "particle",
            n_particles,
            &[
                self.particle_charge.len(),
                self.particle_jet_index.len(),
                self.particle_pt.len(),
                self.particle_eta.len(),
                self.particle_phi.len(),
                self.particle_energy.len(),
            ],
        )?;

        let n_iso = self.iso_pdg_id.len();
        check_lengths(
            event,
            "isolation",
            n_iso,
            &[
                self.iso_charge.len(),
                self.iso_pt.len(),
                self.iso_eta.len(),
                self.iso_phi.len(),
                self.iso_energy.len(),
            ],
        )?;

        let jets = (0..n_jets)
            .map(|k| JetRecord {
                flavor: self.jet_flavor[k],
                kinematics: Kinematics::new(
                    self.jet_pt[k],
                    self.jet_eta[k],
                    self.jet_phi[k],
                    self.jet_energy[k],
                ),
            })
            .collect();

        let particles = (0..n_particles)
            .map(|k| GenParticleRecord {
                pdg_id: self.particle_pdg_id[k],
                charge: self.particle_charge[k],
                jet_index: self.particle_jet_index[k],
                kinematics: Kinematics::new(
                    self.particle_pt[k],
                    self.particle_eta[k],
                    self.particle_phi[k],
                    self.particle_energy[k],
                ),
            })
            .collect();

        let isolation = (0..n_iso)
            .map(|k| ParticleRecord {
                pdg_id: self.iso_pdg_id[k],
                charge: self.iso_charge[k],
                kinematics: Kinematics::new(
                    self.iso_pt[k],
                    self.iso_eta[k],
                    self.iso_phi[k],
                    self.iso_energy[k],
                ),
            })
            .collect();

        let record = EventRecord {
            jets,
            particles,
            isolation,
            ..Default::default()
        };
        record.validate(event)?;
        Ok(record)
    }
}

fn check_lengths(event: u64, what: &str, expected: usize, lengths: &[usize]) -> TauResult<()> {
    match lengths.iter().find(|&&len| len != expected) {
        Some(&len) => Err(TauError::malformed(
            event,
            format!("{} arrays have mismatched lengths ({} vs {})", what, expected, len),
        )),
        None => Ok(()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
