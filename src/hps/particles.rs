//! Particle Types for Tau Reconstruction
//!
//! Particle identity arrives as signed PDG Monte Carlo codes. It is decoded
//! once into a closed [`ParticleKind`] so every selection predicate below is
//! an exhaustive match rather than a scattered integer comparison.
//!
//! | Code        | Kind |
//! |-------------|------|
//! | ±211        | Charged hadron (π±) |
//! | 11 / -11    | Electron / positron |
//! | 22          | Photon |
//! | ±13         | Muon |
//! | anything else | `Other(code)`; \|code\| > 40 is a generic hadron in generator-level mode |

use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TauError;

/// PDG code magnitude of the charged pion
pub const CHARGED_HADRON_CODE: i32 = 211;
/// PDG code magnitude of the tau lepton
pub const TAU_CODE: i32 = 15;
/// Codes above this magnitude are hadrons in generator-level mode
pub const GENERIC_HADRON_MIN_CODE: i32 = 40;

// ═══════════════════════════════════════════════════════════════════════════════
// RECONSTRUCTION MODE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which level of event information drives the reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconstructionMode {
    /// Generator-level particles, pre-assigned to truth-labelled jets
    #[default]
    Generator,
    /// Particle-flow candidates clustered by the jet seeder
    Detector,
}

impl ReconstructionMode {
    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            ReconstructionMode::Generator => "generator",
            ReconstructionMode::Detector => "detector",
        }
    }
}

impl fmt::Display for ReconstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReconstructionMode {
    type Err = TauError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generator" | "gen" => Ok(ReconstructionMode::Generator),
            "detector" | "pf" => Ok(ReconstructionMode::Detector),
            other => Err(TauError::Configuration(format!(
                "unknown reconstruction mode '{}'",
                other
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTICLE KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Particle identity decoded from its PDG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    ChargedHadron,
    Electron,
    Positron,
    Photon,
    Muon,
    Other(i32),
}

impl ParticleKind {
    /// Decode a signed PDG code
    pub fn from_pdg(code: i32) -> Self {
        match code {
            211 | -211 => ParticleKind::ChargedHadron,
            11 => ParticleKind::Electron,
            -11 => ParticleKind::Positron,
            22 => ParticleKind::Photon,
            13 | -13 => ParticleKind::Muon,
            other => ParticleKind::Other(other),
        }
    }

    /// Magnitude of the PDG code
    pub fn abs_pdg(&self) -> i32 {
        match self {
            ParticleKind::ChargedHadron => CHARGED_HADRON_CODE,
            ParticleKind::Electron | ParticleKind::Positron => 11,
            ParticleKind::Photon => 22,
            ParticleKind::Muon => 13,
            ParticleKind::Other(code) => code.abs(),
        }
    }

    /// Hadron candidate for the given reconstruction mode
    pub fn is_hadron(&self, mode: ReconstructionMode) -> bool {
        match mode {
            ReconstructionMode::Detector => matches!(self, ParticleKind::ChargedHadron),
            ReconstructionMode::Generator => self.abs_pdg() > GENERIC_HADRON_MIN_CODE,
        }
    }

    /// Electron, positron or photon
    pub fn is_electromagnetic(&self) -> bool {
        matches!(
            self,
            ParticleKind::Electron | ParticleKind::Positron | ParticleKind::Photon
        )
    }

    /// Electron or positron
    pub fn is_electron(&self) -> bool {
        matches!(self, ParticleKind::Electron | ParticleKind::Positron)
    }

    /// Any lepton code (electrons, muons, taus and their neutrinos)
    pub fn is_lepton(&self) -> bool {
        let code = self.abs_pdg();
        code > 10 && code < 20
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTICLE CANDIDATE
// ═══════════════════════════════════════════════════════════════════════════════

/// A reconstructed or generator-level particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleCandidate {
    /// Four-momentum
    pub momentum: FourMomentum,
    /// Decoded identity
    pub kind: ParticleKind,
    /// Electric charge in units of e
    pub charge: i32,
    /// Transverse momentum as recorded in the input, used for ordering
    pub pt: f64,
}

impl ParticleCandidate {
    pub fn new(momentum: FourMomentum, kind: ParticleKind, charge: i32) -> Self {
        Self {
            momentum,
            kind,
            charge,
            pt: momentum.pt(),
        }
    }

    /// Build from a raw PDG code
    pub fn from_pdg(momentum: FourMomentum, pdg_id: i32, charge: i32) -> Self {
        Self::new(momentum, ParticleKind::from_pdg(pdg_id), charge)
    }

    /// Build from (pT, η, φ, E), keeping `pt` exactly as given.
    ///
    /// The Cartesian round trip can move p_T by an ulp depending on φ, so two
    /// particles recorded with equal p_T would otherwise no longer tie.
    pub fn from_pt_eta_phi_e(
        pt: f64,
        eta: f64,
        phi: f64,
        energy: f64,
        pdg_id: i32,
        charge: i32,
    ) -> Self {
        Self {
            pt,
            ..Self::from_pdg(FourMomentum::from_pt_eta_phi_e(pt, eta, phi, energy), pdg_id, charge)
        }
    }

    /// Build from (pT, η, φ, m), keeping `pt` exactly as given
    pub fn from_pt_eta_phi_m(
        pt: f64,
        eta: f64,
        phi: f64,
        mass: f64,
        pdg_id: i32,
        charge: i32,
    ) -> Self {
        Self {
            pt,
            ..Self::from_pdg(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, mass), pdg_id, charge)
        }
    }

    pub fn pt(&self) -> f64 {
        self.pt
    }

    pub fn eta(&self) -> f64 {
        self.momentum.eta()
    }

    /// Exactly one unit of charge
    pub fn is_singly_charged(&self) -> bool {
        self.charge.abs() == 1
    }

    /// Contributes to the isolation sum: a charged hadron-type particle or a photon
    pub fn is_isolation_reference(&self) -> bool {
        match self.kind {
            ParticleKind::Photon => true,
            kind => kind.abs_pdg() > GENERIC_HADRON_MIN_CODE && self.charge != 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
