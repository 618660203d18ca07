//! Four-Momentum Vector Utilities
//!
//! Relativistic four-vectors in natural units (c = 1), stored in Cartesian
//! form and exposing the collider coordinates used throughout the
//! reconstruction:
//!
//! | Quantity | Definition |
//! |----------|------------|
//! | p_T      | √(p_x² + p_y²) |
//! | η        | asinh(p_z / p_T) |
//! | φ        | atan2(p_y, p_x), in (-π, π] |
//! | M        | √(E² - \|p\|²) |
//! | ΔR       | √(Δη² + Δφ²) |

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Pseudorapidity reported for vectors along the beam axis
const BEAM_AXIS_ETA: f64 = 1e10;

// ═══════════════════════════════════════════════════════════════════════════════
// FOUR-MOMENTUM
// ═══════════════════════════════════════════════════════════════════════════════

/// Four-momentum vector p^μ = (E, p_x, p_y, p_z)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    /// Energy component (timelike)
    pub e: f64,
    /// Momentum x-component
    pub px: f64,
    /// Momentum y-component
    pub py: f64,
    /// Momentum z-component (beam axis)
    pub pz: f64,
}

impl FourMomentum {
    /// Create a new four-momentum from Cartesian components
    pub fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        Self { e, px, py, pz }
    }

    /// The zero vector
    pub fn zero() -> Self {
        Self::default()
    }

    /// Create from collider coordinates (p_T, η, φ, E)
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        let pt = pt.abs();
        Self {
            e,
            px: pt * phi.cos(),
            py: pt * phi.sin(),
            pz: pt * eta.sinh(),
        }
    }

    /// Create from (p_T, η, φ) and a rest mass
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let p = pt.abs() * eta.cosh();
        Self::from_pt_eta_phi_e(pt, eta, phi, (p * p + mass * mass).sqrt())
    }

    /// Energy
    pub fn energy(&self) -> f64 {
        self.e
    }

    /// Transverse momentum: p_T = √(p_x² + p_y²)
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Pseudorapidity: η = asinh(p_z / p_T)
    ///
    /// Vectors along the beam axis report ±1e10 (0 for the zero vector).
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt > 0.0 {
            (self.pz / pt).asinh()
        } else if self.pz == 0.0 {
            0.0
        } else {
            BEAM_AXIS_ETA.copysign(self.pz)
        }
    }

    /// Azimuthal angle φ in (-π, π]
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 {
            return 0.0;
        }
        normalize_angle(self.py.atan2(self.px))
    }

    /// Invariant mass squared: m² = E² - |p|²
    pub fn mass_squared(&self) -> f64 {
        self.e.powi(2) - self.px.powi(2) - self.py.powi(2) - self.pz.powi(2)
    }

    /// Invariant mass: m = √(E² - |p|²)
    /// Returns 0 for spacelike momenta
    pub fn mass(&self) -> f64 {
        let m2 = self.mass_squared();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            0.0
        }
    }

    /// Signed azimuthal separation φ_self - φ_other, wrapped into (-π, π]
    pub fn delta_phi(&self, other: &Self) -> f64 {
        normalize_angle(self.phi() - other.phi())
    }

    /// Pseudorapidity separation η_self - η_other
    pub fn delta_eta(&self, other: &Self) -> f64 {
        self.eta() - other.eta()
    }

    /// Angular distance ΔR = √(Δη² + Δφ²)
    pub fn delta_r(&self, other: &Self) -> f64 {
        self.delta_eta(other).hypot(self.delta_phi(other))
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.e.is_finite() && self.px.is_finite() && self.py.is_finite() && self.pz.is_finite()
    }
}

impl Add for FourMomentum {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            e: self.e + other.e,
            px: self.px + other.px,
            py: self.py + other.py,
            pz: self.pz + other.pz,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<'a> Sum<&'a FourMomentum> for FourMomentum {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Wrap an angle into (-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
