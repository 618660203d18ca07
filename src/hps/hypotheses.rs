//! Decay-Mode Hypotheses
//!
//! Each hadronic tau decay mode is modelled by a fixed combination of
//! charged hadrons ("prongs") and strips (π⁰ → γγ):
//!
//! | Topology | Content | Mass window (GeV) |
//! |----------|---------|-------------------|
//! | 1 | h± h∓ h± | (0.8, 1.5) |
//! | 2 | h± + 2 strips | (0.4, min(max(1.2·√(p_T/100), 1.2), 4.0)) |
//! | 3 | h± + 1 strip | (0.3, min(max(1.3·√(p_T/100), 1.3), 4.2)) |
//! | 4 | h± alone | none (only with 1 hadron and 0 strips) |
//!
//! Every combination must also be collimated: each member lies within
//! ΔR ≤ 3.0 / p_T of the combined vector. Pools are small (≤ 5 hadrons,
//! ≤ 6 strips), so enumeration is exhaustive over index combinations.

use super::candidates::CandidatePools;
use super::vector::FourMomentum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numerator of the p_T-scaled containment radius
pub const CONTAINMENT_SCALE: f64 = 3.0;

// ═══════════════════════════════════════════════════════════════════════════════
// TOPOLOGY
// ═══════════════════════════════════════════════════════════════════════════════

/// Decay-product topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topology {
    /// Three charged hadrons
    ThreeProng,
    /// One charged hadron and two strips
    OneProngTwoStrips,
    /// One charged hadron and one strip
    OneProngOneStrip,
    /// A lone charged hadron
    OneProng,
}

impl Topology {
    /// All topologies in selection-priority order
    pub fn all() -> [Self; 4] {
        [
            Topology::ThreeProng,
            Topology::OneProngTwoStrips,
            Topology::OneProngOneStrip,
            Topology::OneProng,
        ]
    }

    /// Numeric id (1-4)
    pub fn id(&self) -> u8 {
        match self {
            Topology::ThreeProng => 1,
            Topology::OneProngTwoStrips => 2,
            Topology::OneProngOneStrip => 3,
            Topology::OneProng => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::all().into_iter().find(|t| t.id() == id)
    }

    /// Number of four-vectors combined
    pub fn n_constituents(&self) -> usize {
        match self {
            Topology::ThreeProng | Topology::OneProngTwoStrips => 3,
            Topology::OneProngOneStrip => 2,
            Topology::OneProng => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::ThreeProng => "h±h∓h±",
            Topology::OneProngTwoStrips => "h±π⁰π⁰",
            Topology::OneProngOneStrip => "h±π⁰",
            Topology::OneProng => "h±",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MASS WINDOW
// ═══════════════════════════════════════════════════════════════════════════════

/// Open invariant-mass interval, optionally widening with p_T
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MassWindow {
    Fixed { lower: f64, upper: f64 },
    /// Upper edge is min(max(base·√(p_T/100), base), cap)
    Scaled { lower: f64, base: f64, cap: f64 },
}

impl MassWindow {
    pub fn upper(&self, pt: f64) -> f64 {
        match *self {
            MassWindow::Fixed { upper, .. } => upper,
            MassWindow::Scaled { base, cap, .. } => (base * (pt / 100.0).sqrt()).max(base).min(cap),
        }
    }

    pub fn lower(&self) -> f64 {
        match *self {
            MassWindow::Fixed { lower, .. } | MassWindow::Scaled { lower, .. } => lower,
        }
    }

    pub fn contains(&self, mass: f64, pt: f64) -> bool {
        self.lower() < mass && mass < self.upper(pt)
    }
}

pub const THREE_PRONG_WINDOW: MassWindow = MassWindow::Fixed {
    lower: 0.8,
    upper: 1.5,
};
pub const ONE_PRONG_TWO_STRIPS_WINDOW: MassWindow = MassWindow::Scaled {
    lower: 0.4,
    base: 1.2,
    cap: 4.0,
};
pub const ONE_PRONG_ONE_STRIP_WINDOW: MassWindow = MassWindow::Scaled {
    lower: 0.3,
    base: 1.3,
    cap: 4.2,
};

// ═══════════════════════════════════════════════════════════════════════════════
// DECAY HYPOTHESIS
// ═══════════════════════════════════════════════════════════════════════════════

/// One interpretation of a jet as a tau decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayHypothesis {
    pub topology: Topology,
    /// Scalar sum of the constituents' p_T
    pub scalar_pt_sum: f64,
    /// Vector sum of the constituents
    pub momentum: FourMomentum,
    /// The combined four-vectors
    pub constituents: Vec<FourMomentum>,
}

impl DecayHypothesis {
    /// Combined (vector-sum) transverse momentum
    pub fn pt(&self) -> f64 {
        self.momentum.pt()
    }

    pub fn mass(&self) -> f64 {
        self.momentum.mass()
    }

    /// Build a hypothesis if the combination passes the mass and containment cuts
    ///
    /// A zero combined p_T leaves the containment radius undefined; such
    /// combinations are dropped.
    pub fn try_build(
        topology: Topology,
        window: Option<MassWindow>,
        constituents: Vec<FourMomentum>,
    ) -> Option<Self> {
        let momentum: FourMomentum = constituents.iter().sum();
        let pt = momentum.pt();
        if pt <= 0.0 || !pt.is_finite() {
            log::debug!("dropping {} combination with degenerate pT", topology);
            return None;
        }

        if let Some(window) = window {
            if !window.contains(momentum.mass(), pt) {
                return None;
            }
            if !is_contained(&momentum, &constituents, CONTAINMENT_SCALE / pt) {
                return None;
            }
        }

        let scalar_pt_sum = constituents.iter().map(FourMomentum::pt).sum();
        Some(Self {
            topology,
            scalar_pt_sum,
            momentum,
            constituents,
        })
    }
}

/// Every constituent within `radius` of the axis, boundary included
fn is_contained(axis: &FourMomentum, constituents: &[FourMomentum], radius: f64) -> bool {
    constituents.iter().all(|c| axis.delta_r(c) <= radius)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOPOLOGY TESTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// A tester for one decay topology
pub trait TopologyTester: Send + Sync {
    fn topology(&self) -> Topology;

    /// Every passing combination drawn from `pools`, in enumeration order
    fn test(&self, pools: &CandidatePools) -> Vec<DecayHypothesis>;
}

/// Three charged hadrons of mixed sign
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeProngTester;

impl TopologyTester for ThreeProngTester {
    fn topology(&self) -> Topology {
        Topology::ThreeProng
    }

    fn test(&self, pools: &CandidatePools) -> Vec<DecayHypothesis> {
        triples(pools.hadrons.len())
            .filter_map(|[a, b, c]| {
                let prongs = [&pools.hadrons[a], &pools.hadrons[b], &pools.hadrons[c]];
                let mixed_sign = prongs.iter().any(|h| h.charge > 0) && prongs.iter().any(|h| h.charge < 0);
                let all_charged = prongs.iter().all(|h| h.charge != 0);
                if !(mixed_sign && all_charged) {
                    return None;
                }
                DecayHypothesis::try_build(
                    Topology::ThreeProng,
                    Some(THREE_PRONG_WINDOW),
                    prongs.iter().map(|h| h.momentum).collect(),
                )
            })
            .collect()
    }
}

/// One charged hadron with every pair of strips
#[derive(Debug, Clone, Copy, Default)]
pub struct OneProngTwoStripsTester;

impl TopologyTester for OneProngTwoStripsTester {
    fn topology(&self) -> Topology {
        Topology::OneProngTwoStrips
    }

    fn test(&self, pools: &CandidatePools) -> Vec<DecayHypothesis> {
        let mut guesses = Vec::new();
        for hadron in pools.hadrons.iter().filter(|h| h.is_singly_charged()) {
            for [a, b] in pairs(pools.strips.len()) {
                let constituents = vec![
                    hadron.momentum,
                    pools.strips[a].momentum,
                    pools.strips[b].momentum,
                ];
                guesses.extend(DecayHypothesis::try_build(
                    Topology::OneProngTwoStrips,
                    Some(ONE_PRONG_TWO_STRIPS_WINDOW),
                    constituents,
                ));
            }
        }
        guesses
    }
}

/// One charged hadron with every single strip
#[derive(Debug, Clone, Copy, Default)]
pub struct OneProngOneStripTester;

impl TopologyTester for OneProngOneStripTester {
    fn topology(&self) -> Topology {
        Topology::OneProngOneStrip
    }

    fn test(&self, pools: &CandidatePools) -> Vec<DecayHypothesis> {
        let mut guesses = Vec::new();
        for hadron in pools.hadrons.iter().filter(|h| h.is_singly_charged()) {
            for strip in &pools.strips {
                guesses.extend(DecayHypothesis::try_build(
                    Topology::OneProngOneStrip,
                    Some(ONE_PRONG_ONE_STRIP_WINDOW),
                    vec![hadron.momentum, strip.momentum],
                ));
            }
        }
        guesses
    }
}

/// A lone singly-charged hadron, only when nothing else is in the jet
#[derive(Debug, Clone, Copy, Default)]
pub struct OneProngTester;

impl TopologyTester for OneProngTester {
    fn topology(&self) -> Topology {
        Topology::OneProng
    }

    fn test(&self, pools: &CandidatePools) -> Vec<DecayHypothesis> {
        match (pools.hadrons.as_slice(), pools.strips.is_empty()) {
            ([hadron], true) if hadron.is_singly_charged() => {
                DecayHypothesis::try_build(Topology::OneProng, None, vec![hadron.momentum])
                    .into_iter()
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HYPOTHESIS ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs every topology tester over a jet's pools
pub struct HypothesisEngine {
    testers: Vec<Box<dyn TopologyTester>>,
}

impl HypothesisEngine {
    /// The four standard testers, in topology order
    pub fn new() -> Self {
        Self {
            testers: vec![
                Box::new(ThreeProngTester),
                Box::new(OneProngTwoStripsTester),
                Box::new(OneProngOneStripTester),
                Box::new(OneProngTester),
            ],
        }
    }

    /// An engine with a custom tester set, run in the given order
    pub fn with_testers(testers: Vec<Box<dyn TopologyTester>>) -> Self {
        Self { testers }
    }

    pub fn topologies(&self) -> Vec<Topology> {
        self.testers.iter().map(|t| t.topology()).collect()
    }

    /// All hypotheses, grouped by tester order
    pub fn run(&self, pools: &CandidatePools) -> Vec<DecayHypothesis> {
        self.testers
            .iter()
            .flat_map(|tester| tester.test(pools))
            .collect()
    }
}

impl Default for HypothesisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HypothesisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypothesisEngine")
            .field("topologies", &self.topologies())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEX COMBINATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Unordered index pairs `a < b < n`, lexicographic
pub fn pairs(n: usize) -> impl Iterator<Item = [usize; 2]> {
    (0..n).flat_map(move |a| ((a + 1)..n).map(move |b| [a, b]))
}

/// Unordered index triples `a < b < c < n`, lexicographic
pub fn triples(n: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..n).flat_map(move |a| {
        ((a + 1)..n).flat_map(move |b| ((b + 1)..n).map(move |c| [a, b, c]))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
