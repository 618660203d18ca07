//! # Hadronic Tau Reconstruction
//!
//! Hadrons-plus-strips (HPS) reconstruction of hadronic tau decays in
//! simulated collider events, with isolation-based signal/background
//! classification and running accuracy bookkeeping.
//!
//! ## Features
//! - Seeded-cone jet finding over particle-flow candidates
//! - Greedy η-φ strip clustering of electrons and photons
//! - Four decay-topology hypotheses with mass windows and containment
//! - Isolation working points and accuracy/efficiency/fake-rate counters
//! - **Data-parallel event classification via rayon**
//!
//! ## Architecture
//!
//! ```text
//! EventRecord → jets → CandidatePools → Hypotheses → Selection → Isolation
//!                 │          │                                      │
//!                 │     ┌────┴─────┐                                ▼
//!                 │     │ hadrons  │                     ClassifiedCandidate
//!                 │     │ strips   │                     AccuracyTracker
//!                 │     └──────────┘
//!          generator jets, or JetSeeder + TauMatcher in detector mode
//! ```

pub mod dataset;
pub mod error;
pub mod hps;

// Cross-module scenario tests
#[cfg(test)]
mod tests;

pub use dataset::{open_jsonl, write_candidates_jsonl, EventDataset, JsonlEventReader};
pub use error::TauError;
pub use hps::{
    AccuracyTracker, ClassificationReport, ClassifiedCandidate, DecayHypothesis, EventOutcome,
    EventRecord, FourMomentum, HpsConfig, ParticleCandidate, ParticleKind, ReconstructionMode,
    TauClassifier, Topology,
};

/// Result type for tau reconstruction
pub type TauResult<T> = Result<T, TauError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        // Pipeline
        HpsConfig,
        TauClassifier,
        ClassificationReport,
        ClassifiedCandidate,
        ReconstructionMode,

        // Physics types
        FourMomentum,
        ParticleCandidate,
        ParticleKind,
        Topology,

        // Data
        EventDataset,
        EventRecord,

        // Result type
        TauResult,
        TauError,
    };
}
