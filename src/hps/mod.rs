//! # Hadrons-Plus-Strips Tau Reconstruction
//!
//! Reconstructs hadronic tau decays inside jets and labels each candidate
//! as signal or background with an isolation cut.
//!
//! ## Pipeline
//!
//! ```text
//!                         PER EVENT, PER JET
//!     ┌────────────────────────────────────────────────────────────────┐
//!     │                                                                │
//!     │   jet particles ──► leptonic veto ──► CANDIDATE GENERATOR      │
//!     │                                        │            │          │
//!     │                               ≤5 hadrons      e/γ ──► STRIPS   │
//!     │                                        │            │          │
//!     │                                        ▼            ▼          │
//!     │   ┌─────────────────────────────────────────────────────┐     │
//!     │   │              HYPOTHESIS ENGINE                      │     │
//!     │   │  1: three prongs     2: one prong + two strips      │     │
//!     │   │  3: one prong + one strip     4: bare one prong     │     │
//!     │   └─────────────────────────────────────────────────────┘     │
//!     │                        │                                       │
//!     │                        ▼                                       │
//!     │   SELECTOR (max combined p_T) ──► ISOLATION CLASSIFIER         │
//!     │                                          │                     │
//!     │                                          ▼                     │
//!     │                 ClassifiedCandidate + AccuracyTracker delta    │
//!     └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In [`ReconstructionMode::Detector`] the jets are first built by the
//! [`JetSeeder`] from particle-flow candidates and labelled by matching
//! them to visible generator taus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tau_hps::hps::{HpsConfig, TauClassifier};
//! use tau_hps::dataset::EventDataset;
//!
//! let classifier = TauClassifier::new(HpsConfig::working_point(0.2))?;
//! let dataset = EventDataset::synthetic(1000, 42);
//! let report = classifier.classify_all(&dataset.events);
//! println!("{}", report.summary());
//! ```

// Sub-modules
pub mod accuracy;
pub mod candidates;
pub mod event;
pub mod hypotheses;
pub mod isolation;
pub mod jets;
pub mod particles;
pub mod selector;
pub mod strips;
pub mod truth;
pub mod vector;

// Re-exports
pub use accuracy::AccuracyTracker;
pub use candidates::{is_leptonic_decay, CandidateGenerator, CandidatePools};
pub use event::{
    ColumnarEvent, EventRecord, GenParticleRecord, JetRecord, Kinematics, ParticleRecord,
    TauProductRecord,
};
pub use hypotheses::{
    DecayHypothesis, HypothesisEngine, MassWindow, OneProngOneStripTester, OneProngTester,
    OneProngTwoStripsTester, ThreeProngTester, Topology, TopologyTester,
};
pub use isolation::{IsolationClassifier, IsolationOutcome};
pub use jets::{Jet, JetSeeder};
pub use particles::{ParticleCandidate, ParticleKind, ReconstructionMode};
pub use selector::{Selection, Selector, UNRESOLVED_ISOLATION};
pub use strips::{Strip, StripClusterer};
pub use truth::{TauMatcher, VisibleTau};
pub use vector::FourMomentum;

use crate::{TauError, TauResult};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for tau reconstruction and classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HpsConfig {
    /// Hadron candidates must exceed this p_T
    pub hadron_pt_cut: f64,
    /// Electron and photon candidates must exceed this p_T
    pub electron_photon_pt_cut: f64,
    /// Isolation working point; `None` accepts every candidate
    pub isolation_cutoff: Option<f64>,
    /// Stop after this many events; `None` reads everything
    pub max_events: Option<usize>,
    pub mode: ReconstructionMode,
    /// Skip jets that look like leptonic tau decays
    pub veto_leptonic_decays: bool,
    /// Jet and candidate p_T threshold
    pub min_candidate_pt: f64,
    /// Strips consume their members
    pub exclusive_strips: bool,
    /// Classify events on the rayon thread pool
    pub parallel: bool,
}

impl Default for HpsConfig {
    fn default() -> Self {
        Self {
            hadron_pt_cut: 0.0,
            electron_photon_pt_cut: 0.0,
            isolation_cutoff: None,
            max_events: None,
            mode: ReconstructionMode::Generator,
            veto_leptonic_decays: true,
            min_candidate_pt: 20.0,
            exclusive_strips: false,
            parallel: false,
        }
    }
}

impl HpsConfig {
    /// No isolation requirement
    pub fn loose() -> Self {
        Self::default()
    }

    /// Reject candidates with isolation above `cutoff`
    pub fn working_point(cutoff: f64) -> Self {
        Self {
            isolation_cutoff: Some(cutoff),
            ..Self::default()
        }
    }

    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> TauResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TauResult<()> {
        check_cut("hadron_pt_cut", self.hadron_pt_cut)?;
        check_cut("electron_photon_pt_cut", self.electron_photon_pt_cut)?;
        check_cut("min_candidate_pt", self.min_candidate_pt)?;

        if let Some(cutoff) = self.isolation_cutoff {
            if cutoff.is_nan() {
                return Err(TauError::Configuration(
                    "isolation_cutoff must be a number".to_string(),
                ));
            }
        }

        if self.max_events == Some(0) {
            return Err(TauError::Configuration(
                "max_events must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_cut(name: &str, value: f64) -> TauResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(TauError::Configuration(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// One labelled tau candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCandidate {
    pub event: u64,
    pub jet_index: usize,
    /// Truth flavor of the jet
    pub jet_flavor: i32,
    /// `None` for unresolved jets
    pub topology: Option<Topology>,
    pub momentum: FourMomentum,
    pub isolation: f64,
    pub is_signal: bool,
}

impl ClassifiedCandidate {
    pub fn is_unresolved(&self) -> bool {
        self.topology.is_none()
    }
}

/// A jet as seen by the classifier
#[derive(Debug, Clone, Copy)]
pub struct JetView<'a> {
    pub event: u64,
    pub index: usize,
    pub flavor: i32,
    /// Raw jet four-momentum
    pub momentum: FourMomentum,
    pub particles: &'a [ParticleCandidate],
}

impl JetView<'_> {
    pub fn is_tau(&self) -> bool {
        self.flavor.abs() == particles::TAU_CODE
    }
}

/// Everything one event produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub event: u64,
    /// Candidates in jet order
    pub candidates: Vec<ClassifiedCandidate>,
    pub counters: AccuracyTracker,
    /// Jets skipped by the leptonic veto
    pub vetoed_jets: usize,
}

impl EventOutcome {
    /// (jet flavor, isolation) pairs for ROC-style consumers
    pub fn isolation_records(&self) -> Vec<(i32, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.jet_flavor, c.isolation))
            .collect()
    }
}

/// Accumulated result of a classification run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub counters: AccuracyTracker,
    /// Candidates in event order, then jet order
    pub candidates: Vec<ClassifiedCandidate>,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub vetoed_jets: u64,
}

impl ClassificationReport {
    pub fn absorb(&mut self, outcome: EventOutcome) {
        self.counters += outcome.counters;
        self.candidates.extend(outcome.candidates);
        self.events_processed += 1;
        self.vetoed_jets += outcome.vetoed_jets as u64;
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.counters.accuracy()
    }

    pub fn efficiency(&self) -> Option<f64> {
        self.counters.efficiency()
    }

    pub fn false_positive_rate(&self) -> Option<f64> {
        self.counters.false_positive_rate()
    }

    pub fn isolation_records(&self) -> Vec<(i32, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.jet_flavor, c.isolation))
            .collect()
    }

    pub fn summary(&self) -> String {
        let signal = self.candidates.iter().filter(|c| c.is_signal).count();
        format!(
            "═══════════════════════════════════════════════════════════════\n\
             TAU CLASSIFICATION REPORT\n\
             ═══════════════════════════════════════════════════════════════\n\
             Events: {} processed, {} skipped\n\
             Candidates: {} ({} signal), {} jets vetoed as leptonic\n\
             {}\n\
             ═══════════════════════════════════════════════════════════════",
            self.events_processed,
            self.events_skipped,
            self.candidates.len(),
            signal,
            self.vetoed_jets,
            self.counters.summary(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFIER
// ═══════════════════════════════════════════════════════════════════════════════

/// Tau reconstruction and classification pipeline
#[derive(Debug)]
pub struct TauClassifier {
    pub config: HpsConfig,
    pub generator: CandidateGenerator,
    pub engine: HypothesisEngine,
    pub selector: Selector,
    pub isolation: IsolationClassifier,
    pub seeder: JetSeeder,
    pub matcher: TauMatcher,
}

impl TauClassifier {
    /// Build the pipeline; fails on an invalid configuration
    pub fn new(config: HpsConfig) -> TauResult<Self> {
        config.validate()?;

        let clusterer = if config.exclusive_strips {
            StripClusterer::exclusive()
        } else {
            StripClusterer::new()
        };
        let generator = CandidateGenerator::new(
            config.hadron_pt_cut,
            config.electron_photon_pt_cut,
            config.mode,
        )
        .with_clusterer(clusterer);

        Ok(Self {
            generator,
            engine: HypothesisEngine::new(),
            selector: Selector::new(config.min_candidate_pt),
            isolation: IsolationClassifier::new(config.isolation_cutoff),
            seeder: JetSeeder::new(),
            matcher: TauMatcher::new(),
            config,
        })
    }

    /// Classify one jet
    ///
    /// Takes the running counters and returns them updated with this jet.
    /// Vetoed jets leave the counters untouched.
    pub fn classify_jet(
        &self,
        jet: JetView<'_>,
        references: &[ParticleCandidate],
        mut tracker: AccuracyTracker,
    ) -> (Option<ClassifiedCandidate>, AccuracyTracker) {
        if self.config.veto_leptonic_decays && is_leptonic_decay(jet.particles) {
            debug!("event {} jet {}: leptonic decay vetoed", jet.event, jet.index);
            return (None, tracker);
        }

        let pools = self.generator.generate(jet.particles);
        let hypotheses = self.engine.run(&pools);
        let selection = self.selector.select(&hypotheses, &jet.momentum);

        let candidate = match selection {
            Selection::Resolved(best) => match self.isolation.classify(&best, references) {
                Ok(outcome) => Some(ClassifiedCandidate {
                    event: jet.event,
                    jet_index: jet.index,
                    jet_flavor: jet.flavor,
                    topology: Some(best.topology),
                    momentum: best.momentum,
                    isolation: outcome.isolation,
                    is_signal: outcome.is_signal,
                }),
                Err(err) => {
                    warn!("event {} jet {}: {}", jet.event, jet.index, err);
                    None
                }
            },
            Selection::Unresolved(momentum) => Some(ClassifiedCandidate {
                event: jet.event,
                jet_index: jet.index,
                jet_flavor: jet.flavor,
                topology: None,
                momentum,
                isolation: UNRESOLVED_ISOLATION,
                is_signal: false,
            }),
            Selection::BelowThreshold(_) | Selection::Empty => None,
        };

        let predicted_signal = candidate.as_ref().map_or(false, |c| c.is_signal);
        debug!(
            "event {} jet {}: {} hypotheses, topology {:?}, signal {}",
            jet.event,
            jet.index,
            hypotheses.len(),
            candidate.as_ref().and_then(|c| c.topology),
            predicted_signal
        );

        tracker.record(
            jet.is_tau(),
            jet.momentum.pt(),
            predicted_signal,
            self.config.min_candidate_pt,
        );
        (candidate, tracker)
    }

    /// Classify every jet of one event
    pub fn classify_event(&self, record: &EventRecord, event: u64) -> TauResult<EventOutcome> {
        record.validate(event)?;

        let mut outcome = EventOutcome {
            event,
            ..EventOutcome::default()
        };

        match self.config.mode {
            ReconstructionMode::Generator => {
                let references = record.isolation_candidates();
                for (index, jet) in record.jets.iter().enumerate() {
                    let particles = record.jet_particles(index);
                    let view = JetView {
                        event,
                        index,
                        flavor: jet.flavor,
                        momentum: jet.kinematics.to_four_momentum(),
                        particles: &particles,
                    };
                    self.accumulate(&mut outcome, view, &references);
                }
            }
            ReconstructionMode::Detector => {
                let references = record.pf_candidates();
                let jets = self.seeder.seed_jets(&references);
                let flavors = self.matcher.jet_flavors(&jets, &record.tau_products);
                for (jet, flavor) in jets.iter().zip(flavors) {
                    let view = JetView {
                        event,
                        index: jet.index,
                        flavor,
                        momentum: jet.momentum,
                        particles: &jet.members,
                    };
                    self.accumulate(&mut outcome, view, &references);
                }
            }
        }

        Ok(outcome)
    }

    fn accumulate(
        &self,
        outcome: &mut EventOutcome,
        view: JetView<'_>,
        references: &[ParticleCandidate],
    ) {
        let before = outcome.counters.total;
        let (candidate, counters) = self.classify_jet(view, references, outcome.counters);
        if counters.total == before {
            outcome.vetoed_jets += 1;
        }
        outcome.counters = counters;
        outcome.candidates.extend(candidate);
    }

    /// Classify a stream of events, skipping malformed ones
    ///
    /// Stops at `max_events` items, malformed ones included, and numbers
    /// events by their position in the stream. Only I/O and configuration
    /// failures abort the run. With `parallel` set the items are read
    /// first and classified on the rayon pool; the report is the same.
    pub fn run<I>(&self, events: I) -> TauResult<ClassificationReport>
    where
        I: IntoIterator<Item = TauResult<EventRecord>>,
    {
        if self.config.parallel {
            return self.run_parallel(events);
        }

        let limit = self.config.max_events.unwrap_or(usize::MAX);
        let mut report = ClassificationReport::default();

        for (number, item) in events.into_iter().take(limit).enumerate() {
            let event = number as u64;
            match item.and_then(|record| self.classify_event(&record, event)) {
                Ok(outcome) => report.absorb(outcome),
                Err(err) if err.is_recoverable() => {
                    warn!("skipping event {}: {}", event, err);
                    report.events_skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "classified {} events ({} skipped), {} candidates",
            report.events_processed,
            report.events_skipped,
            report.candidates.len()
        );
        Ok(report)
    }

    fn run_parallel<I>(&self, events: I) -> TauResult<ClassificationReport>
    where
        I: IntoIterator<Item = TauResult<EventRecord>>,
    {
        let limit = self.config.max_events.unwrap_or(usize::MAX);
        let mut items = Vec::new();
        for item in events.into_iter().take(limit) {
            match item {
                Err(err) if !err.is_recoverable() => return Err(err),
                item => items.push(item),
            }
        }

        let outcomes: Vec<TauResult<EventOutcome>> = items
            .into_par_iter()
            .enumerate()
            .map(|(k, item)| item.and_then(|record| self.classify_event(&record, k as u64)))
            .collect();
        Ok(self.collect_report(outcomes))
    }

    /// Classify in-memory events, serially or on the rayon pool per config
    pub fn classify_all(&self, events: &[EventRecord]) -> ClassificationReport {
        if self.config.parallel {
            self.classify_parallel(events)
        } else {
            self.classify_serial(events)
        }
    }

    pub fn classify_serial(&self, events: &[EventRecord]) -> ClassificationReport {
        let outcomes: Vec<TauResult<EventOutcome>> = self
            .limited(events)
            .iter()
            .enumerate()
            .map(|(k, record)| self.classify_event(record, k as u64))
            .collect();
        self.collect_report(outcomes)
    }

    /// Per-event counters are merged after the parallel map; output order
    /// is the input order.
    pub fn classify_parallel(&self, events: &[EventRecord]) -> ClassificationReport {
        let outcomes: Vec<TauResult<EventOutcome>> = self
            .limited(events)
            .par_iter()
            .enumerate()
            .map(|(k, record)| self.classify_event(record, k as u64))
            .collect();
        self.collect_report(outcomes)
    }

    fn limited<'a>(&self, events: &'a [EventRecord]) -> &'a [EventRecord] {
        let limit = self.config.max_events.unwrap_or(events.len()).min(events.len());
        &events[..limit]
    }

    fn collect_report(&self, outcomes: Vec<TauResult<EventOutcome>>) -> ClassificationReport {
        let mut report = ClassificationReport::default();
        for (k, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(outcome) => report.absorb(outcome),
                Err(err) => {
                    warn!("skipping event {}: {}", k, err);
                    report.events_skipped += 1;
                }
            }
        }
        info!(
            "classified {} events ({} skipped), {} candidates",
            report.events_processed,
            report.events_skipped,
            report.candidates.len()
        );
        report
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
