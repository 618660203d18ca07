//! # Event Loading
//!
//! Supports loading events from:
//! - JSON Lines files, one event per line, in either the row layout
//!   ([`EventRecord`]) or the ntuple layout ([`ColumnarEvent`])
//! - A seeded synthetic generator producing tau-like and QCD-like jets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tau_hps::dataset::{open_jsonl, EventDataset};
//!
//! // Stream events; malformed lines surface as recoverable errors
//! for event in open_jsonl("events.jsonl")? {
//!     let record = event?;
//! }
//!
//! // Or generate reproducible test events
//! let dataset = EventDataset::synthetic(1000, 42);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::hps::event::{
    ColumnarEvent, EventRecord, GenParticleRecord, JetRecord, Kinematics, ParticleRecord,
    TauProductRecord,
};
use crate::hps::vector::{normalize_angle, FourMomentum};
use crate::hps::ClassifiedCandidate;
use crate::{TauError, TauResult};

const PION_MASS: f64 = 0.13957;

/// One line of an event file, in either supported layout
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventLine {
    Record(EventRecord),
    Columnar(ColumnarEvent),
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON LINES READER
// ═══════════════════════════════════════════════════════════════════════════════

/// Streams events from JSON Lines input
///
/// Blank lines are ignored. A line that does not decode, including one that
/// is not valid UTF-8, is reported as [`TauError::MalformedEvent`] and
/// reading continues with the next line. Only a failing reader is fatal.
pub struct JsonlEventReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    next_event: u64,
}

impl<R: BufRead> JsonlEventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            next_event: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonlEventReader<R> {
    type Item = TauResult<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(TauError::Io(err))),
            }

            let line = std::str::from_utf8(&self.buffer);
            if matches!(line, Ok(text) if text.trim().is_empty()) {
                continue;
            }

            let event = self.next_event;
            self.next_event += 1;

            let parsed = line
                .map_err(|e| TauError::malformed(event, format!("line is not UTF-8: {}", e)))
                .and_then(|text| {
                    serde_json::from_str::<EventLine>(text)
                        .map_err(|e| TauError::malformed(event, format!("undecodable line: {}", e)))
                })
                .and_then(|parsed| match parsed {
                    EventLine::Record(record) => Ok(record),
                    EventLine::Columnar(columnar) => columnar.into_record(event),
                });
            return Some(parsed);
        }
    }
}

/// Open a JSON Lines event file
pub fn open_jsonl(path: impl AsRef<Path>) -> TauResult<JsonlEventReader<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    Ok(JsonlEventReader::new(BufReader::new(file)))
}

/// Write classified candidates as JSON Lines
pub fn write_candidates_jsonl<W: Write>(
    writer: W,
    candidates: &[ClassifiedCandidate],
) -> TauResult<()> {
    let mut writer = BufWriter::new(writer);
    for candidate in candidates {
        serde_json::to_writer(&mut writer, candidate)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY DATASET
// ═══════════════════════════════════════════════════════════════════════════════

/// A fully loaded set of events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDataset {
    pub events: Vec<EventRecord>,
    /// Lines dropped while loading
    pub skipped: usize,
}

impl EventDataset {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events, skipped: 0 }
    }

    /// Load every event from a JSON Lines file, dropping malformed lines
    pub fn from_jsonl(path: impl AsRef<Path>) -> TauResult<Self> {
        let mut dataset = Self::default();
        for item in open_jsonl(path.as_ref())? {
            match item {
                Ok(record) => dataset.events.push(record),
                Err(err) if err.is_recoverable() => {
                    log::warn!("dropping event: {}", err);
                    dataset.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        log::info!(
            "Loaded {} events from JSONL ({} dropped)",
            dataset.len(),
            dataset.skipped
        );
        Ok(dataset)
    }

    /// Write the events as JSON Lines in the row layout
    pub fn write_jsonl(&self, path: impl AsRef<Path>) -> TauResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for event in &self.events {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reproducible synthetic events
    ///
    /// Each event holds one to three jets. Roughly half are hadronic taus
    /// (one prong, one prong plus a π⁰ pair, or three prongs); the rest are
    /// wide QCD sprays. Isolation references, particle-flow candidates and
    /// tau products are filled consistently so both reconstruction modes can
    /// run on the same events.
    pub fn synthetic(num_events: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let events = (0..num_events)
            .map(|_| synthetic_event(&mut rng))
            .collect();
        Self::new(events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events as the `Ok` stream [`crate::hps::TauClassifier::run`] expects
    pub fn iter_ok(&self) -> impl Iterator<Item = TauResult<EventRecord>> + '_ {
        self.events.iter().cloned().map(Ok)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHETIC GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A generated particle before it is split into the event's record lists
struct Generated {
    pdg_id: i32,
    charge: i32,
    momentum: FourMomentum,
}

fn synthetic_event(rng: &mut StdRng) -> EventRecord {
    let mut event = EventRecord::default();
    let n_jets = rng.gen_range(1..=3);

    for jet_index in 0..n_jets {
        let eta = rng.gen_range(-2.2..2.2);
        let phi = rng.gen_range(-PI..PI);
        let is_tau = rng.gen_bool(0.5);

        let particles = if is_tau {
            tau_decay(rng, eta, phi)
        } else {
            qcd_spray(rng, eta, phi)
        };

        let jet_momentum: FourMomentum = particles.iter().map(|p| p.momentum).sum();
        let flavor = if is_tau {
            if rng.gen_bool(0.5) {
                15
            } else {
                -15
            }
        } else {
            [1, 2, 3, 4, 5, 21][rng.gen_range(0..6)]
        };
        event.jets.push(JetRecord {
            flavor,
            kinematics: Kinematics::from(jet_momentum),
        });

        for p in &particles {
            let kinematics = Kinematics::from(p.momentum);
            event.particles.push(GenParticleRecord {
                pdg_id: p.pdg_id,
                charge: p.charge,
                jet_index,
                kinematics,
            });
            let reference = ParticleRecord {
                pdg_id: p.pdg_id,
                charge: p.charge,
                kinematics,
            };
            event.isolation.push(reference.clone());
            event.pf_candidates.push(reference);
            if is_tau {
                event.tau_products.push(TauProductRecord {
                    tau_index: jet_index,
                    pdg_id: p.pdg_id,
                    kinematics,
                });
            }
        }
    }

    // Soft underlying event, spread over the whole detector
    for _ in 0..rng.gen_range(0..6) {
        let p = soft_particle(rng);
        let record = ParticleRecord {
            pdg_id: p.pdg_id,
            charge: p.charge,
            kinematics: Kinematics::from(p.momentum),
        };
        event.isolation.push(record.clone());
        event.pf_candidates.push(record);
    }

    event
}

fn tau_decay(rng: &mut StdRng, eta: f64, phi: f64) -> Vec<Generated> {
    let visible_pt = rng.gen_range(25.0..80.0);
    let sign = if rng.gen_bool(0.5) { 1 } else { -1 };

    match rng.gen_range(0..3) {
        // π±
        0 => vec![charged_pion(sign, visible_pt, eta, phi)],
        // π± π⁰ → π± γγ
        1 => {
            let pion_pt = visible_pt * rng.gen_range(0.4..0.7);
            let photon_pt = (visible_pt - pion_pt) / 2.0;
            let photon_phi = phi + rng.gen_range(-0.08..0.08);
            vec![
                charged_pion(sign, pion_pt, eta, phi),
                photon(photon_pt * 1.1, eta + 0.005, normalize_angle(photon_phi)),
                photon(photon_pt * 0.9, eta - 0.005, normalize_angle(photon_phi + 0.03)),
            ]
        }
        // π± π∓ π±
        _ => {
            let spread = rng.gen_range(0.02..0.05);
            let fractions = [0.45, 0.33, 0.22];
            let offsets = [(0.0, 0.0), (spread, -spread), (-spread, spread)];
            fractions
                .iter()
                .zip(offsets.iter())
                .enumerate()
                .map(|(k, (&f, &(de, dp)))| {
                    let charge = if k == 1 { -sign } else { sign };
                    charged_pion(charge, visible_pt * f, eta + de, normalize_angle(phi + dp))
                })
                .collect()
        }
    }
}

fn qcd_spray(rng: &mut StdRng, eta: f64, phi: f64) -> Vec<Generated> {
    let n = rng.gen_range(6..14);
    let mut particles = Vec::with_capacity(n);

    // A hard charged leader so the jet seeds in detector mode
    let leader_pt = rng.gen_range(12.0..30.0);
    let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
    particles.push(charged_pion(sign, leader_pt, eta, phi));

    for _ in 1..n {
        let de = rng.gen_range(-0.3..0.3);
        let dp = rng.gen_range(-0.3..0.3);
        let pt = rng.gen_range(1.0..10.0);
        let (e, p) = (eta + de, normalize_angle(phi + dp));
        let particle = match rng.gen_range(0..4) {
            0 => photon(pt, e, p),
            1 => Generated {
                pdg_id: 130,
                charge: 0,
                momentum: FourMomentum::from_pt_eta_phi_m(pt, e, p, 0.4976),
            },
            _ => {
                let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
                charged_pion(sign, pt, e, p)
            }
        };
        particles.push(particle);
    }
    particles
}

fn soft_particle(rng: &mut StdRng) -> Generated {
    let pt = rng.gen_range(0.5..3.0);
    let eta = rng.gen_range(-2.5..2.5);
    let phi = rng.gen_range(-PI..PI);
    if rng.gen_bool(0.5) {
        photon(pt, eta, phi)
    } else {
        charged_pion(if rng.gen_bool(0.5) { 1 } else { -1 }, pt, eta, phi)
    }
}

fn charged_pion(charge: i32, pt: f64, eta: f64, phi: f64) -> Generated {
    Generated {
        pdg_id: 211 * charge.signum(),
        charge,
        momentum: FourMomentum::from_pt_eta_phi_m(pt, eta, phi, PION_MASS),
    }
}

fn photon(pt: f64, eta: f64, phi: f64) -> Generated {
    Generated {
        pdg_id: 22,
        charge: 0,
        momentum: FourMomentum::from_pt_eta_phi_m(pt, eta, phi, 0.0),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
