//! Integration Tests for Tau Reconstruction
//!
//! End-to-end scenarios across jet finding, hypothesis testing, selection,
//! isolation and accuracy bookkeeping.

use crate::dataset::EventDataset;
use crate::hps::event::{
    EventRecord, GenParticleRecord, JetRecord, Kinematics, ParticleRecord, TauProductRecord,
};
use crate::hps::{
    CandidateGenerator, HpsConfig, HypothesisEngine, JetSeeder, ParticleCandidate,
    ReconstructionMode, TauClassifier, Topology, UNRESOLVED_ISOLATION,
};
use crate::hps::vector::FourMomentum;
use crate::TauError;

const PION_MASS: f64 = 0.13957;

fn kinematics(pt: f64, eta: f64, phi: f64, mass: f64) -> Kinematics {
    Kinematics::from(FourMomentum::from_pt_eta_phi_m(pt, eta, phi, mass))
}

fn jet(flavor: i32, pt: f64) -> JetRecord {
    JetRecord {
        flavor,
        kinematics: kinematics(pt, 0.0, 0.0, 0.0),
    }
}

fn gen_particle(pdg_id: i32, charge: i32, pt: f64, eta: f64, phi: f64) -> GenParticleRecord {
    let mass = if pdg_id.abs() == 211 { PION_MASS } else { 0.0 };
    GenParticleRecord {
        pdg_id,
        charge,
        jet_index: 0,
        kinematics: kinematics(pt, eta, phi, mass),
    }
}

fn classifier(config: HpsConfig) -> TauClassifier {
    TauClassifier::new(config).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// SINGLE-JET SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_bare_one_prong_tau_is_signal() {
        let event = EventRecord {
            jets: vec![jet(15, 45.0)],
            particles: vec![gen_particle(211, 1, 30.0, 0.0, 0.0)],
            ..EventRecord::default()
        };

        for config in [HpsConfig::loose(), HpsConfig::working_point(0.1)] {
            let outcome = classifier(config).classify_event(&event, 0).unwrap();
            assert_eq!(outcome.candidates.len(), 1);

            let candidate = &outcome.candidates[0];
            assert_eq!(candidate.topology, Some(Topology::OneProng));
            assert!((candidate.momentum.pt() - 30.0).abs() < 1e-9);
            assert!((candidate.isolation + 1.0).abs() < 1e-9);
            assert!(candidate.is_signal);

            let counters = outcome.counters;
            assert_eq!(counters.total, 1);
            assert_eq!(counters.signal_total, 1);
            assert_eq!(counters.signal_identified, 1);
            assert_eq!(counters.correct, 1);
        }
    }

    #[test]
    fn test_one_prong_one_strip_scalar_sum() {
        // Photon at Δφ = 0.048 gives m ≈ 0.5 with the 20 GeV pion;
        // the 4 GeV photon sits 0.5 away in η and forms its own strip
        let particles = vec![
            ParticleCandidate::from_pdg(
                FourMomentum::from_pt_eta_phi_m(20.0, 0.0, 0.0, PION_MASS),
                211,
                1,
            ),
            ParticleCandidate::from_pdg(FourMomentum::from_pt_eta_phi_m(5.0, 0.0, 0.048, 0.0), 22, 0),
            ParticleCandidate::from_pdg(FourMomentum::from_pt_eta_phi_m(4.0, 0.5, 0.0, 0.0), 22, 0),
        ];

        let pools = CandidateGenerator::default().generate(&particles);
        assert_eq!(pools.hadrons.len(), 1);
        assert_eq!(pools.strips.len(), 2);

        let hypotheses = HypothesisEngine::new().run(&pools);
        assert_eq!(hypotheses.len(), 1);
        let guess = &hypotheses[0];
        assert_eq!(guess.topology, Topology::OneProngOneStrip);
        assert!((guess.scalar_pt_sum - 25.0).abs() < 1e-9);
        assert!(guess.mass() > 0.45 && guess.mass() < 0.55);
    }

    #[test]
    fn test_unresolved_hard_jet_is_background() {
        let event = EventRecord {
            jets: vec![jet(0, 45.0), jet(15, 45.0)],
            ..EventRecord::default()
        };
        let outcome = classifier(HpsConfig::loose())
            .classify_event(&event, 0)
            .unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        for candidate in &outcome.candidates {
            assert!(candidate.is_unresolved());
            assert_eq!(candidate.isolation, UNRESOLVED_ISOLATION);
            assert!(!candidate.is_signal);
        }
        let counters = outcome.counters;
        assert_eq!(counters.background_total, 1);
        assert_eq!(counters.background_identified, 1);
        assert_eq!(counters.signal_total, 1);
        assert_eq!(counters.signal_identified, 0);
        assert_eq!(counters.correct, 1);
    }

    #[test]
    fn test_soft_jets_produce_nothing_but_count() {
        let event = EventRecord {
            jets: vec![jet(15, 15.0)],
            ..EventRecord::default()
        };
        let outcome = classifier(HpsConfig::loose())
            .classify_event(&event, 0)
            .unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.counters.total, 1);
        assert_eq!(outcome.counters.signal_total, 0);
    }

    #[test]
    fn test_soft_candidate_in_hard_jet_predicted_background() {
        let event = EventRecord {
            jets: vec![jet(15, 45.0)],
            particles: vec![gen_particle(211, 1, 15.0, 0.0, 0.0)],
            ..EventRecord::default()
        };
        let outcome = classifier(HpsConfig::loose())
            .classify_event(&event, 0)
            .unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.counters.signal_total, 1);
        assert_eq!(outcome.counters.signal_identified, 0);
    }

    #[test]
    fn test_leptonic_jets_vetoed() {
        let event = EventRecord {
            jets: vec![jet(15, 45.0)],
            particles: vec![
                gen_particle(211, 1, 30.0, 0.0, 0.0),
                gen_particle(13, -1, 10.0, 0.1, 0.0),
            ],
            ..EventRecord::default()
        };

        let vetoed = classifier(HpsConfig::loose())
            .classify_event(&event, 0)
            .unwrap();
        assert!(vetoed.candidates.is_empty());
        assert_eq!(vetoed.counters.total, 0);
        assert_eq!(vetoed.vetoed_jets, 1);

        let kept = classifier(HpsConfig {
            veto_leptonic_decays: false,
            ..HpsConfig::loose()
        })
        .classify_event(&event, 0)
        .unwrap();
        assert_eq!(kept.candidates.len(), 1);
        assert_eq!(kept.counters.total, 1);
    }

    #[test]
    fn test_isolation_rejects_busy_candidate() {
        let event = EventRecord {
            jets: vec![jet(0, 45.0)],
            particles: vec![gen_particle(211, 1, 30.0, 0.0, 0.0)],
            isolation: vec![
                ParticleRecord {
                    pdg_id: 211,
                    charge: 1,
                    kinematics: kinematics(30.0, 0.0, 0.0, PION_MASS),
                },
                ParticleRecord {
                    pdg_id: 22,
                    charge: 0,
                    kinematics: kinematics(12.0, 0.2, 0.1, 0.0),
                },
            ],
            ..EventRecord::default()
        };
        let outcome = classifier(HpsConfig::working_point(0.2))
            .classify_event(&event, 0)
            .unwrap();
        let candidate = &outcome.candidates[0];
        assert!((candidate.isolation - 0.4).abs() < 1e-6);
        assert!(!candidate.is_signal);
        assert_eq!(outcome.counters.background_identified, 1);
        assert_eq!(outcome.isolation_records().len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DETECTOR-LEVEL TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod detector_tests {
    use super::*;

    fn pf(pdg_id: i32, charge: i32, pt: f64, eta: f64, phi: f64) -> ParticleRecord {
        let mass = if pdg_id.abs() == 211 { PION_MASS } else { 0.0 };
        ParticleRecord {
            pdg_id,
            charge,
            kinematics: kinematics(pt, eta, phi, mass),
        }
    }

    #[test]
    fn test_isolated_non_seeds_give_no_jets() {
        let candidates: Vec<ParticleRecord> =
            (0..6).map(|k| pf(22, 0, 30.0, 0.0, k as f64 * 1.0)).collect();
        let seeds: Vec<ParticleCandidate> =
            candidates.iter().map(ParticleRecord::to_candidate).collect();
        assert!(JetSeeder::new().seed_jets(&seeds).is_empty());

        let event = EventRecord {
            pf_candidates: candidates,
            ..EventRecord::default()
        };
        let config = HpsConfig {
            mode: ReconstructionMode::Detector,
            ..HpsConfig::loose()
        };
        let outcome = classifier(config).classify_event(&event, 0).unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.counters.total, 0);
    }

    #[test]
    fn test_matched_pf_jet_is_tau() {
        let event = EventRecord {
            pf_candidates: vec![pf(211, 1, 30.0, 0.0, 0.0), pf(-211, -1, 25.0, 1.0, 2.0)],
            tau_products: vec![TauProductRecord {
                tau_index: 0,
                pdg_id: 211,
                kinematics: kinematics(30.0, 0.0, 0.0, PION_MASS),
            }],
            ..EventRecord::default()
        };
        let config = HpsConfig {
            mode: ReconstructionMode::Detector,
            ..HpsConfig::working_point(0.2)
        };
        let outcome = classifier(config).classify_event(&event, 0).unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        let tau = &outcome.candidates[0];
        assert_eq!(tau.jet_flavor, 15);
        assert_eq!(tau.topology, Some(Topology::OneProng));
        assert!(tau.isolation.abs() < 1e-9);
        assert!(tau.is_signal);

        let other = &outcome.candidates[1];
        assert_eq!(other.jet_flavor, 0);
        assert!(other.is_signal);

        let counters = outcome.counters;
        assert_eq!(counters.signal_identified, 1);
        assert_eq!(counters.background_total, 1);
        assert_eq!(counters.background_identified, 0);
        assert_eq!(counters.correct, 1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN-LEVEL PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod run_tests {
    use super::*;
    use crate::dataset::{open_jsonl, JsonlEventReader};
    use std::collections::HashSet;
    use std::io::Cursor;

    #[test]
    fn test_parallel_matches_serial() {
        let dataset = EventDataset::synthetic(200, 5);
        for mode in [ReconstructionMode::Generator, ReconstructionMode::Detector] {
            let base = HpsConfig {
                mode,
                ..HpsConfig::working_point(0.3)
            };
            let serial = classifier(base.clone()).classify_all(&dataset.events);
            let parallel = classifier(HpsConfig {
                parallel: true,
                ..base
            })
            .classify_all(&dataset.events);
            assert_eq!(serial, parallel);
            assert_eq!(serial.events_processed, 200);
        }
    }

    #[test]
    fn test_candidates_in_event_then_jet_order() {
        let dataset = EventDataset::synthetic(100, 9);
        let report = classifier(HpsConfig {
            parallel: true,
            ..HpsConfig::loose()
        })
        .classify_all(&dataset.events);
        let keys: Vec<(u64, usize)> = report
            .candidates
            .iter()
            .map(|c| (c.event, c.jet_index))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_accuracy_invariants_on_synthetic_events() {
        let dataset = EventDataset::synthetic(300, 21);
        for cutoff in [-0.5, 0.0, 0.2, 1.0] {
            let report = classifier(HpsConfig::working_point(cutoff)).classify_all(&dataset.events);
            assert!(report.counters.is_consistent());
            assert!(report.counters.total > 0);
        }
    }

    #[test]
    fn test_seeded_jets_partition_and_order() {
        let dataset = EventDataset::synthetic(100, 13);
        let seeder = JetSeeder::new();
        for event in &dataset.events {
            let candidates = event.pf_candidates();
            let jets = seeder.seed_jets(&candidates);
            assert!(jets.len() <= 5);

            for pair in jets.windows(2) {
                assert!(pair[0].seed.pt() >= pair[1].seed.pt());
            }

            let mut seen = HashSet::new();
            for jet in &jets {
                assert!(jet.pt() > 20.0);
                for &k in &jet.member_indices {
                    assert!(seen.insert(k));
                }
            }
        }
    }

    #[test]
    fn test_topology_properties_on_synthetic_events() {
        let dataset = EventDataset::synthetic(200, 17);
        let generator = CandidateGenerator::default();
        let engine = HypothesisEngine::new();

        for event in &dataset.events {
            for index in 0..event.jets.len() {
                let pools = generator.generate(&event.jet_particles(index));
                for guess in engine.run(&pools) {
                    match guess.topology {
                        Topology::ThreeProng => {
                            assert_eq!(guess.constituents.len(), 3);
                            assert!(guess.mass() > 0.8 && guess.mass() < 1.5);
                        }
                        Topology::OneProng => {
                            assert_eq!(pools.hadrons.len(), 1);
                            assert!(pools.strips.is_empty());
                        }
                        _ => assert_eq!(guess.constituents.len(), guess.topology.n_constituents()),
                    }
                }
            }
        }
    }

    #[test]
    fn test_run_skips_malformed_events() {
        let good = EventRecord {
            jets: vec![jet(15, 45.0)],
            particles: vec![gen_particle(211, 1, 30.0, 0.0, 0.0)],
            ..EventRecord::default()
        };
        let mut dangling = good.clone();
        dangling.particles[0].jet_index = 4;

        let items = vec![
            Ok(good.clone()),
            Ok(dangling),
            Err(TauError::malformed(2, "undecodable line")),
            Ok(good),
        ];
        let report = classifier(HpsConfig::loose()).run(items).unwrap();
        assert_eq!(report.events_processed, 2);
        assert_eq!(report.events_skipped, 2);
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.candidates[1].event, 3);
    }

    #[test]
    fn test_run_aborts_on_io_error() {
        let items: Vec<crate::TauResult<EventRecord>> = vec![Err(TauError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk gone",
        )))];
        assert!(classifier(HpsConfig::loose()).run(items).is_err());
    }

    #[test]
    fn test_max_events_limits_run() {
        let dataset = EventDataset::synthetic(10, 1);
        let config = HpsConfig {
            max_events: Some(3),
            ..HpsConfig::loose()
        };
        let tau = classifier(config);
        assert_eq!(tau.run(dataset.iter_ok()).unwrap().events_processed, 3);
        assert_eq!(tau.classify_all(&dataset.events).events_processed, 3);
    }

    fn good_event() -> EventRecord {
        EventRecord {
            jets: vec![jet(15, 45.0)],
            particles: vec![gen_particle(211, 1, 30.0, 0.0, 0.0)],
            ..EventRecord::default()
        }
    }

    #[test]
    fn test_parallel_file_run_matches_serial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let line = serde_json::to_string(&good_event()).unwrap();
        std::fs::write(&path, format!("not json\n{}\n{}\n{}\n", line, line, line)).unwrap();

        let base = HpsConfig {
            max_events: Some(2),
            ..HpsConfig::loose()
        };
        let serial = classifier(base.clone()).run(open_jsonl(&path).unwrap()).unwrap();
        let parallel = classifier(HpsConfig {
            parallel: true,
            ..base
        })
        .run(open_jsonl(&path).unwrap())
        .unwrap();

        assert_eq!(serial, parallel);
        assert_eq!(serial.events_processed, 1);
        assert_eq!(serial.events_skipped, 1);
        let events: Vec<u64> = parallel.candidates.iter().map(|c| c.event).collect();
        assert_eq!(events, vec![1]);
    }

    #[test]
    fn test_undecodable_bytes_skip_one_event() {
        let line = serde_json::to_string(&good_event()).unwrap();
        let mut bytes = line.clone().into_bytes();
        bytes.extend_from_slice(b"\n\xff\xfe garbage\n");
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        for parallel in [false, true] {
            let config = HpsConfig {
                parallel,
                ..HpsConfig::loose()
            };
            let reader = JsonlEventReader::new(Cursor::new(bytes.clone()));
            let report = classifier(config).run(reader).unwrap();
            assert_eq!(report.events_processed, 2);
            assert_eq!(report.events_skipped, 1);
            assert_eq!(report.candidates[1].event, 2);
        }
    }

    #[test]
    fn test_parallel_run_aborts_on_io_error() {
        let items: Vec<crate::TauResult<EventRecord>> = vec![
            Ok(good_event()),
            Err(TauError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))),
        ];
        let config = HpsConfig {
            parallel: true,
            ..HpsConfig::loose()
        };
        assert!(matches!(classifier(config).run(items), Err(TauError::Io(_))));
    }
}
