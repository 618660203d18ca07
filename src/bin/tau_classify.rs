//! # Tau Classification Binary
//!
//! Reconstruct and classify hadronic tau candidates from an event file or
//! from synthetic events.
//!
//! ## Usage
//!
//! ```bash
//! # Classify a JSON Lines event file with an isolation working point
//! cargo run --release --bin tau_classify -- events.jsonl --iso-cutoff 0.2
//!
//! # Detector-level reconstruction on synthetic events, in parallel
//! cargo run --release --bin tau_classify -- --synthetic 10000 --mode detector --parallel
//!
//! # Start from a config file and write the candidates out
//! cargo run --release --bin tau_classify -- events.jsonl --config hps.json --output candidates.jsonl
//! ```

use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use tau_hps::{
    dataset::{open_jsonl, write_candidates_jsonl, EventDataset},
    ClassificationReport, HpsConfig, ReconstructionMode, TauClassifier,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Generator-level jets and particles
    Generator,
    /// Particle-flow candidates, seeded jets and truth matching
    Detector,
}

impl From<Mode> for ReconstructionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Generator => ReconstructionMode::Generator,
            Mode::Detector => ReconstructionMode::Detector,
        }
    }
}

/// HPS tau classifier
#[derive(Parser, Debug)]
#[command(name = "tau_classify")]
#[command(about = "Reconstruct and classify hadronic tau decays")]
struct Args {
    /// JSON Lines event file
    input: Option<PathBuf>,

    /// Generate this many synthetic events instead of reading a file
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<usize>,

    /// Seed for synthetic events
    #[arg(long, default_value = "42")]
    seed: u64,

    /// JSON config file; flags below override it
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Minimum hadron p_T
    #[arg(long)]
    hadron_pt_cut: Option<f64>,

    /// Minimum electron/photon p_T
    #[arg(long)]
    ep_pt_cut: Option<f64>,

    /// Isolation cutoff (omit to accept every candidate)
    #[arg(long)]
    iso_cutoff: Option<f64>,

    /// Stop after this many events
    #[arg(long, short = 'n')]
    max_events: Option<usize>,

    /// Reconstruction mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Classify events in parallel
    #[arg(long)]
    parallel: bool,

    /// Keep jets that look like leptonic decays
    #[arg(long)]
    keep_leptonic: bool,

    /// Write classified candidates here as JSON Lines
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> tau_hps::TauResult<HpsConfig> {
        let mut config = match &self.config {
            Some(path) => HpsConfig::from_json_file(path)?,
            None => HpsConfig::default(),
        };

        if let Some(cut) = self.hadron_pt_cut {
            config.hadron_pt_cut = cut;
        }
        if let Some(cut) = self.ep_pt_cut {
            config.electron_photon_pt_cut = cut;
        }
        if self.iso_cutoff.is_some() {
            config.isolation_cutoff = self.iso_cutoff;
        }
        if self.max_events.is_some() {
            config.max_events = self.max_events;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        config.parallel |= self.parallel;
        if self.keep_leptonic {
            config.veto_leptonic_decays = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.to_config()?;

    log::info!(
        "mode {}, hadron cut {}, e/γ cut {}, isolation cutoff {:?}",
        config.mode,
        config.hadron_pt_cut,
        config.electron_photon_pt_cut,
        config.isolation_cutoff
    );

    let classifier = TauClassifier::new(config)?;

    let report: ClassificationReport = match (&args.input, args.synthetic) {
        (Some(path), _) => classifier.run(open_jsonl(path)?)?,
        (None, Some(n)) => {
            let dataset = EventDataset::synthetic(n, args.seed);
            classifier.classify_all(&dataset.events)
        }
        (None, None) => {
            return Err("provide an event file or --synthetic <N>".into());
        }
    };

    println!("{}", report.summary());

    if let Some(path) = &args.output {
        write_candidates_jsonl(File::create(path)?, &report.candidates)?;
        log::info!(
            "wrote {} candidates to {}",
            report.candidates.len(),
            path.display()
        );
    }

    Ok(())
}
