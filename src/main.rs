//! OptOut Proof CLI
//!
//! Runs the complete proof-of-deletion demonstration: generate and encrypt a
//! synthetic dataset, persist it, opt out one row and print the proof.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use optout_proof::backend::CkksBackend;
use optout_proof::config::ProtocolConfig;
use optout_proof::dataset::DataGenerator;
use optout_proof::protocol::{PipelineContext, PipelineReport};
use optout_proof::utils::{Helpers, Logger};

#[derive(Parser)]
#[command(name = "optout_proof", version)]
#[command(about = "Proof of deletion over an encrypted dataset", long_about = None)]
struct Cli {
    /// Row to opt out, in [0, patients)
    target_index: usize,

    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rows per column
    #[arg(long)]
    patients: Option<usize>,

    /// Number of columns
    #[arg(long)]
    variables: Option<usize>,

    /// Row selected by the verification indicator (defaults to the target)
    #[arg(long)]
    verify_index: Option<usize>,

    /// Worker threads: 0 = all cores, 1 = sequential
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for data and encryption randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the encrypted columns
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip writing the encrypted dataset
    #[arg(long)]
    no_persist: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<ProtocolConfig> {
        let mut config = match &self.config {
            Some(path) => ProtocolConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ProtocolConfig::default(),
        };

        config.target_index = self.target_index;
        if let Some(n) = self.patients {
            config.n_patients = n;
        }
        if let Some(n) = self.variables {
            config.n_variables = n;
        }
        if self.verify_index.is_some() {
            config.verify_index = self.verify_index;
        }
        if let Some(t) = self.threads {
            config.threads = t;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.no_persist {
            config.persist = false;
        }
        Ok(config)
    }
}

fn print_report(report: &PipelineReport, tolerance: f64) {
    let t = &report.timings;
    println!("Batch size: {}", report.batch_size);
    println!(
        "Dataset: {} patients x {} variables",
        report.n_patients, report.n_variables
    );
    println!("Key generation: {}", Helpers::format_duration(t.key_generation));
    println!("Encryption: {}", Helpers::format_duration(t.encryption));
    if let Some(persist) = &report.persist {
        println!(
            "Persistence: {} ({} files, {}, {} failed)",
            Helpers::format_duration(t.persistence),
            persist.written.len(),
            Helpers::format_bytes(persist.total_bytes()),
            persist.failed.len()
        );
    }
    println!("Masking: {}", Helpers::format_duration(t.masking));
    println!("Verification: {}", Helpers::format_duration(t.verification));
    println!("Extraction: {}", Helpers::format_duration(t.extraction));
    println!("Total: {}", Helpers::format_duration(t.total()));

    let proof = &report.proof;
    println!(
        "Proof (target {}, verified {}): {}",
        proof.target_index,
        proof.verify_index,
        Helpers::format_proof(&proof.values, 6)
    );
    if proof.target_index == proof.verify_index {
        let verdict = if proof.confirms_deletion(tolerance) {
            "confirmed"
        } else {
            "NOT confirmed"
        };
        println!(
            "Deletion {verdict}: max |value| = {:.3e}, tolerance {:.0e}",
            proof.max_abs(),
            tolerance
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level: LevelFilter = Logger::parse_level(&cli.log_level)?;
    Logger::init_with_level(level);

    let config = cli.into_config()?;
    config.validate().context("invalid run configuration")?;

    let backend =
        CkksBackend::new(&config.ckks_parameters()).context("setting up CKKS parameters")?;
    let tolerance = config.tolerance;
    let seed = config.seed.unwrap_or_else(rand::random);
    let pipeline = PipelineContext::new(backend, config).context("initializing pipeline")?;

    let report = pipeline
        .run(&DataGenerator::new(seed))
        .context("running opt-out protocol")?;
    print_report(&report, tolerance);

    Ok(())
}
