//! JCRDT Simulation Runner (jcrdt-sim)
//!
//! Runs a seeded multi-replica simulation and reports whether every replica
//! converged to the same documents.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (3 nodes, 10 objects, 5 rounds)
//! jcrdt-sim
//!
//! # Reproduce a specific run
//! jcrdt-sim --seed 42 --nodes 5 --rounds 20
//!
//! # Push every batch through MessagePack
//! jcrdt-sim --wire-format msgpack
//!
//! # With configuration file
//! jcrdt-sim --config sim.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use jcrdt_codec::Format;
use jcrdt_sim::{SimConfig, SimReport, Simulation};

/// JCRDT simulation runner - convergence checks for the LWW document CRDT
#[derive(Parser, Debug)]
#[command(name = "jcrdt-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "JCRDT_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for the random source
    #[arg(long, env = "JCRDT_SEED")]
    seed: Option<u64>,

    /// Number of replicas
    #[arg(long, env = "JCRDT_NODES")]
    nodes: Option<usize>,

    /// Number of documents created up front
    #[arg(long, env = "JCRDT_OBJECTS")]
    objects: Option<usize>,

    /// Number of rounds
    #[arg(long, env = "JCRDT_ROUNDS")]
    rounds: Option<usize>,

    /// Operations issued per round
    #[arg(long)]
    operations_per_round: Option<usize>,

    /// Chance that a pending operation is rejected
    #[arg(long)]
    reject_probability: Option<f64>,

    /// Chance that a delivered operation is delivered twice
    #[arg(long)]
    duplicate_probability: Option<f64>,

    /// Encode batches on the way between replicas (json, msgpack)
    #[arg(long, env = "JCRDT_WIRE_FORMAT")]
    wire_format: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "JCRDT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    info!(config = ?config, "Loaded configuration");

    let mut simulation = Simulation::new(config).context("Invalid simulation configuration")?;
    let report = simulation.run().context("Simulation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.converged {
        anyhow::bail!("Replicas diverged (seed {})", report.seed);
    }
    Ok(())
}

/// File values first, then command-line and environment overrides.
fn build_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            SimConfig::load(path)?
        }
        None => SimConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
    }
    if let Some(objects) = args.objects {
        config.objects = objects;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(ops) = args.operations_per_round {
        config.operations_per_round = ops;
    }
    if let Some(p) = args.reject_probability {
        config.reject_probability = p;
    }
    if let Some(p) = args.duplicate_probability {
        config.duplicate_probability = p;
    }
    if let Some(format) = &args.wire_format {
        let format: Format = format.parse()?;
        config.wire_format = Some(format);
    }

    config.validate()?;
    Ok(config)
}

fn print_report(report: &SimReport) {
    let verdict = if report.converged {
        "CONVERGED".green().bold()
    } else {
        "DIVERGED".red().bold()
    };

    println!("{}", format!("  seed {}  ·  {} nodes  ·  {} objects  ·  {} rounds",
        report.seed, report.nodes, report.objects, report.rounds).cyan());
    println!("  Operations issued:     {:>8}", report.operations);
    println!("  Rejected:              {:>8}", report.rejected);
    println!("  Skipped updates:       {:>8}", report.skipped_updates);
    println!("  Idle steps:            {:>8}", report.idle_steps);
    println!("  Deliveries:            {:>8}", report.deliveries);
    println!("  Duplicates:            {:>8}", report.duplicates);
    println!("  Live documents:        {:>8}", report.live_documents);
    println!("  Deleted documents:     {:>8}", report.deleted_documents);
    println!("  Unreadable documents:  {:>8}", report.unreadable_documents);
    println!("  Result:                {verdict}");
}
