//! rustlinkage - Scholar/DBLP Record Linkage Pipeline
//!
//! Cleans two bibliographic exports, collapses near-duplicates within each, generates
//! cross-source candidate pairs by blocking, and measures recall against a gold mapping.
//!
//! ## Usage
//!
//! ### Full pipeline
//! ```bash
//! rustlinkage run --scholar data/Scholar.csv --dblp data/DBLP1.csv \
//!     --gold data/DBLP-Scholar_perfectMapping.csv
//! ```
//!
//! ### Single stages
//! ```bash
//! rustlinkage clean --input data/Scholar.csv --source scholar
//! rustlinkage block --scholar out/scholar_deduplicated.csv --dblp out/dblp_deduplicated.csv \
//!     --gold data/DBLP-Scholar_perfectMapping.csv
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rustlinkage::{
    blocking::CandidateRule,
    config::PipelineConfig,
    dataset,
    normalize::normalize_records,
    pipeline::{self, CleanedSource, LinkageReport},
    records::Source,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scholar/DBLP Record Linkage Pipeline
#[derive(Parser)]
#[command(name = "rustlinkage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// JSON file with pipeline thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage: clean both sources, block, evaluate
    Run {
        /// Scholar source CSV
        #[arg(long)]
        scholar: PathBuf,

        /// DBLP source CSV
        #[arg(long)]
        dblp: PathBuf,

        /// Gold mapping CSV (idScholar, idDBLP)
        #[arg(long)]
        gold: PathBuf,

        /// Output directory (a timestamped folder is created inside)
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Normalize, noise-filter and deduplicate one source
    Clean {
        /// Source CSV
        #[arg(long)]
        input: PathBuf,

        /// Which catalog the file comes from: scholar or dblp
        #[arg(long, value_parser = ["scholar", "dblp"])]
        source: String,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Block two deduplicated sources and evaluate recall
    Block {
        /// Deduplicated Scholar CSV
        #[arg(long)]
        scholar: PathBuf,

        /// Deduplicated DBLP CSV
        #[arg(long)]
        dblp: PathBuf,

        /// Gold mapping CSV (idScholar, idDBLP)
        #[arg(long)]
        gold: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Per-run overrides on top of the config file.
#[derive(clap::Args, Default)]
struct Overrides {
    /// Title-token Jaccard threshold for duplicates
    #[arg(long)]
    threshold: Option<f64>,

    /// Candidate rule: title-with-author-core, author-or-title, author-and-title
    #[arg(long, value_parser = ["title-with-author-core", "author-or-title", "author-and-title"])]
    rule: Option<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Run {
            scholar,
            dblp,
            gold,
            output,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides)?;
            run_full_pipeline(&scholar, &dblp, &gold, &output, &config)
        }
        Commands::Clean {
            input,
            source,
            output,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides)?;
            let source: Source = source.parse().map_err(anyhow::Error::msg)?;
            run_clean(&input, source, &output, &config)
        }
        Commands::Block {
            scholar,
            dblp,
            gold,
            output,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides)?;
            run_block(&scholar, &dblp, &gold, &output, &config)
        }
    }
}

/// Build the effective config: defaults, then the file, then CLI flags.
fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(threshold) = overrides.threshold {
        config.dedup_threshold = threshold;
    }
    if let Some(ref rule) = overrides.rule {
        config.candidate_rule = rule.parse::<CandidateRule>().map_err(anyhow::Error::msg)?;
    }

    config.validate().context("Invalid pipeline config")?;
    Ok(config)
}

// ============================================================================
// Pipelines
// ============================================================================

fn run_full_pipeline(
    scholar_path: &Path,
    dblp_path: &Path,
    gold_path: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_folder = output_dir.join(format!("{}_linkage", timestamp));
    std::fs::create_dir_all(&output_folder).context("Failed to create output directory")?;

    println!("Output folder: {}", output_folder.display());

    // ===========================================
    // STAGE 1: Load
    // ===========================================
    println!("\n--- Stage 1: Loading Sources ---");

    let scholar_raw = dataset::load_records(scholar_path, Source::Scholar)
        .with_context(|| format!("Failed to load {}", scholar_path.display()))?;
    let dblp_raw = dataset::load_records(dblp_path, Source::Dblp)
        .with_context(|| format!("Failed to load {}", dblp_path.display()))?;
    let gold = dataset::load_gold(gold_path)
        .with_context(|| format!("Failed to load {}", gold_path.display()))?;

    println!(
        "Loaded {} Scholar records, {} DBLP records, {} gold pairs.",
        scholar_raw.len(),
        dblp_raw.len(),
        gold.len()
    );

    // ===========================================
    // STAGE 2 & 3: Clean, Dedup, Block, Evaluate
    // ===========================================
    println!("\n--- Stage 2: Cleaning and Deduplication ---");

    let output = pipeline::run(&scholar_raw, &dblp_raw, &gold, config);

    for cleaned in [&output.scholar, &output.dblp] {
        save_cleaned(&output_folder, cleaned)?;
        println!("{}", cleaned.stats);
    }

    println!("\n--- Stage 3: Blocking and Evaluation ---");

    let pairs_path = output_folder.join("candidate_pairs.csv");
    dataset::write_pairs(&pairs_path, &output.linkage.blocking.candidates)
        .context("Failed to write candidate pairs")?;

    save_report(&output_folder, &output.linkage.report)?;

    println!("\n✓ Pipeline complete. Results in: {}", output_folder.display());
    Ok(())
}

fn run_clean(input: &Path, source: Source, output_dir: &Path, config: &PipelineConfig) -> Result<()> {
    std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    let raw = dataset::load_records(input, source)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    println!("Loaded {} {} records.", raw.len(), source);

    let cleaned = pipeline::clean_source(source, &raw, config);
    save_cleaned(output_dir, &cleaned)?;
    println!("{}", cleaned.stats);
    Ok(())
}

fn run_block(
    scholar_path: &Path,
    dblp_path: &Path,
    gold_path: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<()> {
    std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    // Inputs are already cleaned; normalizing again leaves them unchanged
    let scholar = normalize_records(
        &dataset::load_records(scholar_path, Source::Scholar)
            .with_context(|| format!("Failed to load {}", scholar_path.display()))?,
    );
    let dblp = normalize_records(
        &dataset::load_records(dblp_path, Source::Dblp)
            .with_context(|| format!("Failed to load {}", dblp_path.display()))?,
    );
    let gold = dataset::load_gold(gold_path)
        .with_context(|| format!("Failed to load {}", gold_path.display()))?;

    let linkage = pipeline::link(&scholar, &dblp, &gold, config);

    let pairs_path = output_dir.join("candidate_pairs.csv");
    dataset::write_pairs(&pairs_path, &linkage.blocking.candidates)
        .context("Failed to write candidate pairs")?;

    save_report(output_dir, &linkage.report)
}

/// Save both per-source stage tables
fn save_cleaned(output_dir: &Path, cleaned: &CleanedSource) -> Result<()> {
    let cleaned_path = output_dir.join(format!("{}_cleaned.csv", cleaned.source));
    dataset::write_records(&cleaned_path, &cleaned.cleaned)
        .context("Failed to write cleaned records")?;

    let dedup_path = output_dir.join(format!("{}_deduplicated.csv", cleaned.source));
    dataset::write_records(&dedup_path, &cleaned.deduplicated)
        .context("Failed to write deduplicated records")?;

    let groups_path = output_dir.join(format!("{}_duplicates.csv", cleaned.source));
    dataset::write_duplicate_groups(&groups_path, &cleaned.duplicate_groups)
        .context("Failed to write duplicate groups")?;

    info!(
        source = %cleaned.source,
        groups = cleaned.duplicate_groups.len(),
        "Saved {} and {}",
        cleaned_path.display(),
        dedup_path.display()
    );
    Ok(())
}

/// Print the report and save it as JSON
fn save_report(output_dir: &Path, report: &LinkageReport) -> Result<()> {
    println!("{}", report);

    let report_path = output_dir.join("report.json");
    dataset::write_report(&report_path, report).context("Failed to write report")?;
    println!("Saved: {:?}", report_path);
    Ok(())
}
