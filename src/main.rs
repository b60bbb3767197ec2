//! Gleaner command-line entry point
//!
//! Crawling itself requires a site adapter (an [`gleaner::Extractor`]
//! implementation) and is driven programmatically through
//! [`gleaner::run_crawl`]. The binary covers the operational surface around
//! that: validating a configuration and inspecting existing store files.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use gleaner::config::load_config_with_hash;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Gleaner: incremental listing harvester
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "Incremental listing harvester core", long_about = None)]
#[command(group = ArgGroup::new("mode").required(true).args(["dry_run", "stats"]))]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Show record counts from the existing store files and exit
    #[arg(long)]
    stats: bool,

    /// Name of the status flag column in the store files (for --stats)
    #[arg(long, default_value = "flag")]
    flag_field: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config, &cli.flag_field)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows what would be crawled
fn handle_dry_run(config: &gleaner::Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Max concurrency: {}", config.crawl.max_concurrency);
    println!("  Scheduler window: {}", config.crawl.window);

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);

    println!("\nCategories ({}):", config.category.len());
    for entry in &config.category {
        println!("  - {} (id {})", entry.name, entry.id);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: counts records per status flag in each category's store
fn handle_stats(config: &gleaner::Config, flag_field: &str) -> anyhow::Result<()> {
    println!("=== Store Statistics ===\n");

    for entry in &config.category {
        let store_path = Path::new(&config.output.data_dir)
            .join(&entry.name)
            .join(format!("{}.csv", entry.name));

        if !store_path.is_file() {
            println!("{}: no store file at {}", entry.name, store_path.display());
            continue;
        }

        let (total, by_flag) = count_records(&store_path, flag_field)
            .with_context(|| format!("failed to read {}", store_path.display()))?;

        println!("{}: {} records", entry.name, total);
        for (flag, count) in by_flag {
            let label = match flag.as_str() {
                "0" => "new",
                "1" => "updated",
                "2" => "terminated",
                other => other,
            };
            println!("  {}: {}", label, count);
        }
    }

    Ok(())
}

/// Counts records in a store file, grouped by the status flag column
///
/// Reads the file generically (headers only, no schema needed) so the CLI
/// works against any site adapter's store.
fn count_records(path: &Path, flag_field: &str) -> anyhow::Result<(u64, BTreeMap<String, u64>)> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let flag_column = reader
        .headers()?
        .iter()
        .position(|name| name == flag_field);

    if flag_column.is_none() {
        tracing::warn!(
            "Store {} has no '{}' column; only totals are reported",
            path.display(),
            flag_field
        );
    }

    let mut total = 0u64;
    let mut by_flag: BTreeMap<String, u64> = BTreeMap::new();

    for row in reader.records() {
        let row = row?;
        total += 1;
        if let Some(column) = flag_column {
            let flag = row.get(column).unwrap_or("").to_string();
            *by_flag.entry(flag).or_insert(0) += 1;
        }
    }

    Ok((total, by_flag))
}
