//! MVTO workload driver
//!
//! The `mvto` binary builds a store, generates a random workload, runs it on
//! worker threads, and reports throughput, aborts, and the surviving item
//! versions.
//!
//! # Usage
//!
//! ```bash
//! # Default run: 5 items, 4 workers, 3000 transactions of 30 steps
//! mvto
//!
//! # Heavier contention with frequent GC
//! mvto --items 2 --threads 8 --gc-threshold 10
//!
//! # Use a configuration file, dump every item afterwards
//! mvto --config mvto.toml --dump-items
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mvto_common::config::RunConfig;
use mvto_mvcc::Store;
use mvto_txn::{run_workload, WorkloadGenerator};

/// MVTO workload driver
#[derive(Parser, Debug)]
#[command(
    name = "mvto",
    version,
    about = "Multi-version timestamp ordering workload driver",
    long_about = "Runs a random read/write workload against an in-memory MVTO store.\n\n\
                  Settings come from the defaults, then the config file, then the flags."
)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", env = "MVTO_CONFIG")]
    config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short = 't', long, env = "MVTO_THREADS")]
    threads: Option<usize>,

    /// Number of data items
    #[arg(short = 'i', long, env = "MVTO_ITEMS")]
    items: Option<usize>,

    /// Total number of transactions
    #[arg(short = 'n', long)]
    transactions: Option<usize>,

    /// Steps per transaction
    #[arg(short = 's', long)]
    steps: Option<usize>,

    /// Probability that a step is a read
    #[arg(long)]
    read_probability: Option<f64>,

    /// Workload seed
    #[arg(long)]
    seed: Option<u64>,

    /// Watermark advance that triggers a GC sweep
    #[arg(long, env = "MVTO_GC_THRESHOLD")]
    gc_threshold: Option<u64>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "MVTO_LOG_LEVEL")]
    log_level: String,

    /// Print configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print every item's versions and readers after the run
    #[arg(long)]
    dump_items: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    if let Err(err) = run(&config, args.dump_items) {
        error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_str()
    };

    let filter = EnvFilter::try_new(format!(
        "mvto={level},mvto_mvcc={level},mvto_txn={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_config(args: &Args) -> Result<RunConfig> {
    let mut config = if let Some(path) = &args.config {
        RunConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        RunConfig::default()
    };

    let workload = &mut config.workload;
    if let Some(threads) = args.threads {
        workload.threads = threads;
    }
    if let Some(items) = args.items {
        workload.items = items;
    }
    if let Some(transactions) = args.transactions {
        workload.transactions = transactions;
    }
    if let Some(steps) = args.steps {
        workload.steps_per_txn = steps;
    }
    if let Some(read_probability) = args.read_probability {
        workload.read_probability = read_probability;
    }
    if let Some(seed) = args.seed {
        workload.seed = seed;
    }
    if let Some(gc_threshold) = args.gc_threshold {
        config.engine.gc_threshold = gc_threshold;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(config: &RunConfig, dump_items: bool) -> Result<()> {
    let workload = &config.workload;
    info!("Run configuration:");
    info!("  Threads: {}", workload.threads);
    info!("  Items: {}", workload.items);
    info!(
        "  Transactions: {} x {} steps",
        workload.transactions, workload.steps_per_txn
    );
    info!("  Read probability: {}", workload.read_probability);
    info!("  GC threshold: {}", config.engine.gc_threshold);

    let store = Arc::new(
        Store::with_item_count(workload.items, config.engine.clone())
            .context("Failed to create store")?,
    );
    let batches = WorkloadGenerator::new(workload)
        .context("Failed to create workload generator")?
        .generate();

    let report = run_workload(Arc::clone(&store), batches).context("Workload failed")?;
    store.verify().context("Store invariants violated after run")?;

    let stats = store.stats();
    println!("{}", report);
    println!(
        "store: {} items, {} timestamps issued, {} aborts, {} gc runs, {} versions collected",
        stats.items, stats.issued, stats.aborts, stats.gc_runs, stats.versions_collected
    );

    if dump_items {
        for snapshot in store.report().items {
            println!("{}", snapshot);
        }
    }

    info!("Run complete");
    Ok(())
}
