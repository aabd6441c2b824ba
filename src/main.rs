//! qtree-mirror main entry point
//!
//! This is the command-line interface for mirroring a question tree.

use anyhow::Context;
use clap::Parser;
use qtree_mirror::config::{load_config_with_hash, validate, Config};
use qtree_mirror::crawler::TreeCrawler;
use qtree_mirror::document::NodeId;
use qtree_mirror::output::{compute_statistics, print_statistics};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// qtree-mirror: mirrors a remote question tree to local XML files
///
/// Starting from a root node, every reachable node document is fetched,
/// written to the output directory and the question counts of leaf
/// nodes are summed.
#[derive(Parser, Debug)]
#[command(name = "qtree-mirror")]
#[command(version)]
#[command(about = "Mirrors a remote question tree to local XML files", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Start from this node id instead of the configured one
    #[arg(long, value_name = "ID")]
    root_id: Option<String>,

    /// Use this URL prefix instead of the configured tree root
    #[arg(long, value_name = "URL")]
    tree_root: Option<String>,

    /// Write documents to this directory instead of the configured one
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Additional node id to skip (repeatable)
    #[arg(long = "ignore", value_name = "ID")]
    ignore: Vec<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("qtree_mirror=info,warn"),
            1 => EnvFilter::new("qtree_mirror=debug,info"),
            2 => EnvFilter::new("qtree_mirror=trace,debug"),
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

/// Folds command-line overrides into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root_id) = &cli.root_id {
        config.crawler.root_id = root_id.clone();
    }
    if let Some(tree_root) = &cli.tree_root {
        config.crawler.tree_root = tree_root.clone();
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }
    config.ignore.ids.extend(cli.ignore.iter().cloned());
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== qtree-mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Tree root: {}", config.crawler.tree_root);
    println!("  Root id: {}", config.crawler.root_id);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Retries: {} (backoff {}ms .. {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay_ms, config.crawler.max_retry_delay_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Progress every: {} questions", config.crawler.progress_interval);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Extension: .{}", config.output.extension);

    println!(
        "\nIgnored Ids ({}, {:?} match):",
        config.ignore.ids.len(),
        config.ignore.mode
    );
    for id in &config.ignore.ids {
        println!("  - {}", id);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling at {}{}/xml",
        config.crawler.tree_root, config.crawler.root_id
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, quiet: bool) -> anyhow::Result<()> {
    let mut crawler = TreeCrawler::from_config(config).context("failed to set up crawler")?;

    // Stop starting new requests on Ctrl-C; the partial report is still printed
    let cancel = crawler.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            cancel.cancel();
        }
    });

    let root = NodeId::from(config.crawler.root_id.as_str());
    let report = match crawler.crawl(&root).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !quiet {
        print_statistics(&compute_statistics(&report));
    }

    if report.cancelled {
        tracing::warn!("Crawl was interrupted; the mirror is incomplete");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}
