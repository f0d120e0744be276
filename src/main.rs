//! Catalog Crawler main entry point
//!
//! This is the command-line interface for the catalog crawler.

use anyhow::{bail, Context};
use catalog_crawler::config::{load_config_with_hash, Config};
use catalog_crawler::crawler::crawl;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog Crawler: walks an application catalog and lists package contents
///
/// Catalog Crawler traverses the catalog from a root page, downloads every
/// package it finds and appends one line per file inside each package to
/// the configured entries file.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawler")]
#[command(version)]
#[command(about = "Walks a package catalog and lists archive contents", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the maximum number of packages to download
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Override the maximum link depth from the root page
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e)
                .with_context(|| format!("Failed to load {}", cli.config.display()));
        }
    };

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawler=info,warn"),
            1 => EnvFilter::new("catalog_crawler=debug,info"),
            2 => EnvFilter::new("catalog_crawler=trace,debug"),
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

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(max_items) = cli.max_items {
        if max_items == 0 {
            bail!("--max-items must be at least 1");
        }
        tracing::info!("Overriding max items: {}", max_items);
        config.crawler.max_items = max_items;
    }

    if let Some(max_depth) = cli.max_depth {
        tracing::info!("Overriding max depth: {}", max_depth);
        config.crawler.max_depth = max_depth;
    }

    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Catalog Crawler Dry Run ===\n");

    println!("Site:");
    println!("  Base: {}://{}/", config.site.scheme, config.site.host);
    if !config.site.extra_hosts.is_empty() {
        println!("  Extra hosts: {}", config.site.extra_hosts.join(", "));
    }
    println!("  Allowed prefixes: {}", config.site.allowed_prefixes.join(", "));
    println!("  Leaf suffix: {}", config.site.leaf_suffix);
    println!(
        "  Download handler: {}?{}=<id>",
        config.site.download_handler_path, config.site.download_id_param
    );

    println!("\nCrawler Configuration:");
    println!("  Root path: {}", config.crawler.root_path);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max items: {}", config.crawler.max_items);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);

    println!("\nHTTP:");
    println!("  Proxies ({}):", config.http.proxies.len());
    for proxy in &config.http.proxies {
        println!("    - {}", proxy);
    }
    if config.http.user_agents.is_empty() {
        println!("  User agents: built-in rotation");
    } else {
        println!("  User agents: {} configured", config.http.user_agents.len());
    }

    println!("\nOutput:");
    println!("  Entries file: {}", config.output.entries_path);
    println!("  Unknown media type: {}", config.output.unknown_media_type);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Proxies: {}, entries file: {}",
        config.http.proxies.len(),
        config.output.entries_path
    );

    match crawl(config).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed successfully: {} entries from {} packages",
                stats.entries_written,
                stats.leaves_succeeded()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("Crawl aborted")
        }
    }
}
