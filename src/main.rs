//! Doc-Digest main entry point
//!
//! This is the command-line interface for the Doc-Digest documentation condenser.

use clap::Parser;
use doc_digest::config::{load_config_with_hash, Config};
use doc_digest::job::JobContext;
use doc_digest::output::print_summary;
use doc_digest::source::{build_http_client, PageSource};
use doc_digest::summarize::GeminiClient;
use doc_digest::{
    CredentialRotator, DigestError, Dispatcher, OutputStore, RetryPolicy, RunSummary,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Doc-Digest: condensed documentation mirrors
///
/// Doc-Digest crawls a documentation site, condenses every page through a
/// hosted language model and writes one markdown file per page. Pages that
/// already have output are skipped, so an interrupted run can simply be
/// started again.
#[derive(Parser, Debug)]
#[command(name = "doc-digest")]
#[command(version)]
#[command(about = "Condense documentation sites into markdown", long_about = None)]
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

    /// Validate config and show what would be processed without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    match handle_run(config, config_hash).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed to start: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_digest=info,warn"),
            1 => EnvFilter::new("doc_digest=debug,info"),
            2 => EnvFilter::new("doc_digest=trace,debug"),
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

/// Handles the --dry-run mode: shows the configuration and the credential pool
fn handle_dry_run(config: &Config) {
    println!("=== Doc-Digest Dry Run ===\n");

    println!("Source:");
    println!("  Seeds: {}", config.source.seeds.len());
    for seed in &config.source.seeds {
        println!("    - {}", seed);
    }
    if let Some(sitemap) = &config.source.sitemap {
        println!("  Sitemap: {}", sitemap);
    }
    println!(
        "  Pattern: {}",
        config.source.pattern.as_deref().unwrap_or("(any)")
    );
    println!("  Max depth: {}", config.source.max_depth);

    println!("\nDispatcher:");
    println!("  Throttle: {}ms", config.dispatcher.throttle_ms);
    println!(
        "  Max concurrent jobs: {}",
        config.dispatcher.max_concurrent_jobs
    );

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}s base, {}s..{}s",
        config.retry.base_delay_secs, config.retry.min_delay_secs, config.retry.max_delay_secs
    );

    println!("\nSummarizer:");
    println!("  Endpoint: {}", config.summarizer.endpoint);
    println!("  Model: {}", config.summarizer.model);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Strip prefix: {:?}", config.output.strip_prefix);

    let rotator = CredentialRotator::from_env(
        &config.credentials.env_prefix,
        Duration::from_secs(config.credentials.cooldown_secs),
    );
    println!(
        "\nCredentials ({} matching '{}*'):",
        rotator.len(),
        config.credentials.env_prefix
    );
    for name in rotator.names() {
        println!("  - {}", name);
    }

    println!("\n✓ Configuration is valid");
}

/// Wires the pipeline together and runs it to completion
///
/// Only startup problems are errors here; failed jobs are reported in the
/// returned summary.
async fn handle_run(config: Config, config_hash: String) -> doc_digest::Result<RunSummary> {
    let rotator = CredentialRotator::from_env(
        &config.credentials.env_prefix,
        Duration::from_secs(config.credentials.cooldown_secs),
    );
    if rotator.is_empty() {
        return Err(DigestError::NoCredentials {
            prefix: config.credentials.env_prefix.clone(),
        });
    }
    tracing::info!("Loaded {} credential(s)", rotator.len());

    let store = OutputStore::from_config(&config.output);
    store.ensure_root().await?;
    tracing::info!("Writing output to {}", store.root().display());

    let client = build_http_client(&config.user_agent)?;
    let summarizer = GeminiClient::new(client.clone(), &config.summarizer);
    let results = PageSource::new(client, &config.source)?.start().await?;

    let ctx = JobContext::new(
        Arc::new(store),
        Arc::new(rotator),
        Arc::new(summarizer),
        RetryPolicy::from_config(&config.retry),
    );

    let summary = Dispatcher::from_config(&config.dispatcher)
        .run(
            results,
            ctx,
            RunSummary::start().with_config_hash(config_hash),
        )
        .await;

    Ok(summary)
}
