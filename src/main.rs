//! Koedex main entry point
//!
//! This is the command-line interface for the Koedex voice archiver.

use anyhow::Context;
use clap::{Parser, Subcommand};
use koedex::config::load_config_with_hash;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Koedex: a polite voice-post archiver
///
/// Koedex harvests short audio posts from a paginated listing site into a
/// local SQLite archive, one page and one item at a time, and serves a
/// searchable browsing page over the collection.
#[derive(Parser, Debug)]
#[command(name = "koedex")]
#[command(version)]
#[command(about = "A polite voice-post archiver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one ingestion pass over the source site
    Scrape {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Walk at most this many listing pages (default: all discovered)
        #[arg(long, value_name = "N")]
        max_pages: Option<u32>,
    },

    /// Serve the browsing page over the collected corpus
    Serve {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print corpus statistics and exit
    Stats {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scrape { config, max_pages } => {
            let config = load_configuration(&config)?;
            handle_scrape(config, max_pages).await
        }
        Command::Serve { config, port } => {
            let mut config = load_configuration(&config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            handle_serve(config).await
        }
        Command::Stats { config } => {
            let config = load_configuration(&config)?;
            handle_stats(&config)
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
            0 => EnvFilter::new("koedex=info,warn"),
            1 => EnvFilter::new("koedex=debug,info"),
            2 => EnvFilter::new("koedex=trace,debug"),
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

/// Loads and validates the configuration, logging its content hash
fn load_configuration(path: &std::path::Path) -> anyhow::Result<koedex::Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the scrape subcommand
async fn handle_scrape(config: koedex::Config, max_pages: Option<u32>) -> anyhow::Result<()> {
    match max_pages {
        Some(cap) => tracing::info!("Starting scrape (capped at {} page(s))", cap),
        None => tracing::info!("Starting scrape (walking all discovered pages)"),
    }

    let summary = koedex::scrape::scrape(&config, max_pages).await?;

    println!("Scrape complete:");
    println!(
        "  Pages: {} walked of {} discovered ({} failed)",
        summary.pages_walked, summary.discovered_last_page, summary.pages_failed
    );
    println!("  New voices: {}", summary.new_voices);
    println!("  Already known: {}", summary.already_known);
    if summary.missing_ids > 0 {
        println!("  Links without id: {}", summary.missing_ids);
    }
    if summary.failed_items > 0 {
        println!("  Failed items: {}", summary.failed_items);
    }

    Ok(())
}

/// Handles the serve subcommand
async fn handle_serve(config: koedex::Config) -> anyhow::Result<()> {
    koedex::server::run_server(&config).await?;
    Ok(())
}

/// Handles the stats subcommand
fn handle_stats(config: &koedex::Config) -> anyhow::Result<()> {
    use koedex::server::{format_bytes, format_total_duration};
    use koedex::storage::{open_storage, VoiceStore};

    let store = open_storage(std::path::Path::new(&config.storage.database_path))?;
    let summary = store.summary()?;

    println!("Database: {}", config.storage.database_path);
    println!("  Voices: {}", summary.voice_count);
    println!(
        "  Total duration: {}",
        format_total_duration(summary.total_duration_seconds)
    );
    println!(
        "  Audio on disk: {}",
        format_bytes(summary.total_audio_bytes)
    );

    if let Some(newest) = store.list_voices(None, 1, 1)?.into_iter().next() {
        println!(
            "  Newest: {} by {} (downloaded {})",
            newest.title,
            newest.author,
            newest.downloaded_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
