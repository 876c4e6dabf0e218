//! Namescan - streaming username enumeration client
//!
//! A CLI tool that searches a username across hundreds of external
//! sites through a streaming OSINT backend, groups positive matches by
//! category as they arrive, and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (search completed or was cancelled; report written)
//!   1 - Runtime error (connection, config, stream failure, etc.)

mod cli;
mod config;
mod models;
mod profile;
mod report;
mod search;
mod stream;
mod ui;

use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use models::{SearchSession, SearchStats, SessionStatus, Snapshot};
use report::ReportOptions;
use search::SearchAggregator;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use ui::ProgressDisplay;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Namescan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the search (or snapshot render)
    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Search failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .namescan.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".namescan.toml");

    if path.exists() {
        eprintln!("⚠️  .namescan.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .namescan.toml")?;

    println!("✅ Created .namescan.toml with default settings.");
    println!("   Edit it to customize the backend endpoint, output path, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch to snapshot rendering or a live search.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if let Some(load_path) = args.load.clone() {
        return render_snapshot(&load_path, &args, &config);
    }

    run_search(args, config).await
}

/// Run a complete live search workflow.
async fn run_search(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();
    let username = args.query().to_string();

    println!("🔍 Searching for '{}'", username);
    println!("   Backend: {}", config.search.endpoint);

    // Step 1: Open the event stream
    let client = stream::StreamClient::new(
        &config.search.endpoint,
        config.search.connect_timeout_seconds,
    )?;
    let mut events = client
        .open(&username)
        .await
        .context("Failed to open search stream")?;

    // Step 2: Start a session and consume the stream
    let mut aggregator = SearchAggregator::new(ProgressDisplay::new(args.quiet));
    let Some(session_id) = aggregator.start(&username) else {
        bail!("Could not start a search session for '{}'", username);
    };

    let mut transport_error = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                aggregator.cancel();
                break;
            }
            event = events.next_event() => match event {
                Ok(Some(payload)) => {
                    aggregator.handle_message(session_id, &payload);
                    if aggregator
                        .session()
                        .is_some_and(|s| s.status.is_terminal())
                    {
                        break;
                    }
                }
                Ok(None) => {
                    // Stream closed without a search_completed event
                    if aggregator.session().is_some_and(SearchSession::is_running) {
                        warn!("Stream ended before search completion");
                        aggregator.fail();
                    }
                    break;
                }
                Err(e) => {
                    aggregator.fail();
                    transport_error = Some(e);
                    break;
                }
            }
        }
    }

    let stats = aggregator.stats();
    let session = aggregator
        .session()
        .context("Session state missing after stream ended")?
        .clone();

    if let Some(e) = transport_error {
        aggregator.observer().clear();
        return Err(anyhow::Error::new(e).context("Stream transport failed"));
    }
    if session.status == SessionStatus::Errored {
        aggregator.observer().clear();
        bail!(
            "Stream ended unexpectedly after {} of {} sites",
            stats.scanned,
            stats.total
        );
    }

    if session.status == SessionStatus::Cancelled {
        println!(
            "\n🛑 Search cancelled. Keeping the {} result(s) collected so far.",
            stats.found
        );
    }

    // Step 3: Write the report (and optional snapshot)
    write_outputs(&args, &config, &session, stats, aggregator.buckets())?;

    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Search Summary:");
    println!("   Sites checked: {} / {}", stats.scanned, stats.total);
    println!("   Accounts found: {}", stats.found);
    println!("   Categories: {}", aggregator.buckets().len());
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Report saved to: {}", config.general.output);

    Ok(())
}

/// Handle --load: rebuild the read model from a saved snapshot and
/// render it, without opening a stream.
fn render_snapshot(path: &Path, args: &Args, config: &Config) -> Result<()> {
    info!("Loading snapshot from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;

    let mut aggregator = SearchAggregator::new(());
    aggregator.load_completed(snapshot);

    let stats = aggregator.stats();
    let session = aggregator
        .session()
        .context("Snapshot did not produce a session")?
        .clone();

    write_outputs(args, config, &session, stats, aggregator.buckets())?;

    println!("📄 Rendered snapshot for '{}'", session.query);
    println!("   Sites checked: {} / {}", stats.scanned, stats.total);
    println!("   Accounts found: {}", stats.found);
    println!("\n✅ Report saved to: {}", config.general.output);

    Ok(())
}

/// Generate the report in the requested format and write it, plus the
/// optional --save-results snapshot.
fn write_outputs(
    args: &Args,
    config: &Config,
    session: &SearchSession,
    stats: SearchStats,
    buckets: &[models::CategoryBucket],
) -> Result<()> {
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(session, stats, buckets)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            session,
            stats,
            buckets,
            ReportOptions {
                include_profile_dump: config.report.include_profile_data,
            },
        ),
    };

    std::fs::write(&config.general.output, &output)
        .with_context(|| format!("Failed to write report to {}", config.general.output))?;

    if let Some(ref save_path) = args.save_results {
        let snapshot = report::to_snapshot(session, stats, buckets);
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize results")?;
        std::fs::write(save_path, json)
            .with_context(|| format!("Failed to write snapshot to {}", save_path.display()))?;
        println!("💾 Raw results saved to: {}", save_path.display());
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .namescan.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
