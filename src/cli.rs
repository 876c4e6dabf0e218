//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Namescan - streaming username enumeration client
///
/// Search a username across hundreds of external sites via a streaming
/// OSINT backend, watch results arrive live, and save a Markdown or
/// JSON report.
///
/// Examples:
///   namescan --username octocat
///   namescan --username octocat --endpoint http://10.0.0.5:8000 --format json
///   namescan --username octocat --save-results octocat.json
///   namescan --load octocat.json --output octocat.md
///   namescan --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Username to search for
    ///
    /// Not required when using --init-config or --load.
    #[arg(
        short,
        long,
        value_name = "NAME",
        required_unless_present_any = ["init_config", "load"]
    )]
    pub username: Option<String>,

    /// Base URL of the streaming search backend
    ///
    /// Can also be set via NAMESCAN_ENDPOINT env var or .namescan.toml.
    #[arg(short, long, value_name = "URL", env = "NAMESCAN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Output file path for the report
    ///
    /// Defaults to namescan_report.md (or the config file setting).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Save the raw results as a reloadable JSON snapshot
    #[arg(long, value_name = "FILE")]
    pub save_results: Option<PathBuf>,

    /// Render a previously saved snapshot instead of searching
    #[arg(long, value_name = "FILE", conflicts_with = "save_results")]
    pub load: Option<PathBuf>,

    /// Connection timeout in seconds
    ///
    /// Applies to connection establishment only; the open stream has
    /// no read deadline and runs until the backend finishes.
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .namescan.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (no progress bar, minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Omit the full per-result profile dump from the report
    #[arg(long)]
    pub no_profile_dump: bool,

    /// Generate a default .namescan.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format (reloadable snapshot)
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The username to search for, trimmed.
    pub fn query(&self) -> &str {
        self.username.as_deref().unwrap_or("").trim()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.load.is_none() && self.query().is_empty() {
            return Err("Username must not be empty".to_string());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.connect_timeout {
            if timeout == 0 {
                return Err("Connect timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref load_path) = self.load {
            if !load_path.exists() {
                return Err(format!(
                    "Snapshot file does not exist: {}",
                    load_path.display()
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
