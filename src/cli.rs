//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Code Fable - the story of a repository's architecture
///
/// Submit a repository to the Code Fable analysis service and read back its
/// dependency graph, narrative, hotspots, and architecture clusters.
///
/// Examples:
///   codefable analyze https://github.com/vercel/next.js
///   codefable analyze acme/widgets --cluster core --format json
///   codefable show "http://localhost:5173/?repo_id=42"
///   codefable history
///   codefable --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the analysis backend API
    #[arg(long, global = true, value_name = "URL", env = "CODEFABLE_API_URL")]
    pub api_url: Option<String>,

    /// Delay between job status polls, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Web application URL used for share links
    #[arg(long, global = true, value_name = "URL")]
    pub app_url: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .codefable.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .codefable.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Analyze a repository and show the result
    Analyze {
        /// Repository URL or owner/name
        #[arg(value_name = "REPO")]
        repo: String,

        /// Only show the graph of this cluster
        #[arg(long, value_name = "NAME")]
        cluster: Option<String>,
    },

    /// Show a stored analysis
    Show {
        /// Result id or share link
        #[arg(value_name = "ID_OR_LINK")]
        target: String,

        /// Only show the graph of this cluster
        #[arg(long, value_name = "NAME")]
        cluster: Option<String>,
    },

    /// List past analyses
    History,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (analyze, show, history)".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.poll_interval_ms == Some(0) {
            return Err("Poll interval must be at least 1 ms".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings. `verbose_default`
    /// comes from the config file; `--quiet` overrides it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
