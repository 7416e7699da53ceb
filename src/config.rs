//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.codefable.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".codefable.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis backend settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Share link settings.
    #[serde(default)]
    pub share: ShareConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write the report here instead of stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Analysis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between job status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ApiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// Share link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// URL of the web application that share links point to.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
        }
    }
}

fn default_app_url() -> String {
    "http://localhost:5173".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Maximum hotspots listed in Markdown reports.
    #[serde(default = "default_max_hotspots")]
    pub max_hotspots: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            max_hotspots: default_max_hotspots(),
        }
    }
}

fn default_max_hotspots() -> usize {
    10
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.codefable.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(interval) = args.poll_interval_ms {
            self.api.poll_interval_ms = interval;
        }
        if let Some(ref app_url) = args.app_url {
            self.share.app_url = app_url.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that can come from either the file or the command line.
    pub fn validate(&self) -> Result<()> {
        if self.api.poll_interval_ms == 0 {
            bail!("api.poll_interval_ms must be at least 1");
        }
        let base_url = &self.api.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("api.base_url must start with 'http://' or 'https://': {}", base_url);
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
