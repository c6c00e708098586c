//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `NEUROSIGNET_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `NEUROSIGNET_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `NEUROSIGNET_LIMITS__MAX_FILE_SIZE=1048576` sets the `limits.max_file_size` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`, `port_search_attempts` - HTTP server binding
//! - **Storage**: `storage.*` - directories for uploads, exports, logs, temp files and models
//! - **Limits**: `limits.max_file_size`, `limits.allowed_formats` - upload validation
//! - **Processing**: `processing.*` - default analysis flags and the simulated engine delay
//! - **Progress**: `progress.interval`, `progress.step` - progress channel pacing
//! - **CORS**: `cors.*` - cross-origin settings
//! - **Features**: `enable_metrics`, `enable_otel_export` - optional observability toggles
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! NEUROSIGNET_PORT=9000
//! NEUROSIGNET_PROCESSING__DELAY=500ms
//! NEUROSIGNET_ENABLE_METRICS=true
//! ```

use clap::{Parser, Subcommand};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// CLI args - config file location plus an optional subcommand
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "NEUROSIGNET_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Provision a self-contained installation directory
    Install {
        /// Installation root
        #[arg(long, default_value = "neurosignet")]
        dir: PathBuf,
        /// Directory to place a launcher shortcut in (e.g. your desktop)
        #[arg(long)]
        shortcut_dir: Option<PathBuf>,
        /// Install into a non-empty directory
        #[arg(long)]
        force: bool,
    },
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// First HTTP port to try
    pub port: u16,
    /// How many consecutive ports to try when `port` is taken (1 = no search)
    pub port_search_attempts: u16,
    /// Product metadata shown on the pages and in the health check
    pub metadata: Metadata,
    /// On-disk layout
    pub storage: StorageConfig,
    /// Upload validation limits
    pub limits: LimitsConfig,
    /// Analysis defaults
    pub processing: ProcessingConfig,
    /// Progress channel pacing
    pub progress: ProgressConfig,
    /// Cross-origin settings
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Product metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Metadata {
    /// Display name (e.g., "NeuroSigNet Pro")
    pub name: String,
    /// One-line description shown on the dashboard
    pub description: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "NeuroSigNet Pro".to_string(),
            description: "Professional Document Analysis & AI Enhancement System".to_string(),
        }
    }
}

/// Directory layout used by the service. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Uploaded documents, stored as `<task_id>_<filename>`
    pub uploads_dir: PathBuf,
    /// Exported artifacts, served read-only under `/exports`
    pub exports_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Reserved for model weights
    pub models_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "uploads".into(),
            exports_dir: "exports".into(),
            logs_dir: "logs".into(),
            temp_dir: "temp".into(),
            models_dir: "models".into(),
        }
    }
}

impl StorageConfig {
    /// Lay out every directory under a common root
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            uploads_dir: root.join("uploads"),
            exports_dir: root.join("exports"),
            logs_dir: root.join("logs"),
            temp_dir: root.join("temp"),
            models_dir: root.join("models"),
        }
    }
}

/// Upload validation limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size of a single document in bytes (default: 100 MiB)
    pub max_file_size: u64,
    /// Maximum number of documents accepted in one batch request
    pub max_batch_files: usize,
    /// Accepted extensions, lowercase with a leading dot
    pub allowed_formats: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_batch_files: 20,
            allowed_formats: [".jpg", ".jpeg", ".png", ".pdf", ".tiff", ".bmp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Analysis defaults applied when a form field is omitted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    pub auto_enhance: bool,
    pub detect_signatures: bool,
    pub detect_seals: bool,
    /// Language hint passed to the engine
    pub language: String,
    /// How long the simulated engine takes per document
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            auto_enhance: true,
            detect_signatures: true,
            detect_seals: true,
            language: "auto".to_string(),
            delay: Duration::from_secs(2),
        }
    }
}

/// Progress channel pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressConfig {
    /// Pause before each update
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Percentage points between updates
    pub step: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            step: 10,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard", serialize_with = "serialize_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn serialize_wildcard<S>(serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("*")
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            port_search_attempts: 50,
            metadata: Metadata::default(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            processing: ProcessingConfig::default(),
            progress: ProgressConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.port_search_attempts == 0 {
            return Err(Error::Internal {
                operation: "Config validation: port_search_attempts must be at least 1".to_string(),
            });
        }

        if self.limits.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_file_size cannot be 0".to_string(),
            });
        }

        if self.limits.max_batch_files == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_batch_files cannot be 0".to_string(),
            });
        }

        if self.limits.allowed_formats.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: limits.allowed_formats cannot be empty".to_string(),
            });
        }

        if let Some(bad) = self
            .limits
            .allowed_formats
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(Error::Internal {
                operation: format!("Config validation: allowed format '{bad}' must look like '.pdf'"),
            });
        }

        if self.progress.step == 0 || self.progress.step > 100 {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: progress.step must be between 1 and 100 (got {})",
                    self.progress.step
                ),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // NEUROSIGNET_CONFIG names the file itself and is not a config key
            .merge(Env::prefixed("NEUROSIGNET_").ignore(&["config"]).split("__"))
    }
}
