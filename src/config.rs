//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (base configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`HOPLY_` prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [okvs]
//! backend = "fjall"
//! data_dir = "/var/lib/hoply/data"
//!
//! [okvs.performance]
//! scan_batch_size = 1000
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! HOPLY_OKVS__BACKEND=memory
//! HOPLY_OKVS__DATA_DIR=/custom/path
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub okvs: OkvsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which OKVS driver to open, and its tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkvsConfig {
    /// Which driver `Database::open` should construct.
    #[serde(default)]
    pub backend: Backend,

    /// Base directory for the persistent backend. Ignored by `Backend::Memory`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// OKVS backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `BTreeMap`-backed, process-local, non-persistent. The default: cheap
    /// to open, good for tests and embedding in a larger process.
    #[default]
    Memory,
    /// fjall-backed LSM keyspace on disk.
    Fjall,
}

/// Performance tuning knobs for scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of (key, value) pairs fetched per underlying cursor batch
    /// before the where-step yields control back to its consumer.
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig { scan_batch_size: default_scan_batch_size() }
    }
}

/// Logging configuration, read by binaries/tests that install a subscriber.
/// The library itself never installs a global subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level() }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_scan_batch_size() -> usize {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from default locations, merging:
    /// 1. `config.toml` (base configuration)
    /// 2. `config.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`HOPLY_` prefix, `__` nesting separator)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("HOPLY_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("HOPLY_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            okvs: OkvsConfig {
                backend: Backend::default(),
                data_dir: default_data_dir(),
                performance: PerformanceConfig::default(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
