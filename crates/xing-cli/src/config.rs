//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use xing_core::{PredictionConfig, StatisticsConfig};
use xing_sync::{Ledger, LedgerResult};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the local event document.
    pub data_path: PathBuf,

    /// Name stamped on locally recorded events.
    pub origin: String,

    /// Base URL of the shared ledger. Unset means offline mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Per-request timeout for the ledger.
    pub remote_timeout_secs: u64,

    /// Keep only this many of the newest remote events on each pull.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_limit: Option<usize>,

    /// Period of `xing sync --watch`.
    pub sync_interval_secs: u64,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_path", &self.data_path)
            .field("origin", &self.origin)
            .field(
                "remote_url",
                &self.remote_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("remote_timeout_secs", &self.remote_timeout_secs)
            .field("fetch_limit", &self.fetch_limit)
            .field("sync_interval_secs", &self.sync_interval_secs)
            .field("prediction", &self.prediction)
            .field("statistics", &self.statistics)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_path: data_dir.join("barrier_data.json"),
            origin: default_origin(),
            remote_url: None,
            remote_timeout_secs: 10,
            fetch_limit: None,
            sync_interval_secs: 60,
            prediction: PredictionConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (XING_*, nested keys split on __)
        figment = figment.merge(Env::prefixed("XING_").split("__"));

        figment.extract()
    }

    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Selects the ledger variant for this run.
    pub fn ledger(&self) -> LedgerResult<Ledger> {
        Ledger::from_url(self.remote_url.as_deref(), self.remote_timeout())
    }
}

fn default_origin() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

/// Returns the platform-specific config directory for xing.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("xing"))
}

/// Returns the platform-specific data directory for xing.
///
/// On Linux: `~/.local/share/xing`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("xing"))
}
