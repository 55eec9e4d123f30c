use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vax_store::DurableConfig;

/// Errors loading a [`SchedulerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Scheduler settings, loadable from TOML.
///
/// ```toml
/// data_dir = "/var/lib/vax"
/// sync_every_write = true
/// hash_rounds = 20000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Directory of the write-ahead log; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// `fsync` after every committed transaction.
    pub sync_every_write: bool,
    /// Rewrite the log as a single snapshot on start-up.
    pub compact_on_open: bool,
    /// Credential stretching rounds.
    pub hash_rounds: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_every_write: false,
            compact_on_open: true,
            hash_rounds: vax_crypto::PasswordHasher::DEFAULT_ROUNDS,
        }
    }
}

impl SchedulerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn durable(&self) -> DurableConfig {
        DurableConfig {
            sync_every_write: self.sync_every_write,
            compact_on_open: self.compact_on_open,
        }
    }
}
