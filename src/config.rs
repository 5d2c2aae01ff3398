//! Tracker configuration loaded from `permit.toml`.
//!
//! Values missing from the file fall back to defaults. The
//! `PERMIT_STORE_PATH` environment variable takes precedence over the file
//! for the store location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::service::RetryConfig;
use crate::workflow::Limits;

pub const CONFIG_FILE: &str = "permit.toml";
pub const STORE_PATH_ENV: &str = "PERMIT_STORE_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// JSON file backing the record store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Re-runs of the read-validate-write cycle after a version conflict.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Base backoff between conflict retries.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_max_permit_days")]
    pub max_permit_days: u32,

    #[serde(default = "default_max_renewal_hours")]
    pub max_renewal_hours: u32,

    /// Added to the permit counter, so the first permit is `WP-<offset + 1>`.
    #[serde(default = "default_permit_id_offset")]
    pub permit_id_offset: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("permits.json")
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    25
}

fn default_max_permit_days() -> u32 {
    7
}

fn default_max_renewal_hours() -> u32 {
    8
}

fn default_permit_id_offset() -> u64 {
    1000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            max_conflict_retries: default_max_conflict_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_permit_days: default_max_permit_days(),
            max_renewal_hours: default_max_renewal_hours(),
            permit_id_offset: default_permit_id_offset(),
        }
    }
}

impl TrackerConfig {
    /// Load `permit.toml` from the working directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<TrackerConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(store) = std::env::var(STORE_PATH_ENV)
            && !store.is_empty()
        {
            config.store_path = PathBuf::from(store);
        }

        Ok(config)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_permit_days: self.max_permit_days,
            max_renewal_hours: self.max_renewal_hours,
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_conflict_retries,
            base_delay_ms: self.retry_base_delay_ms,
        }
    }
}
