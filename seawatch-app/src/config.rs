use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// Runtime settings read from the YAML config file.
///
/// Every field has a default, so a partial file (or none at all) is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub readings_log: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    pub seed_poll_interval_ms: u64,
    pub seed_poll_attempts: u32,
    pub rng_seed: Option<u64>,
    pub run_for_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            catalog_path: PathBuf::from("seawatch-app/catalog.yaml"),
            readings_log: None,
            cache_ttl_secs: 10,
            seed_poll_interval_ms: 1_000,
            seed_poll_attempts: 30,
            rng_seed: None,
            run_for_secs: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn seed_poll_interval(&self) -> Duration {
        Duration::from_millis(self.seed_poll_interval_ms)
    }
}
