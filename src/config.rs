//! TOML configuration parsing.
//!
//! Only `[db]` is required. The remaining sections fall back to defaults:
//!
//! ```toml
//! [db]
//! path = "./data/strandweave.sqlite"
//!
//! [discovery]
//! min_strength = 0.0
//! limit = 50
//!
//! [taxonomy]
//! top_limit = 20
//!
//! [log]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Connections weaker than this are hidden from CLI output.
    #[serde(default)]
    pub min_strength: f64,
    #[serde(default = "default_discovery_limit")]
    pub limit: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_strength: 0.0,
            limit: default_discovery_limit(),
        }
    }
}

fn default_discovery_limit() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxonomyConfig {
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            top_limit: default_top_limit(),
        }
    }
}

fn default_top_limit() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogConfig {
    pub fn tracing_level(&self) -> Result<tracing::Level> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("log.level must be one of error, warn, info, debug, trace"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(0.0..=1.0).contains(&config.discovery.min_strength) {
        anyhow::bail!("discovery.min_strength must be in [0.0, 1.0]");
    }

    if config.discovery.limit < 1 {
        anyhow::bail!("discovery.limit must be >= 1");
    }

    if config.taxonomy.top_limit < 1 {
        anyhow::bail!("taxonomy.top_limit must be >= 1");
    }

    config.log.tracing_level()?;
    Ok(())
}
