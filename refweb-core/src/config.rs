// Runtime configuration, loaded from JSON and overridden by CLI flags

use crate::error::{CoreError, Result};
use refweb_graph::assemble::{DEFAULT_EXCERPT_CHARS, DEFAULT_PERMALINK_BASE};
use refweb_graph::{AssembleOptions, Easing, SizeScaler};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub database: PathBuf,
    pub corpus_dir: PathBuf,
    pub pool: PoolSettings,
    pub sizing: SizingSettings,
    pub graph: GraphSettings,
    pub population: PopulationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("~/.config/refweb/refweb.db"),
            corpus_dir: PathBuf::from("~/.config/refweb/corpus"),
            pool: PoolSettings::default(),
            sizing: SizingSettings::default(),
            graph: GraphSettings::default(),
            population: PopulationSettings::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            return Err(CoreError::Config("pool.maxConnections must be at least 1".to_string()));
        }
        if self.pool.max_attempts == 0 {
            return Err(CoreError::Config("pool.maxAttempts must be at least 1".to_string()));
        }
        if !(self.sizing.min_size.is_finite() && self.sizing.max_size.is_finite())
            || self.sizing.min_size > self.sizing.max_size
        {
            return Err(CoreError::Config(format!(
                "sizing range [{}, {}] is invalid",
                self.sizing.min_size, self.sizing.max_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolSettings {
    pub max_connections: usize,
    pub acquire_timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            acquire_timeout_ms: 5_000,
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingSettings {
    pub min_size: f64,
    pub max_size: f64,
    /// Logistic easing steepness; `None` maps linearly
    pub steepness: Option<f64>,
}

impl SizingSettings {
    pub fn scaler(&self) -> SizeScaler {
        let easing = match self.steepness {
            Some(steepness) => Easing::Logistic { steepness },
            None => Easing::Linear,
        };
        SizeScaler::new(self.min_size, self.max_size).with_easing(easing)
    }
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            min_size: 10.0,
            max_size: 100.0,
            steepness: Some(6.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphSettings {
    pub permalink_base: Url,
    pub excerpt_chars: usize,
    pub include_authorship: bool,
}

impl GraphSettings {
    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            permalink_base: self.permalink_base.clone(),
            excerpt_chars: self.excerpt_chars,
            include_authorship: self.include_authorship,
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        let defaults = AssembleOptions::default();
        Self {
            permalink_base: defaults.permalink_base,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            include_authorship: defaults.include_authorship,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopulationSettings {
    pub depth: u32,
    pub max_storage_bytes: u64,
    pub pacing_ms: u64,
    /// Case-insensitive name fragments excluded from population runs
    pub denylist: Vec<String>,
    pub show_progress_bars: bool,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            depth: 2,
            max_storage_bytes: 32 * GIB,
            pacing_ms: 250,
            denylist: vec!["meetup".to_string()],
            show_progress_bars: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let pool = PoolSettings {
            backoff_ms: 100,
            ..PoolSettings::default()
        };
        assert_eq!(pool.backoff(1), Duration::from_millis(100));
        assert_eq!(pool.backoff(2), Duration::from_millis(200));
        assert_eq!(pool.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_default_permalink_base() {
        assert_eq!(
            GraphSettings::default().permalink_base.as_str(),
            DEFAULT_PERMALINK_BASE
        );
    }
}
