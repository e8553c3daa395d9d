//! Configuration handling for the Prooflow CLI.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use prooflow_batch::BatchConfig;
use prooflow_core::SplitConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Batch lifecycle configuration
    #[serde(default)]
    pub batch: BatchSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size (characters)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Overlap between adjacent chunks (characters)
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    /// Hard ceiling on input size (characters)
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Keep paragraph breaks as the strongest boundary
    #[serde(default = "default_preserve_paragraphs")]
    pub preserve_paragraphs: bool,
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_overlap_size() -> usize {
    50
}

fn default_max_input_chars() -> usize {
    100_000
}

fn default_preserve_paragraphs() -> bool {
    true
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
            max_input_chars: default_max_input_chars(),
            preserve_paragraphs: default_preserve_paragraphs(),
        }
    }
}

impl ChunkingConfig {
    /// Build a [`SplitConfig`] from these settings.
    pub fn to_split_config(&self) -> SplitConfig {
        SplitConfig {
            max_chunk_size: self.max_chunk_size,
            overlap_size: self.overlap_size,
            max_input_chars: self.max_input_chars,
            preserve_paragraphs: self.preserve_paragraphs,
            ..Default::default()
        }
    }
}

/// Batch lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Max batches in pending or processing state
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    /// Per-batch timeout (seconds)
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// Retention of finished batches before eviction (seconds)
    #[serde(default = "default_max_batch_age_secs")]
    pub max_batch_age_secs: u64,

    /// Reaper sweep period (seconds)
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Max concurrent correction calls per batch run
    #[serde(default = "default_correction_concurrency")]
    pub correction_concurrency: usize,
}

fn default_max_concurrent_batches() -> usize {
    5
}

fn default_batch_timeout_secs() -> u64 {
    300
}

fn default_max_batch_age_secs() -> u64 {
    3600
}

fn default_reaper_interval_secs() -> u64 {
    60
}

fn default_correction_concurrency() -> usize {
    3
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent_batches: default_max_concurrent_batches(),
            batch_timeout_secs: default_batch_timeout_secs(),
            max_batch_age_secs: default_max_batch_age_secs(),
            reaper_interval_secs: default_reaper_interval_secs(),
            correction_concurrency: default_correction_concurrency(),
        }
    }
}

impl BatchSettings {
    /// Build a [`BatchConfig`] from these settings.
    pub fn to_batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_concurrent_batches: self.max_concurrent_batches,
            batch_timeout: Duration::from_secs(self.batch_timeout_secs),
            max_batch_age: Duration::from_secs(self.max_batch_age_secs),
            reaper_interval: Duration::from_secs(self.reaper_interval_secs),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from the default config path; missing file means defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(Some(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; the file must exist and parse.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// The default config file path.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("PROOFLOW_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.toml"));
        }
        ProjectDirs::from("", "", "prooflow").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// A sample configuration file with all defaults spelled out.
    pub fn sample_toml() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| "# failed to render sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.max_chunk_size, 1000);
        assert_eq!(config.chunking.overlap_size, 50);
        assert_eq!(config.batch.max_concurrent_batches, 5);
        assert_eq!(config.batch.batch_timeout_secs, 300);
        assert_eq!(config.batch.correction_concurrency, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_split_config() {
        let chunking = ChunkingConfig {
            max_chunk_size: 500,
            overlap_size: 10,
            ..Default::default()
        };
        let split = chunking.to_split_config();
        assert_eq!(split.max_chunk_size, 500);
        assert_eq!(split.overlap_size, 10);
        assert!(split.validate().is_ok());
    }

    #[test]
    fn test_to_batch_config() {
        let settings = BatchSettings {
            batch_timeout_secs: 10,
            ..Default::default()
        };
        let batch = settings.to_batch_config();
        assert_eq!(batch.batch_timeout, Duration::from_secs(10));
        assert_eq!(batch.max_concurrent_batches, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[chunking]\nmax_chunk_size = 800\n\n[batch]\nmax_concurrent_batches = 2\n"
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.chunking.max_chunk_size, 800);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.chunking.overlap_size, 50);
        assert_eq!(config.batch.max_concurrent_batches, 2);
        assert_eq!(config.batch.batch_timeout_secs, 300);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/prooflow.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_toml_round_trips() {
        let sample = Config::sample_toml();
        let parsed: Config = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.chunking.max_chunk_size, 1000);
        assert_eq!(parsed.batch.reaper_interval_secs, 60);
    }
}
