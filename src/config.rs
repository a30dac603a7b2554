use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants;
use crate::error::Result;

/// Pipeline configuration, loaded once at startup. The file is optional;
/// defaults mirror the named constants in `constants.rs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum context captured on each side of a match, in characters.
    pub context_window_chars: usize,
    /// How close a 19xx/20xx token must be for a bare number to count as
    /// year-adjacent.
    pub year_adjacency_chars: usize,
    /// Widen the duplicate-group key with the sector. Off by default; the
    /// base key is (value, unit, year).
    pub dedup_include_sector: bool,
    pub alarms: AlarmThresholds,
    pub history_path: String,
    pub store_path: String,
    /// Directory the rotating JSON log files are written to.
    pub log_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlarmThresholds {
    pub max_removal_rate: f64,
    pub min_quality_score: f64,
    pub max_zero_value_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_window_chars: constants::CONTEXT_WINDOW_CHARS,
            year_adjacency_chars: constants::YEAR_ADJACENCY_CHARS,
            dedup_include_sector: false,
            alarms: AlarmThresholds::default(),
            history_path: "data/quality_history.ndjson".to_string(),
            store_path: "data/metrics.db".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            max_removal_rate: constants::MAX_REMOVAL_RATE,
            min_quality_score: constants::MIN_QUALITY_SCORE,
            max_zero_value_fraction: constants::MAX_ZERO_VALUE_FRACTION,
        }
    }
}

impl PipelineConfig {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = PipelineConfig::load_from("does-not-exist.toml").unwrap();
        assert_eq!(config.context_window_chars, 150);
        assert!(!config.dedup_include_sector);
        assert_eq!(config.alarms.max_removal_rate, 0.90);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "dedup_include_sector = true\n\n[alarms]\nmax_removal_rate = 0.5").unwrap();

        let config = PipelineConfig::load_from(&path).unwrap();
        assert!(config.dedup_include_sector);
        assert_eq!(config.alarms.max_removal_rate, 0.5);
        // untouched fields keep their defaults
        assert_eq!(config.context_window_chars, 150);
    }
}
