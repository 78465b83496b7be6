//! User settings for Tally
//!
//! Manages the local owner identity, display preferences and evaluation
//! limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::paths::TallyPaths;
use crate::error::TallyError;
use crate::models::{Frequency, OwnerId};
use crate::services::resolver::DEFAULT_MAX_REFERENCE_DEPTH;

/// What a summary does when one transaction fails to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the transaction out and report it (default)
    #[default]
    Skip,
    /// Fail the whole summary
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(TallyError::Config(format!(
                "Invalid failure policy '{}': expected skip or abort",
                other
            ))),
        }
    }
}

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Owner of every local transaction; references resolve within it
    #[serde(default)]
    pub owner_id: OwnerId,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Frequency used when none is given
    #[serde(default)]
    pub default_frequency: Frequency,

    /// Maximum nested reference levels during resolution
    #[serde(default = "default_max_reference_depth")]
    pub max_reference_depth: usize,

    /// Summary behavior for transactions that fail to evaluate
    #[serde(default)]
    pub summary_failure_policy: FailurePolicy,

    /// Log filter used when neither `--verbose` nor `TALLY_LOG` is set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether `tally init` has been run
    #[serde(default)]
    pub setup_completed: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_max_reference_depth() -> usize {
    DEFAULT_MAX_REFERENCE_DEPTH
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            owner_id: OwnerId::new(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            default_frequency: Frequency::default(),
            max_reference_depth: default_max_reference_depth(),
            summary_failure_policy: FailurePolicy::default(),
            log_level: default_log_level(),
            setup_completed: false,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| TallyError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TallyError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TallyError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Update one setting by key, as used by `tally config <key> <value>`
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), TallyError> {
        match key {
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "date_format" => self.date_format = value.to_string(),
            "default_frequency" => self.default_frequency = Frequency::parse(value)?,
            "max_reference_depth" => {
                let depth: usize = value.parse().map_err(|_| {
                    TallyError::Config(format!("Invalid reference depth '{}'", value))
                })?;
                if depth == 0 {
                    return Err(TallyError::Config(
                        "max_reference_depth must be at least 1".into(),
                    ));
                }
                self.max_reference_depth = depth;
            }
            "summary_failure_policy" => self.summary_failure_policy = value.parse()?,
            "log_level" => self.log_level = value.to_string(),
            other => {
                return Err(TallyError::Config(format!("Unknown setting '{}'", other)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_frequency, Frequency::Month);
        assert_eq!(settings.max_reference_depth, 50);
        assert_eq!(settings.summary_failure_policy, FailurePolicy::Skip);
        assert_eq!(settings.log_level, "warn");
        assert!(!settings.setup_completed);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.summary_failure_policy = FailurePolicy::Abort;
        settings.setup_completed = true;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.owner_id, settings.owner_id);
        assert_eq!(loaded.summary_failure_policy, FailurePolicy::Abort);
        assert!(loaded.setup_completed);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"currency_symbol":"€"}"#).unwrap();
        assert_eq!(settings.currency_symbol, "€");
        assert_eq!(settings.max_reference_depth, 50);
        assert_eq!(settings.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_set() {
        let mut settings = Settings::default();
        settings.set("default_frequency", "week").unwrap();
        settings.set("max_reference_depth", "10").unwrap();
        settings.set("summary_failure_policy", "abort").unwrap();

        assert_eq!(settings.default_frequency, Frequency::Week);
        assert_eq!(settings.max_reference_depth, 10);
        assert_eq!(settings.summary_failure_policy, FailurePolicy::Abort);

        assert!(settings.set("default_frequency", "hourly").is_err());
        assert!(settings.set("max_reference_depth", "0").is_err());
        assert!(settings.set("owner_id", "x").is_err());
    }
}
