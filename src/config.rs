//! TOML-based engine configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults except the profile list, which is empty by
/// default (residential estimation needs no profile). Load from TOML with
/// [`EngineConfig::from_toml_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Rate table location.
    pub dataset: DatasetConfig,
    /// Phrase-list files for filtering and EV-rate detection.
    pub filters: FiltersConfig,
    /// Worker pool parameters.
    pub batch: BatchConfig,
    /// Output directory.
    pub output: OutputConfig,
    /// Station load profiles, one costing pass each.
    pub profiles: Vec<ProfileConfig>,
}

/// Rate table location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Path to the wide row-per-tariff CSV.
    pub rates_path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            rates_path: PathBuf::from("data/usurdb.csv"),
        }
    }
}

/// Phrase-list files, one phrase per line. Empty paths disable the
/// corresponding filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    /// Exclusion phrases for residential rate names/descriptions.
    pub residential_exclusions: Option<PathBuf>,
    /// Exclusion phrases for commercial rate names/descriptions.
    pub commercial_exclusions: Option<PathBuf>,
    /// Phrases marking a residential rate as EV-specific.
    pub ev_rate_phrases: Option<PathBuf>,
}

/// Worker pool parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker count; 0 selects the machine's available parallelism.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

/// Output directory for cost, flag, and rate CSVs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
        }
    }
}

/// One station load profile to cost the commercial set against.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Identifier used in output file names.
    pub id: String,
    /// Path to the timestamp/kW CSV.
    pub path: PathBuf,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"profiles[0].id"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.dataset.rates_path.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "dataset.rates_path".into(),
                message: "must not be empty".into(),
            });
        }

        for (i, profile) in self.profiles.iter().enumerate() {
            if profile.id.is_empty() {
                errors.push(ConfigError {
                    field: format!("profiles[{i}].id"),
                    message: "must not be empty".into(),
                });
            }
            if profile.path.as_os_str().is_empty() {
                errors.push(ConfigError {
                    field: format!("profiles[{i}].path"),
                    message: "must not be empty".into(),
                });
            }
            if self.profiles[..i].iter().any(|p| p.id == profile.id) {
                errors.push(ConfigError {
                    field: format!("profiles[{i}].id"),
                    message: format!("duplicate id \"{}\"", profile.id),
                });
            }
        }

        errors
    }

    /// Effective worker count: configured value, or the machine's
    /// available parallelism when unset.
    pub fn effective_workers(&self) -> usize {
        if self.batch.workers > 0 {
            self.batch.workers
        } else {
            crate::cost::batch::default_workers()
        }
    }
}
