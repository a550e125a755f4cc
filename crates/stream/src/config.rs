use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors from loading or validating import configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Import configuration: periodic import cadence, per-slice budget, visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Seconds between imports while scanning. Zero or less disables periodic import.
    pub import_period_seconds: f32,
    /// Soft wall-clock budget per slice of import work, in milliseconds.
    pub max_frame_time_milliseconds: f32,
    /// Whether committed surfaces are drawn.
    pub sector_visibility_enabled: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_period_seconds: 1.0,
            max_frame_time_milliseconds: 5.0,
            sector_visibility_enabled: true,
        }
    }
}

impl ImportConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file: `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.import_period_seconds.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "import_period_seconds must be finite, got {}",
                self.import_period_seconds
            )));
        }
        if !self.max_frame_time_milliseconds.is_finite() || self.max_frame_time_milliseconds < 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "max_frame_time_milliseconds must be a non-negative number, got {}",
                self.max_frame_time_milliseconds
            )));
        }
        Ok(())
    }

    /// Period between imports, or `None` when periodic import is disabled.
    pub fn import_period(&self) -> Option<Duration> {
        (self.import_period_seconds > 0.0)
            .then(|| nanos_to_duration(f64::from(self.import_period_seconds) * 1e9))
    }

    pub fn max_frame_time(&self) -> Duration {
        nanos_to_duration(f64::from(self.max_frame_time_milliseconds.max(0.0)) * 1e6)
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    Duration::from_nanos(nanos.round() as u64)
}
