//! TOML-based application configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sim::types::SimConfig;

/// Top-level configuration parsed from TOML.
///
/// Every section is optional and defaults to the values below. Load with
/// [`AppConfig::from_toml_file`] and check with [`AppConfig::validate`]
/// before use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Tick timing and display limits.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Where the snapshot is stored.
    #[serde(default)]
    pub storage: StorageConfig,
    /// REST server settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Tick timing and display limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Milliseconds between ticks (must be > 0).
    pub tick_interval_ms: u64,
    /// Hours a device may stay On before an alert (must be > 0).
    pub alert_threshold_hours: u32,
    /// Number of log entries shown to readers.
    pub log_display_limit: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            alert_threshold_hours: 24,
            log_display_limit: 40,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON snapshot file.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("smarthome_state.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// TCP port the server listens on.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// A configuration problem tied to one field.
#[derive(Debug)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on syntax errors or unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Returns every constraint violation; empty means valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.tick_interval_ms == 0 {
            errors.push(ConfigError {
                field: "simulation.tick_interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if s.alert_threshold_hours == 0 {
            errors.push(ConfigError {
                field: "simulation.alert_threshold_hours".into(),
                message: "must be > 0".into(),
            });
        }
        if s.log_display_limit == 0 {
            errors.push(ConfigError {
                field: "simulation.log_display_limit".into(),
                message: "must be > 0".into(),
            });
        }
        if self.storage.path.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "storage.path".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }

    /// Runtime parameters for the engine.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has not passed [`AppConfig::validate`].
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig::new(s.tick_interval_ms, s.alert_threshold_hours, s.log_display_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
        assert_eq!(cfg.sim_config(), SimConfig::default());
        assert_eq!(cfg.api.port, 3000);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").expect("empty config");
        assert_eq!(cfg.simulation.tick_interval_ms, 1000);
        assert_eq!(cfg.storage.path, PathBuf::from("smarthome_state.json"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
tick_interval_ms = 250
alert_threshold_hours = 6
log_display_limit = 10

[storage]
path = "/tmp/home.json"

[api]
port = 8080
"#;
        let cfg = AppConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.tick_interval_ms), Some(250));
        assert_eq!(cfg.as_ref().map(|c| c.api.port), Some(8080));
        assert_eq!(
            cfg.as_ref().map(|c| c.sim_config().alert_threshold_hours()),
            Some(6)
        );
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = AppConfig::from_toml_str("[simulation]\ntick_interval_ms = 50\n").expect("parse");
        assert_eq!(cfg.simulation.alert_threshold_hours, 24);
        assert_eq!(cfg.simulation.log_display_limit, 40);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
tick_interval_ms = 1000
bogus_field = true
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
        assert!(AppConfig::from_toml_str("[mqtt]\nhost = \"x\"\n").is_err());
    }

    #[test]
    fn validation_catches_zero_values() {
        let mut cfg = AppConfig::default();
        cfg.simulation.tick_interval_ms = 0;
        cfg.simulation.alert_threshold_hours = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.tick_interval_ms"));
        assert!(errors.iter().any(|e| e.field == "simulation.alert_threshold_hours"));
    }

    #[test]
    fn validation_catches_empty_path() {
        let mut cfg = AppConfig::default();
        cfg.storage.path = PathBuf::new();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.path"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::from_toml_file(Path::new("/nonexistent/smarthome.toml"));
        assert!(err.is_err_and(|e| e.message.contains("cannot read")));
    }
}
