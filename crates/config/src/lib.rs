//! Configuration loading, validation, and management for FieldState.
//!
//! Loads configuration from `~/.fieldstate/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Every tunable constant of the engine lives here: the values differ
//! between deployments of the field, so none of them are hard-coded.

use fieldstate_core::Resonance;
use fieldstate_core::record::DEFAULT_KEY_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.fieldstate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Storage tiers and record keys
    #[serde(default)]
    pub storage: StorageConfig,

    /// Resonance initialization and growth
    #[serde(default)]
    pub resonance: ResonanceConfig,

    /// Hourly drift replay
    #[serde(default)]
    pub drift: DriftConfig,

    /// Session bookkeeping
    #[serde(default)]
    pub session: SessionConfig,

    /// Scheduled task timing
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix prepended to every record key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Directory holding the tier files (defaults to `~/.fieldstate/`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Time-to-live for durable-tier entries, in days
    #[serde(default = "default_durable_ttl_days")]
    pub durable_ttl_days: u32,

    /// Largest value the durable tier accepts, in bytes
    #[serde(default = "default_durable_max_value_bytes")]
    pub durable_max_value_bytes: usize,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.into()
}
fn default_durable_ttl_days() -> u32 {
    365
}
fn default_durable_max_value_bytes() -> usize {
    4096
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            data_dir: None,
            durable_ttl_days: default_durable_ttl_days(),
            durable_max_value_bytes: default_durable_max_value_bytes(),
        }
    }
}

impl StorageConfig {
    pub fn durable_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.durable_ttl_days as i64)
    }

    /// The data directory, falling back to `~/.fieldstate/`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(FieldConfig::config_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResonanceConfig {
    /// Fixed starting value when drift is disabled, and the fallback for a
    /// missing or malformed stored value
    #[serde(default = "default_base")]
    pub base: u8,

    /// Lower bound of the randomized starting band (drift enabled)
    #[serde(default = "default_initial_min")]
    pub initial_min: u8,

    /// Upper bound (inclusive) of the randomized starting band
    #[serde(default = "default_initial_max")]
    pub initial_max: u8,

    /// Engagement bonus per day since activation
    #[serde(default = "default_bonus_per_day")]
    pub bonus_per_day: f64,
}

fn default_base() -> u8 {
    62
}
fn default_initial_min() -> u8 {
    8
}
fn default_initial_max() -> u8 {
    15
}
fn default_bonus_per_day() -> f64 {
    0.5
}

impl Default for ResonanceConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            initial_min: default_initial_min(),
            initial_max: default_initial_max(),
            bonus_per_day: default_bonus_per_day(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Most hours replayed in a single catch-up pass
    #[serde(default = "default_max_catchup_hours")]
    pub max_catchup_hours: u32,
}

fn default_true() -> bool {
    true
}
fn default_max_catchup_hours() -> u32 {
    48
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_catchup_hours: default_max_catchup_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Absence longer than this counts as a reconnection
    #[serde(default = "default_reconnect_threshold_minutes")]
    pub reconnect_threshold_minutes: u32,
}

fn default_reconnect_threshold_minutes() -> u32 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_threshold_minutes: default_reconnect_threshold_minutes(),
        }
    }
}

impl SessionConfig {
    pub fn reconnect_threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reconnect_threshold_minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Delay between startup and the on-load task
    #[serde(default = "default_init_delay_secs")]
    pub init_delay_secs: u64,

    /// Period of the refresh tick
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_init_delay_secs() -> u64 {
    10
}
fn default_poll_interval_secs() -> u64 {
    10
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            init_delay_secs: default_init_delay_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ScheduleConfig {
    pub fn init_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.init_delay_secs)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

impl FieldConfig {
    /// Load configuration from the default path (~/.fieldstate/config.toml).
    ///
    /// Environment overrides:
    /// - `FIELDSTATE_DATA_DIR` — tier file directory
    /// - `FIELDSTATE_DRIFT` — `0`, `false` or `off` disables drift
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(dir) = std::env::var("FIELDSTATE_DATA_DIR") {
            config.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(flag) = std::env::var("FIELDSTATE_DRIFT") {
            config.drift.enabled = !matches!(flag.trim(), "0" | "false" | "off");
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".fieldstate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = Resonance::MIN..=Resonance::MAX;

        if !bounds.contains(&self.resonance.base) {
            return Err(ConfigError::ValidationError(format!(
                "resonance.base must be between {} and {}",
                Resonance::MIN,
                Resonance::MAX
            )));
        }

        if !bounds.contains(&self.resonance.initial_min)
            || !bounds.contains(&self.resonance.initial_max)
            || self.resonance.initial_min > self.resonance.initial_max
        {
            return Err(ConfigError::ValidationError(format!(
                "resonance initial band must satisfy {} <= initial_min <= initial_max <= {}",
                Resonance::MIN,
                Resonance::MAX
            )));
        }

        if !self.resonance.bonus_per_day.is_finite() || self.resonance.bonus_per_day < 0.0 {
            return Err(ConfigError::ValidationError(
                "resonance.bonus_per_day must be a non-negative number".into(),
            ));
        }

        if self.schedule.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "schedule.poll_interval_secs must be > 0".into(),
            ));
        }

        if self.storage.durable_ttl_days == 0 {
            return Err(ConfigError::ValidationError(
                "storage.durable_ttl_days must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FieldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.key_prefix, "homodigital_");
        assert_eq!(config.resonance.base, 62);
        assert_eq!(config.drift.max_catchup_hours, 48);
        assert_eq!(config.session.reconnect_threshold_minutes, 60);
        assert_eq!(config.schedule.poll_interval_secs, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = FieldConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: FieldConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.durable_ttl_days, config.storage.durable_ttl_days);
        assert_eq!(parsed.resonance.initial_max, config.resonance.initial_max);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[drift]
enabled = false

[resonance]
base = 70
"#;
        let config: FieldConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.drift.enabled);
        assert_eq!(config.drift.max_catchup_hours, 48);
        assert_eq!(config.resonance.base, 70);
        assert_eq!(config.resonance.initial_min, 8);
    }

    #[test]
    fn inverted_band_rejected() {
        let mut config = FieldConfig::default();
        config.resonance.initial_min = 20;
        config.resonance.initial_max = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_base_rejected() {
        let mut config = FieldConfig::default();
        config.resonance.base = 99;
        assert!(config.validate().is_err());
        config.resonance.base = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = FieldConfig::default();
        config.schedule.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_bonus_rejected() {
        let mut config = FieldConfig::default();
        config.resonance.bonus_per_day = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = FieldConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().resonance.base, 62);
    }

    #[test]
    fn load_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\npoll_interval_secs = 0\n").unwrap();
        let err = FieldConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        std::fs::write(&path, "[schedule\n").unwrap();
        let err = FieldConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn durations_derive_from_settings() {
        let config = FieldConfig::default();
        assert_eq!(config.storage.durable_ttl(), chrono::Duration::days(365));
        assert_eq!(config.session.reconnect_threshold(), chrono::Duration::hours(1));
        assert_eq!(config.schedule.init_delay(), std::time::Duration::from_secs(10));
    }

    #[test]
    fn data_dir_defaults_under_config_dir() {
        let config = FieldConfig::default();
        assert_eq!(config.storage.resolved_data_dir(), FieldConfig::config_dir());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = FieldConfig::default_toml();
        assert!(toml_str.contains("homodigital_"));
        assert!(toml_str.contains("max_catchup_hours"));
    }
}
