//! Configuration file support for vaxsched.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vaxsched/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub booking: BookingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Store locking configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Argon2id cost parameters for credential hashing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Which open slot serves a booking that names only a date
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotOrder {
    /// Earliest uploaded slot wins
    #[default]
    UploadOrder,
    /// Lexically smallest caregiver username wins
    CaregiverName,
}

/// Booking policy configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BookingConfig {
    #[serde(default)]
    pub slot_order: SlotOrder,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("vaxsched")
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("vaxsched").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let sec = &self.security;
        if sec.iterations == 0 {
            return Err(Error::Config("security.iterations must be at least 1".into()));
        }
        if sec.parallelism == 0 {
            return Err(Error::Config("security.parallelism must be at least 1".into()));
        }
        if sec.memory_kib < 8 * sec.parallelism {
            return Err(Error::Config(format!(
                "security.memory_kib must be at least {} for parallelism {}",
                8 * sec.parallelism,
                sec.parallelism
            )));
        }
        if self.store.lock_timeout_ms == 0 {
            return Err(Error::Config("store.lock_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.lock_timeout_ms, 5_000);
        assert_eq!(config.security.iterations, 2);
        assert_eq!(config.booking.slot_order, SlotOrder::UploadOrder);
        assert!(config.data.data_dir.ends_with("vaxsched"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.booking.slot_order = SlotOrder::CaregiverName;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.booking.slot_order, SlotOrder::CaregiverName);
        assert_eq!(loaded.security, config.security);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[security]
memory_kib = 64
iterations = 1

[booking]
slot_order = "caregiver_name"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.security.memory_kib, 64);
        assert_eq!(config.security.parallelism, 1); // default
        assert_eq!(config.booking.slot_order, SlotOrder::CaregiverName);
        assert_eq!(config.store.lock_timeout_ms, 5_000); // default
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = Config::default();
        config.security.iterations = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
