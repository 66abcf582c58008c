//! Game rules and runtime settings

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::farm::{FarmRules, MAX_GRID_CELLS};

/// Main configuration for a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub rules: FarmRules,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

fn default_name() -> String {
    "digifarm".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            rules: FarmRules::default(),
            storage: StorageConfig::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_storage_key() -> String {
    "digifarm_state".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/digimon.json")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from a YAML file and validate it.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.grid_width == 0 || self.rules.grid_height == 0 {
            return Err(ConfigError::Validation(format!(
                "grid must have at least one cell, got {}x{}",
                self.rules.grid_width, self.rules.grid_height
            )));
        }
        match self
            .rules
            .grid_width
            .checked_mul(self.rules.grid_height)
        {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "grid {}x{} exceeds the {MAX_GRID_CELLS}-tile limit",
                    self.rules.grid_width, self.rules.grid_height
                )));
            }
        }
        if self.rules.max_stage == 0 {
            return Err(ConfigError::Validation(
                "max_stage must be greater than zero".into(),
            ));
        }
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage key must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_prototype_rules() {
        let config = Config::default();

        assert_eq!(config.name, "digifarm");
        assert_eq!(config.rules.grid_width, 12);
        assert_eq!(config.rules.grid_height, 10);
        assert_eq!(config.rules.place_cost, 10);
        assert_eq!(config.rules.feed_cost, 2);
        assert_eq!(config.rules.harvest_reward, 15);
        assert_eq!(config.rules.starting_bits, 30);
        assert_eq!(config.rules.max_stage, 3);
        assert_eq!(config.storage.key, "digifarm_state");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "rules:\n  place_cost: 4\nweb:\n  port: 9000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.name, "digifarm");
        assert_eq!(config.rules.place_cost, 4);
        assert_eq!(config.rules.feed_cost, 2);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
    }

    #[test]
    fn config_round_trips_through_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.yaml");
        let mut config = Config::default();
        config.rules.harvest_reward = 40;
        config.to_yaml(&path).unwrap();

        let loaded = Config::from_yaml(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn bundled_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/digifarm.yaml");
        let config = Config::from_yaml(path).expect("bundled config parses");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let mut config = Config::default();
        config.rules.grid_width = usize::MAX / 2;
        config.rules.grid_height = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));

        config.rules.grid_width = 101;
        config.rules.grid_height = 100;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));

        config.rules.grid_width = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let mut config = Config::default();
        config.rules.grid_height = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
