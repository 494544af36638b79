#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runtime settings.
//!
//! Values start from built-in defaults, are overlaid by an optional TOML
//! file named by `PATTERN_DISCOVERY_CONFIG`, and finally by individual
//! environment variables (`DBSCAN_EPSILON_KM`, `MAX_SUPPLY`, `PORT`, ...).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an optional TOML settings file.
pub const CONFIG_PATH_ENV: &str = "PATTERN_DISCOVERY_CONFIG";

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`].
    #[error("Failed to parse settings TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value could not be parsed or is out of range.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// Every tunable constant in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Clustering neighbour radius in km.
    pub dbscan_epsilon_km: f64,
    /// Neighbours (including the point itself) needed to seed a cluster.
    pub dbscan_min_points: usize,
    /// Minutes at a location required to vote.
    pub min_vote_minutes: f64,
    /// Upper bound on a vote's weight.
    pub max_vote_weight: f64,
    /// Radius around a location that counts toward its voting time, in km.
    pub vote_radius_km: f64,
    /// Hard cap on minted tokens.
    pub max_supply: f64,
    /// Tokens minted between reward halvings.
    pub halving_interval: f64,
    /// Reward multiplier before the first halving.
    pub genesis_reward: f64,
    /// Lowest reward multiplier a halving can produce.
    pub min_reward_floor: f64,
    /// Server bind address.
    pub bind_addr: String,
    /// Server port.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dbscan_epsilon_km: 0.5,
            dbscan_min_points: 3,
            min_vote_minutes: 3.0,
            max_vote_weight: 15.0,
            vote_radius_km: 0.15,
            max_supply: 21_000_000.0,
            halving_interval: 2_100_000.0,
            genesis_reward: 1.0,
            min_reward_floor: 0.01,
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn override_from<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(key) {
        *target = parse(key, &value)?;
        log::debug!("{key} overridden from environment");
    }
    Ok(())
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the configured file cannot be read
    /// * [`ConfigError::Toml`] if the file is malformed
    /// * [`ConfigError::InvalidValue`] if any value fails to parse or validate
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads settings using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_overrides(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads a TOML settings file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the file cannot be read
    /// * [`ConfigError::Toml`] if the file is malformed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading settings from {}", path.display());
        Self::from_toml(&contents)
    }

    /// Parses settings from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Toml`] if the text is malformed
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        override_from(&lookup, "DBSCAN_EPSILON_KM", &mut self.dbscan_epsilon_km)?;
        override_from(&lookup, "DBSCAN_MIN_POINTS", &mut self.dbscan_min_points)?;
        override_from(&lookup, "MIN_VOTE_MINUTES", &mut self.min_vote_minutes)?;
        override_from(&lookup, "MAX_VOTE_WEIGHT", &mut self.max_vote_weight)?;
        override_from(&lookup, "VOTE_RADIUS_KM", &mut self.vote_radius_km)?;
        override_from(&lookup, "MAX_SUPPLY", &mut self.max_supply)?;
        override_from(&lookup, "HALVING_INTERVAL", &mut self.halving_interval)?;
        override_from(&lookup, "GENESIS_REWARD", &mut self.genesis_reward)?;
        override_from(&lookup, "MIN_REWARD_FLOOR", &mut self.min_reward_floor)?;
        override_from(&lookup, "PORT", &mut self.port)?;

        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("DBSCAN_EPSILON_KM", self.dbscan_epsilon_km),
            ("MAX_VOTE_WEIGHT", self.max_vote_weight),
            ("VOTE_RADIUS_KM", self.vote_radius_km),
            ("MAX_SUPPLY", self.max_supply),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(key, value));
            }
        }

        let non_negative = [
            ("MIN_VOTE_MINUTES", self.min_vote_minutes),
            ("HALVING_INTERVAL", self.halving_interval),
            ("GENESIS_REWARD", self.genesis_reward),
            ("MIN_REWARD_FLOOR", self.min_reward_floor),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(key, value));
            }
        }

        if self.dbscan_min_points == 0 {
            return Err(invalid("DBSCAN_MIN_POINTS", self.dbscan_min_points));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_constants() {
        let settings = Settings::load_with(env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!((settings.dbscan_epsilon_km - 0.5).abs() < f64::EPSILON);
        assert_eq!(settings.dbscan_min_points, 3);
        assert!((settings.max_vote_weight - 15.0).abs() < f64::EPSILON);
        assert!((settings.max_supply - 21_000_000.0).abs() < f64::EPSILON);
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load_with(env(&[
            ("DBSCAN_EPSILON_KM", "0.25"),
            ("DBSCAN_MIN_POINTS", " 5 "),
            ("MAX_SUPPLY", "1000"),
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert!((settings.dbscan_epsilon_km - 0.25).abs() < f64::EPSILON);
        assert_eq!(settings.dbscan_min_points, 5);
        assert!((settings.max_supply - 1000.0).abs() < f64::EPSILON);
        assert_eq!(settings.bind_addr, "0.0.0.0");
        assert_eq!(settings.port, 9000);
    }

    #[test]
    fn unparseable_value_names_the_key() {
        let err = Settings::load_with(env(&[("MAX_VOTE_WEIGHT", "lots")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "MAX_VOTE_WEIGHT");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(Settings::load_with(env(&[("DBSCAN_EPSILON_KM", "0")])).is_err());
        assert!(Settings::load_with(env(&[("DBSCAN_MIN_POINTS", "0")])).is_err());
        assert!(Settings::load_with(env(&[("MIN_REWARD_FLOOR", "-1")])).is_err());
    }

    #[test]
    fn toml_keeps_defaults_for_missing_keys() {
        let settings = Settings::from_toml("max_supply = 500.0\nport = 3000\n").unwrap();
        assert!((settings.max_supply - 500.0).abs() < f64::EPSILON);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.dbscan_min_points, 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load_with(env(&[(
            CONFIG_PATH_ENV,
            "/nonexistent/pattern-discovery.toml",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
