//! Configuration loading.
//!
//! [`ConfigLoader::load`] reads the system-wide `config.toml` (overridable with
//! `LUMEN_SYSTEM_CONFIG_PATH`) and the user's `config.toml` from the application
//! config directory, merges them table by table with the user file taking
//! precedence, deserializes the result into [`CoreConfig`] and validates it.
//! Missing files are not an error; an absent configuration yields the defaults.
//!
//! ```rust,ignore
//! use lumen_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::load()?;
//! lumen_core::logging::init_logging(&config.logging, false)?;
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use toml::Value;

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::utils::fs::ensure_dir_exists;
use crate::utils::paths::{get_app_config_dir, get_app_state_dir, get_system_config_path_with_override};

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads, merges and validates the system and user configuration files.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DirectoryUnavailable`] if the config directory cannot be determined.
    /// - [`ConfigError::ReadError`] if a file exists but cannot be read.
    /// - [`ConfigError::ParseError`] for malformed TOML or unknown fields.
    /// - [`ConfigError::ValidationError`] for out-of-range values.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let system_path = get_system_config_path_with_override()?;
        let user_path = get_app_config_dir()?.join("config.toml");
        Self::load_layers(Some(&system_path), Some(&user_path))
    }

    /// Loads a single configuration file. Unlike [`ConfigLoader::load`], a missing
    /// file is reported as [`ConfigError::NotFound`].
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        match Self::read_toml(path)? {
            Some(value) => Self::finish(Some(value)),
            None if path.exists() => Self::finish(None),
            None => Err(ConfigError::NotFound {
                locations: vec![path.to_path_buf()],
            }
            .into()),
        }
    }

    /// Merges the given layers, later layers overriding earlier ones.
    pub fn load_layers(system: Option<&Path>, user: Option<&Path>) -> Result<CoreConfig, CoreError> {
        let system_value = match system {
            Some(path) => Self::read_toml(path)?,
            None => None,
        };
        let user_value = match user {
            Some(path) => Self::read_toml(path)?,
            None => None,
        };
        Self::finish(Self::merge_toml_values(system_value, user_value))
    }

    fn finish(merged: Option<Value>) -> Result<CoreConfig, CoreError> {
        let mut config = match merged {
            Some(value) => {
                let parsed: CoreConfig = value.try_into().map_err(ConfigError::ParseError)?;
                parsed
            }
            None => CoreConfig::default(),
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// `Ok(None)` for a missing or blank file.
    fn read_toml(path: &Path) -> Result<Option<Value>, CoreError> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content.parse::<Value>().map_err(ConfigError::ParseError)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
            .into()),
        }
    }

    fn merge_toml_values(base: Option<Value>, override_val: Option<Value>) -> Option<Value> {
        match (base, override_val) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(Value::Table(mut base_table)), Some(Value::Table(override_table))) => {
                Self::merge_toml_tables(&mut base_table, &override_table);
                Some(Value::Table(base_table))
            }
            (_, Some(o)) => Some(o),
        }
    }

    fn merge_toml_tables(
        base_table: &mut toml::map::Map<String, Value>,
        override_table: &toml::map::Map<String, Value>,
    ) {
        for (key, override_item) in override_table {
            match base_table.get_mut(key) {
                Some(base_item) => {
                    if let (Value::Table(bt), Value::Table(ot)) = (&mut *base_item, override_item) {
                        Self::merge_toml_tables(bt, ot);
                    } else {
                        *base_item = override_item.clone();
                    }
                }
                None => {
                    base_table.insert(key.clone(), override_item.clone());
                }
            }
        }
    }

    /// Normalizes level and format to lowercase, resolves a relative log file
    /// against the state directory (creating its parent), and range-checks the
    /// compositor settings.
    fn validate_config(config: &mut CoreConfig) -> Result<(), CoreError> {
        let level = config.logging.level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                ))
                .into());
            }
        }

        let format = config.logging.format.to_lowercase();
        match format.as_str() {
            "text" | "json" => config.logging.format = format,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                ))
                .into());
            }
        }

        if let Some(path) = config.logging.file_path.clone() {
            let absolute = if path.is_absolute() {
                path
            } else {
                get_app_state_dir()?.join(path)
            };
            if let Some(parent) = absolute.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    ensure_dir_exists(parent)?;
                }
            }
            config.logging.file_path = Some(absolute);
        }

        let margin = config.compositor.map_damage_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid map_damage_margin: {}. Must be a finite, non-negative number.",
                margin
            ))
            .into());
        }

        Ok(())
    }
}
