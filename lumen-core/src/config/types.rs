//! Configuration data structures for Lumen.
//!
//! These structs are populated by deserializing `config.toml`. Missing fields
//! take their values from [`super::defaults`], and unknown fields are rejected
//! via `#[serde(deny_unknown_fields)]`.

use super::defaults;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use lumen_core::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// assert_eq!(config.level, "info");
/// assert_eq!(config.file_path, None);
/// assert_eq!(config.format, "text");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level to record: "trace", "debug", "info", "warn" or "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the state directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            file_path: defaults::default_log_file_path(),
            format: defaults::default_log_format(),
        }
    }
}

/// Settings consumed by the surface composition tree.
///
/// ```
/// use lumen_core::config::CompositorConfig;
///
/// let config: CompositorConfig = toml::from_str("sibling_damage_workaround = false").unwrap();
/// assert!(!config.sibling_damage_workaround);
/// assert_eq!(config.map_damage_margin, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositorConfig {
    /// Damage every sibling of a committing sub-surface. Works around clients that
    /// rely on their siblings being repainted when one of them commits.
    #[serde(default = "defaults::default_sibling_damage_workaround")]
    pub sibling_damage_workaround: bool,
    /// Margin, in logical pixels, added around the box damaged on map and unmap.
    #[serde(default = "defaults::default_map_damage_margin")]
    pub map_damage_margin: f64,
    /// Log refused and emitted damage at debug/trace level.
    #[serde(default = "defaults::default_log_damage")]
    pub log_damage: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            sibling_damage_workaround: defaults::default_sibling_damage_workaround(),
            map_damage_margin: defaults::default_map_damage_margin(),
            log_damage: defaults::default_log_damage(),
        }
    }
}

/// Root configuration structure.
///
/// ```
/// use lumen_core::config::CoreConfig;
///
/// let toml_str = r#"
/// [logging]
/// level = "warn"
///
/// [compositor]
/// map_damage_margin = 2.0
/// "#;
/// let config: CoreConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(config.logging.level, "warn");
/// assert_eq!(config.compositor.map_damage_margin, 2.0);
/// assert!(config.compositor.sibling_damage_workaround);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub compositor: CompositorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_core_config_default_values() {
        let config = CoreConfig::default();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.compositor, CompositorConfig::default());
        assert!(config.compositor.sibling_damage_workaround);
        assert!(!config.compositor.log_damage);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: CoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_logging_file_path_deserializes() {
        let config: LoggingConfig =
            toml::from_str("file_path = \"/var/log/lumen.log\"\nformat = \"json\"").unwrap();
        assert_eq!(config.file_path, Some(PathBuf::from("/var/log/lumen.log")));
        assert_eq!(config.format, "json");
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(toml::from_str::<CoreConfig>("[logging]\nlevl = \"debug\"").is_err());
        assert!(toml::from_str::<CoreConfig>("[compositor]\nmargin = 2.0").is_err());
        assert!(toml::from_str::<CoreConfig>("[render]\nvsync = true").is_err());
    }
}
