//! XDG base directory and application path resolution, via `directories-next`.
//!
//! Application directories are derived from the `org` / `Lumen` / `Lumen`
//! project triple, e.g. `~/.config/Lumen/Lumen` style paths depending on platform.

use crate::error::{ConfigError, CoreError};
use directories_next::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "Lumen";
const APPLICATION: &str = "Lumen";

/// Environment variable overriding the system-wide configuration file.
pub const SYSTEM_CONFIG_PATH_ENV: &str = "LUMEN_SYSTEM_CONFIG_PATH";

const DEFAULT_SYSTEM_CONFIG_PATH: &str = "/etc/lumen/config.toml";

/// Returns the application-specific configuration directory.
///
/// # Errors
/// [`ConfigError::DirectoryUnavailable`] if no home directory can be determined.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "App Config".to_string(),
            })
        })
}

/// Returns `$XDG_STATE_HOME` (or `~/.local/state`) on Linux and the local data
/// directory elsewhere.
pub fn get_state_base_dir() -> Result<PathBuf, CoreError> {
    BaseDirs::new()
        .map(|dirs| {
            #[cfg(target_os = "linux")]
            {
                match std::env::var("XDG_STATE_HOME") {
                    Ok(state_home) if !state_home.is_empty() => PathBuf::from(state_home),
                    _ => dirs.home_dir().join(".local/state"),
                }
            }
            #[cfg(not(target_os = "linux"))]
            {
                dirs.data_local_dir().to_path_buf()
            }
        })
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "State Base".to_string(),
            })
        })
}

/// Returns the application-specific state directory, used for log files.
pub fn get_app_state_dir() -> Result<PathBuf, CoreError> {
    get_state_base_dir().map(|base| base.join(ORGANIZATION).join(APPLICATION))
}

/// Returns the system-wide configuration file path, honouring
/// [`SYSTEM_CONFIG_PATH_ENV`] when it is set and non-empty.
pub fn get_system_config_path_with_override() -> Result<PathBuf, CoreError> {
    match std::env::var(SYSTEM_CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(PathBuf::from(DEFAULT_SYSTEM_CONFIG_PATH)),
    }
}
