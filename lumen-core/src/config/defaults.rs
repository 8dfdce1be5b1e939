//! Default configuration values, referenced by `#[serde(default = "...")]`.

use std::path::PathBuf;

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_sibling_damage_workaround() -> bool {
    true
}

/// Covers anti-aliased edges around a surface that just appeared or vanished.
pub(super) fn default_map_damage_margin() -> f64 {
    4.0
}

pub(super) fn default_log_damage() -> bool {
    false
}
