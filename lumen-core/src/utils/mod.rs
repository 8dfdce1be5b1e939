//! Utility helpers shared by the configuration and logging modules.

pub mod fs;
pub mod paths;

pub use fs::ensure_dir_exists;
