//! Configuration management for Lumen.
//!
//! - [`types`]: the deserialized structures ([`CoreConfig`], [`LoggingConfig`], [`CompositorConfig`]).
//! - [`defaults`]: default values used by `serde`.
//! - [`loader`]: [`ConfigLoader`], which locates, merges and validates `config.toml`.

mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CompositorConfig, CoreConfig, LoggingConfig};
