//! # Lumen Core Library (`lumen-core`)
//!
//! Foundation crate of the Lumen compositor workspace:
//!
//! - **Error Handling**: [`CoreError`] and the more specific [`ConfigError`] and [`LoggingError`].
//! - **Configuration**: TOML configuration ([`CoreConfig`]) located, merged and validated by [`ConfigLoader`].
//! - **Logging**: `tracing` subscriber setup for console and file output.
//! - **Geometry**: generic [`Point`], [`Size`] and [`Rect`].
//!
//! ```rust,ignore
//! use lumen_core::config::ConfigLoader;
//! use lumen_core::logging::init_logging;
//!
//! fn main() -> Result<(), lumen_core::CoreError> {
//!     let config = ConfigLoader::load()?;
//!     init_logging(&config.logging, false)?;
//!     tracing::info!("Lumen core initialized");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

pub use config::{CompositorConfig, ConfigLoader, CoreConfig, LoggingConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use types::{Point, PointF, Rect, RectF, Size, SizeF};
