//! Settings loading and validation.
//!
//! Settings are optional: with no file every value falls back to its default.
//! A file given with `--config` is parsed as TOML and validated before use.

pub mod error;
pub mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_settings, validate_settings};
