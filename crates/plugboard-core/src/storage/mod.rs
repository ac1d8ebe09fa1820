//! # Plugboard Core Storage
//!
//! Configuration data for plugins: the per-plugin option map
//! ([`PluginOptions`]), the application-wide map from plugin name to options
//! ([`AppConfig`]) and loading it from JSON, YAML or TOML files.
pub mod config;
pub mod error;

/// Re-export key types
pub use config::{AppConfig, ConfigFormat, PluginOptions};
pub use error::StorageSystemError;
