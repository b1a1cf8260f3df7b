//! Parsing and validation of `parcel.toml` configuration files.
//!
//! This crate reads the project configuration and produces a strongly-typed
//! [`ParcelConfig`] carrying the resolver roots, analysis options and
//! packaging settings.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
