//! Configuration module for hls-stitch.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, OptionsConfig, SourcesConfig};
pub use validation::validate_config;
