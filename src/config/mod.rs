// src/config/mod.rs
//! Configuration management for the GXC miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading and parsing configuration files
//! - Generating configuration templates
//! - Turning sections into component settings
//!
//! The configuration uses TOML format. Every section is optional and falls
//! back to its defaults.

/// Core configuration implementation
///
/// Contains the [`Config`] struct and the `[pool]` section type.
pub mod config;

// Re-export key items for easy access
pub use config::{Config, PoolConfig};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(MinerError)` - If the file couldn't be read, parsed or validated
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `pool` - Whether to include the pool server section
/// * `node` - Whether to include the node section
///
/// # Returns
/// String containing a ready-to-use TOML configuration template
pub fn generate_template(pool: bool, node: bool) -> String {
    Config::generate_template(pool, node)
}
