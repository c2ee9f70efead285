// src/utils/mod.rs
//! Utilities module for common functionality
//!
//! Error handling, logging setup and the small time helpers shared by the
//! engines, the manager and the pool server.

/// Error types and handling utilities
///
/// Contains the [`MinerError`] enum which defines all failure conditions
/// that may leave a component, along with conversion implementations.
pub mod error;

/// Logging configuration and utilities
pub mod logging;

// Re-export for easier access
pub use error::MinerError;
pub use logging::init_logging;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in whole seconds since the Unix epoch
pub fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
