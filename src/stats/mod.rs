//! Statistics collection and reporting module
//!
//! This module provides:
//! - The [`MiningStats`] snapshot returned by engines, the manager and the
//!   benchmark
//! - Hardware monitoring (CPU, memory, temperature) through `sysinfo`
//! - [`StatsReporter`], which logs both at a fixed interval
//!

/// Submodule containing the statistics reporter implementation
pub mod reporter;

// Re-export main components
pub use reporter::{HardwareStats, MiningStats, StatsReporter, StatsSource, available_memory};
