//! GXC Miner - multi-algorithm proof-of-work mining engine in Rust
//!
//! This crate provides:
//! - Three mining engines (SHA-256d, DAG-based memory-hard, traceability-aware GXHash)
//! - A mining manager that builds templates, adjusts difficulty and submits blocks
//! - A Stratum-style pool server with a WebSocket transport
//! - Performance benchmarking and hardware monitoring

#![forbid(unsafe_code)]

/// Miner core implementation including engines, templates and scheduling
pub mod miner;

/// Ledger collaborator trait and the in-memory ledger
pub mod ledger;

/// Node RPC adapter and pool WebSocket transport
pub mod network;

/// Pool server: miners, jobs and shares
pub mod stratum;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use ledger::{Ledger, MemoryLedger};
pub use miner::{Algorithm, Block, MiningEngine, MiningJob, MiningManager, MiningSolution, Scheduler, Worker};
pub use network::{NodeClient, PoolListener};
pub use stats::{HardwareStats, MiningStats, StatsReporter};
pub use stratum::{StratumServer, StratumShare};
pub use types::AlgorithmType;
pub use utils::{MinerError, init_logging};
