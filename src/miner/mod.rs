// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the mining process:
//! - Hash engines (SHA-256d, DAG-based memory-hard, GXHash)
//! - Job publication and worker thread management
//! - Block templates, difficulty adjustment and rewards

/// Mining algorithm implementations
///
/// One engine per [`crate::types::AlgorithmType`], each driving a worker
/// pool through the shared [`Algorithm`] trait.
pub mod algorithm;

/// Hash primitives shared by the engines and the pool
pub mod digest;

/// Moving-window difficulty adjustment
pub mod difficulty;

/// Closed set of engines selected by the manager
pub mod engine;

/// Jobs, transactions, solutions and blocks
pub mod job;

/// Mining manager
///
/// Builds templates from the ledger, runs the active engine and submits
/// the blocks it finds.
pub mod manager;

/// Merkle roots and branches over transaction hashes
pub mod merkle;

/// Block reward schedule
pub mod reward;

/// Job publication and worker lifecycle
///
/// Publishes jobs by replacement and starts and joins the worker threads of
/// one engine.
pub mod scheduler;

/// Difficulty to leading-zero target mapping
pub mod target;

/// Worker thread implementation
///
/// Contains the worker thread logic that performs actual hash computations.
/// Workers pick up published jobs and send solutions they find.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::Algorithm;
pub use self::engine::{EngineSettings, MiningEngine};
pub use self::job::{Block, JobTransaction, MiningJob, MiningSolution, SolutionProof};
pub use self::manager::{ManagerConfig, MiningManager, SubmissionOutcome};
pub use self::scheduler::Scheduler;
pub use self::worker::Worker;
