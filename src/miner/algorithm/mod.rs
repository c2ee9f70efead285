// src/miner/algorithm/mod.rs
//! Mining algorithm implementations
//!
//! Three proof-of-work schemes share one worker pool:
//! - SHA-256d (Bitcoin-style double hash over the header)
//! - Ethash (memory-hard, epoch-keyed dataset)
//! - GXHash (traceability-aware multi-round hash)
//!
//! Each module provides the hashing side as an [`Algorithm`] and an engine
//! that owns the worker pool for it.

/// SHA-256d engine
pub mod sha256;

/// Ethash engine and its epoch dataset
pub mod ethash;

/// GXHash engine and its traceability cache
pub mod gxhash;

use crate::miner::job::{MiningJob, MiningSolution};
use crate::types::AlgorithmType;

/// Common interface between an algorithm and the worker loop
///
/// Workers call [`prepare`](Algorithm::prepare) once per published job and
/// then [`try_nonce`](Algorithm::try_nonce) for every nonce they attempt.
pub trait Algorithm: Send + Sync + 'static {
    /// Nonce-independent state computed once per job
    type Prepared: Send;

    /// Get the algorithm type
    fn algorithm_type(&self) -> AlgorithmType;

    /// Precompute the per-job state
    ///
    /// # Returns
    /// `None` when the job cannot be mined right now (dataset not ready,
    /// transactions failing validation); the worker idles and retries.
    fn prepare(&self, job: &MiningJob) -> Option<Self::Prepared>;

    /// Hash one nonce
    ///
    /// # Returns
    /// A solution when the digest meets the job's target, `None` on a miss
    fn try_nonce(
        &self,
        job: &MiningJob,
        prepared: &Self::Prepared,
        nonce: u64,
    ) -> Option<MiningSolution>;
}
