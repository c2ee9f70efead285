// src/ledger/mod.rs
//! Ledger collaborator
//!
//! The mining manager and the pool server only read the chain tip, its
//! height and difficulty, and the pending transaction pool, and hand
//! candidate blocks back. Chain validation belongs to the ledger.

/// In-memory ledger for tests, benchmarks and local development
pub mod memory;

use crate::miner::job::{Block, JobTransaction};
use crate::utils::error::MinerError;

pub use memory::MemoryLedger;

/// What the miner consumes from, and produces for, the chain
pub trait Ledger: Send + Sync {
    /// The current chain tip
    fn get_latest_block(&self) -> Result<Block, MinerError>;

    /// Height of the current chain tip
    fn get_height(&self) -> Result<u64, MinerError>;

    /// Network difficulty a block must meet
    fn get_difficulty(&self) -> Result<f64, MinerError>;

    /// Up to `limit` transactions waiting to be mined
    fn get_pending_transactions(&self, limit: usize) -> Result<Vec<JobTransaction>, MinerError>;

    /// Offers a candidate block
    ///
    /// # Returns
    /// `Ok(true)` when accepted, `Ok(false)` when rejected
    fn add_block(&self, block: &Block) -> Result<bool, MinerError>;
}

/// Pending transactions that may go into a block
///
/// Coinbase entries and transactions failing the traceability rules are
/// skipped.
pub fn mineable_transactions(
    ledger: &dyn Ledger,
    limit: usize,
) -> Result<Vec<JobTransaction>, MinerError> {
    Ok(ledger
        .get_pending_transactions(limit)?
        .into_iter()
        .filter(|tx| !tx.coinbase && tx.is_traceability_valid())
        .collect())
}
