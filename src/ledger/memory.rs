// src/ledger/memory.rs
use super::Ledger;
use crate::miner::job::{Block, JobTransaction};
use crate::utils::error::MinerError;
use crate::utils::logging::LEDGER_TARGET;
use crate::utils::unix_time;
use parking_lot::RwLock;

#[derive(Debug)]
struct Chain {
    blocks: Vec<Block>,
    pending: Vec<JobTransaction>,
    difficulty: f64,
    submissions: usize,
    reject_all: bool,
}

/// A chain held in memory
///
/// Accepts a block when it extends the tip (height and previous hash match)
/// and drops the block's transactions from the pending pool.
#[derive(Debug)]
pub struct MemoryLedger {
    chain: RwLock<Chain>,
}

impl MemoryLedger {
    /// Creates a chain holding only a genesis block
    pub fn new(difficulty: f64) -> Self {
        MemoryLedger {
            chain: RwLock::new(Chain {
                blocks: vec![Block::genesis(unix_time())],
                pending: Vec::new(),
                difficulty,
                submissions: 0,
                reject_all: false,
            }),
        }
    }

    pub fn add_pending(&self, tx: JobTransaction) {
        self.chain.write().pending.push(tx);
    }

    pub fn set_difficulty(&self, difficulty: f64) {
        self.chain.write().difficulty = difficulty;
    }

    /// Makes every later submission fail validation
    pub fn set_reject_all(&self, reject: bool) {
        self.chain.write().reject_all = reject;
    }

    /// Every `add_block` call so far, accepted or not
    pub fn submission_count(&self) -> usize {
        self.chain.read().submissions
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.chain.read().blocks.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.chain.read().pending.len()
    }
}

impl Ledger for MemoryLedger {
    fn get_latest_block(&self) -> Result<Block, MinerError> {
        self.chain
            .read()
            .blocks
            .last()
            .cloned()
            .ok_or_else(|| MinerError::LedgerError("Chain is empty".to_string()))
    }

    fn get_height(&self) -> Result<u64, MinerError> {
        self.get_latest_block().map(|b| b.height)
    }

    fn get_difficulty(&self) -> Result<f64, MinerError> {
        Ok(self.chain.read().difficulty)
    }

    fn get_pending_transactions(&self, limit: usize) -> Result<Vec<JobTransaction>, MinerError> {
        Ok(self.chain.read().pending.iter().take(limit).cloned().collect())
    }

    fn add_block(&self, block: &Block) -> Result<bool, MinerError> {
        let mut chain = self.chain.write();
        chain.submissions += 1;
        if chain.reject_all {
            return Ok(false);
        }

        let tip = chain
            .blocks
            .last()
            .ok_or_else(|| MinerError::LedgerError("Chain is empty".to_string()))?;
        if block.height != tip.height + 1 || block.previous_hash != tip.hash() {
            log::debug!(
                target: LEDGER_TARGET,
                "Rejected block {}: does not extend tip {}",
                block.height,
                tip.height
            );
            return Ok(false);
        }

        let included: Vec<&str> = block.transactions.iter().map(|t| t.hash.as_str()).collect();
        chain.pending.retain(|t| !included.contains(&t.hash.as_str()));
        chain.blocks.push(block.clone());
        log::info!(target: LEDGER_TARGET, "Accepted block {}", block.height);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::job::{MiningJob, MiningSolution, SolutionProof};
    use crate::types::AlgorithmType;

    fn next_block(ledger: &MemoryLedger, txs: Vec<JobTransaction>) -> Block {
        let tip = ledger.get_latest_block().unwrap();
        let job = MiningJob::new("1", tip.hash(), tip.height + 1, 1.0, unix_time(), txs);
        let solution = MiningSolution {
            job_id: "1".into(),
            nonce: 1,
            extra_nonce: 0,
            timestamp: 0,
            algorithm: AlgorithmType::Sha256,
            hash: String::new(),
            proof: SolutionProof::None,
        };
        Block::from_solution(&job, &solution, "GXCminer")
    }

    #[test]
    fn test_accepts_block_extending_tip() {
        let ledger = MemoryLedger::new(1.0);
        let tx = JobTransaction::transfer(&"a".repeat(64), 2.0, 0.0, unix_time());
        ledger.add_pending(tx.clone());

        let block = next_block(&ledger, vec![tx]);
        assert!(ledger.add_block(&block).unwrap());
        assert_eq!(ledger.get_height().unwrap(), 1);
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_rejects_stale_block() {
        let ledger = MemoryLedger::new(1.0);
        let first = next_block(&ledger, Vec::new());
        let stale = first.clone();
        assert!(ledger.add_block(&first).unwrap());
        assert!(!ledger.add_block(&stale).unwrap());
        assert_eq!(ledger.submission_count(), 2);
    }

    #[test]
    fn test_pending_respects_limit() {
        let ledger = MemoryLedger::new(1.0);
        for i in 0..5 {
            ledger.add_pending(JobTransaction::transfer(&format!("{:064}", i), 1.0, 0.0, unix_time()));
        }
        assert_eq!(ledger.get_pending_transactions(3).unwrap().len(), 3);
    }
}
