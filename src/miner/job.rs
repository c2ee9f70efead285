// src/miner/job.rs
//! Job, solution and block model shared by every engine, the manager and
//! the pool server.

use crate::miner::digest::{sha256_hex, sha256d_hex};
use crate::miner::merkle::merkle_root;
use crate::miner::target::bits_for;
use crate::types::AlgorithmType;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing transaction amounts
pub const AMOUNT_EPSILON: f64 = 1e-8;

/// One input of a transaction as seen by the miner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction being spent
    pub tx_hash: String,
    /// Amount carried by the spent output
    pub amount: f64,
}

/// Transaction reference carried by a mining job
///
/// The ledger owns the full transaction model; the miner only needs the
/// fields that feed the block hash and the traceability rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTransaction {
    /// Transaction hash (hex)
    pub hash: String,
    /// Declared hash of the previous transaction in the custody chain
    #[serde(default)]
    pub prev_tx_hash: String,
    /// Declared amount taken from the previous transaction
    #[serde(default)]
    pub referenced_amount: f64,
    /// Creation time, seconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
    /// Opaque traceability proof attached by the wallet
    #[serde(default)]
    pub traceability_proof: String,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    /// Sum of all output amounts
    #[serde(default)]
    pub output_amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub coinbase: bool,
    /// Reward recipient, only set on coinbase transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
}

impl JobTransaction {
    /// Builds the coinbase paying `amount` to `receiver` at `height`
    pub fn coinbase(receiver: &str, amount: f64, height: u64, timestamp: i64) -> Self {
        JobTransaction {
            hash: sha256_hex(&format!("coinbase:{}:{}:{}:{}", height, receiver, amount, timestamp)),
            timestamp,
            output_amount: amount,
            coinbase: true,
            receiver: Some(receiver.to_string()),
            ..Default::default()
        }
    }

    /// Builds a single-input transfer that spends `amount` from `prev_tx_hash`
    ///
    /// The result follows the traceability formula and balances inputs
    /// against outputs plus fee.
    pub fn transfer(prev_tx_hash: &str, amount: f64, fee: f64, timestamp: i64) -> Self {
        let mut tx = JobTransaction {
            prev_tx_hash: prev_tx_hash.to_string(),
            referenced_amount: amount,
            timestamp,
            traceability_proof: sha256_hex(&format!("{}:{}", prev_tx_hash, amount)),
            inputs: vec![TxInput {
                tx_hash: prev_tx_hash.to_string(),
                amount,
            }],
            output_amount: amount - fee,
            fee,
            ..Default::default()
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Hash over the transaction's content fields
    pub fn compute_hash(&self) -> String {
        let inputs: String = self
            .inputs
            .iter()
            .map(|i| format!("{}:{}", i.tx_hash, i.amount))
            .collect();
        sha256_hex(&format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.prev_tx_hash,
            self.referenced_amount,
            self.timestamp,
            inputs,
            self.output_amount,
            self.fee,
            self.coinbase
        ))
    }

    /// The chain-of-custody formula:
    /// `Inputs[0].txHash == PrevTxHash && |Inputs[0].amount - ReferencedAmount| < EPSILON`
    ///
    /// Coinbase transactions are exempt.
    pub fn follows_traceability_formula(&self) -> bool {
        if self.coinbase {
            return true;
        }
        match self.inputs.first() {
            Some(first) => {
                first.tx_hash == self.prev_tx_hash
                    && (first.amount - self.referenced_amount).abs() < AMOUNT_EPSILON
            }
            None => false,
        }
    }

    /// Ledger-level validity used when selecting pending transactions
    ///
    /// The formula, plus well-formed input references and balanced amounts.
    pub fn is_traceability_valid(&self) -> bool {
        if self.coinbase {
            return true;
        }
        let inputs_well_formed = self
            .inputs
            .iter()
            .all(|i| !i.tx_hash.is_empty() && i.tx_hash != "0" && i.amount > 0.0);
        let input_total: f64 = self.inputs.iter().map(|i| i.amount).sum();
        let balanced = (input_total - (self.output_amount + self.fee)).abs() < AMOUNT_EPSILON;

        self.follows_traceability_formula() && inputs_well_formed && balanced
    }
}

/// A unit of mining work
///
/// Immutable once published to workers; a new job replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningJob {
    pub job_id: String,
    /// Hash of the block this job builds on (hex)
    pub previous_hash: String,
    /// Merkle root over the transaction hashes (hex)
    pub merkle_root: String,
    /// Template time, seconds since the Unix epoch
    pub timestamp: i64,
    /// Compact difficulty text carried in the header
    pub bits: String,
    pub difficulty: f64,
    /// Height of the block being mined
    pub block_number: u64,
    /// Coinbase first, then the selected pending transactions
    pub transactions: Vec<JobTransaction>,
    /// Merkle root over per-transaction custody links (hex)
    pub traceability_root: String,
}

impl MiningJob {
    /// Builds a job, deriving the merkle and traceability roots and bits
    pub fn new(
        job_id: impl Into<String>,
        previous_hash: impl Into<String>,
        block_number: u64,
        difficulty: f64,
        timestamp: i64,
        transactions: Vec<JobTransaction>,
    ) -> Self {
        let hashes: Vec<&str> = transactions.iter().map(|t| t.hash.as_str()).collect();
        let links: Vec<String> = transactions
            .iter()
            .map(|t| sha256_hex(&format!("{}{}{}", t.hash, t.prev_tx_hash, t.referenced_amount)))
            .collect();

        MiningJob {
            job_id: job_id.into(),
            previous_hash: previous_hash.into(),
            merkle_root: merkle_root(&hashes),
            timestamp,
            bits: bits_for(difficulty),
            difficulty,
            block_number,
            transactions,
            traceability_root: merkle_root(&links),
        }
    }

    /// Header text without the nonce: `previous_hash ‖ merkle_root ‖ timestamp ‖ bits`
    pub fn header_prefix(&self) -> String {
        format!(
            "{}{}{}{}",
            self.previous_hash, self.merkle_root, self.timestamp, self.bits
        )
    }

    /// Full header text for `nonce`
    pub fn header(&self, nonce: u64) -> String {
        format!("{}{}", self.header_prefix(), nonce)
    }

    /// Transactions other than the coinbase
    pub fn non_coinbase(&self) -> impl Iterator<Item = &JobTransaction> {
        self.transactions.iter().filter(|t| !t.coinbase)
    }
}

/// Algorithm-specific part of a solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SolutionProof {
    /// Engine A carries no extra proof
    None,
    /// Engine B: digest of the dataset items mixed in
    Ethash { mix_digest: String },
    /// Engine C: traceability and cross-validation digests
    GxHash {
        traceability_digest: String,
        cross_validation_digest: String,
        traceability_valid: bool,
    },
}

/// A nonce that met the job's target
///
/// Created once per winning nonce and consumed once by the submission path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningSolution {
    pub job_id: String,
    pub nonce: u64,
    pub extra_nonce: u64,
    /// Time the solution was found
    pub timestamp: i64,
    pub algorithm: AlgorithmType,
    /// The winning digest (hex)
    pub hash: String,
    pub proof: SolutionProof,
}

/// A candidate block handed to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub timestamp: i64,
    pub bits: String,
    pub difficulty: f64,
    pub nonce: u64,
    /// Pool extra-nonce text; empty for solo blocks
    #[serde(default)]
    pub extra_nonce: String,
    pub algorithm: AlgorithmType,
    pub miner_address: String,
    pub transactions: Vec<JobTransaction>,
    /// Proof-of-work digest that met the target (hex)
    pub pow_hash: String,
    pub proof: SolutionProof,
    /// Hash reported by the ledger, when the block came from one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_hash: Option<String>,
}

impl Block {
    /// Builds the block for `job` won by `solution`
    pub fn from_solution(job: &MiningJob, solution: &MiningSolution, miner_address: &str) -> Self {
        Block {
            height: job.block_number,
            previous_hash: job.previous_hash.clone(),
            merkle_root: job.merkle_root.clone(),
            timestamp: job.timestamp,
            bits: job.bits.clone(),
            difficulty: job.difficulty,
            nonce: solution.nonce,
            extra_nonce: String::new(),
            algorithm: solution.algorithm,
            miner_address: miner_address.to_string(),
            transactions: job.transactions.clone(),
            pow_hash: solution.hash.clone(),
            proof: solution.proof.clone(),
            reported_hash: None,
        }
    }

    /// The first block of a chain
    pub fn genesis(timestamp: i64) -> Self {
        Block {
            height: 0,
            previous_hash: "0".repeat(64),
            merkle_root: crate::miner::merkle::EMPTY_MERKLE_ROOT.to_string(),
            timestamp,
            bits: bits_for(1.0),
            difficulty: 1.0,
            nonce: 0,
            extra_nonce: String::new(),
            algorithm: AlgorithmType::Sha256,
            miner_address: String::new(),
            transactions: Vec::new(),
            pow_hash: String::new(),
            proof: SolutionProof::None,
            reported_hash: None,
        }
    }

    /// Identity hash of the block, used as the next block's previous hash
    ///
    /// The ledger's own hash wins when it reported one.
    pub fn hash(&self) -> String {
        self.reported_hash
            .clone()
            .unwrap_or_else(|| self.compute_hash())
    }

    /// Hash over the block's header fields and proof
    pub fn compute_hash(&self) -> String {
        sha256d_hex(&format!(
            "{}{}{}{}{}{}{}{}",
            self.height,
            self.previous_hash,
            self.merkle_root,
            self.timestamp,
            self.bits,
            self.nonce,
            self.extra_nonce,
            self.pow_hash
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREV: &str = "1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn test_transfer_follows_formula_and_is_valid() {
        let tx = JobTransaction::transfer(PREV, 5.0, 0.1, 1_750_000_000);
        assert!(tx.follows_traceability_formula());
        assert!(tx.is_traceability_valid());
        assert_eq!(tx.hash, tx.compute_hash());
    }

    #[test]
    fn test_broken_link_fails_formula() {
        let mut tx = JobTransaction::transfer(PREV, 5.0, 0.1, 1_750_000_000);
        tx.prev_tx_hash = "2".repeat(64);
        assert!(!tx.follows_traceability_formula());
        assert!(!tx.is_traceability_valid());
    }

    #[test]
    fn test_amount_mismatch_beyond_epsilon_fails() {
        let mut tx = JobTransaction::transfer(PREV, 5.0, 0.1, 1_750_000_000);
        tx.referenced_amount = 5.0 + 1e-6;
        assert!(!tx.follows_traceability_formula());
        tx.referenced_amount = 5.0 + 1e-10;
        assert!(tx.follows_traceability_formula());
    }

    #[test]
    fn test_unbalanced_transfer_is_not_ledger_valid() {
        let mut tx = JobTransaction::transfer(PREV, 5.0, 0.1, 1_750_000_000);
        tx.output_amount = 10.0;
        assert!(tx.follows_traceability_formula());
        assert!(!tx.is_traceability_valid());
    }

    #[test]
    fn test_coinbase_is_exempt() {
        let cb = JobTransaction::coinbase("GXCminer", 12.5, 7, 1_750_000_000);
        assert!(cb.coinbase);
        assert!(cb.is_traceability_valid());
    }

    #[test]
    fn test_job_header_layout() {
        let job = MiningJob::new("1", PREV, 3, 1.0, 42, Vec::new());
        assert_eq!(
            job.header(7),
            format!("{}{}42{}7", PREV, crate::miner::merkle::EMPTY_MERKLE_ROOT, job.bits)
        );
    }

    #[test]
    fn test_block_hash_changes_with_nonce() {
        let job = MiningJob::new("1", PREV, 3, 1.0, 42, Vec::new());
        let solution = MiningSolution {
            job_id: "1".into(),
            nonce: 9,
            extra_nonce: 0,
            timestamp: 42,
            algorithm: AlgorithmType::Sha256,
            hash: "00".into(),
            proof: SolutionProof::None,
        };
        let a = Block::from_solution(&job, &solution, "GXCminer");
        let mut b = a.clone();
        b.nonce = 10;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.height, 3);
    }
}
