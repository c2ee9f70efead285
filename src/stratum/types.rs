// src/stratum/types.rs
//! Pool-side records: connected miners, cached jobs, submitted shares.

use crate::miner::job::{JobTransaction, MiningJob};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Instant;

/// A remote miner known to the pool
#[derive(Debug, Clone)]
pub struct StratumMiner {
    pub miner_id: String,
    /// Peer address as reported by the transport
    pub address: String,
    pub authorized: bool,
    pub username: String,
    /// Pool difficulty assigned to this miner
    pub difficulty: f64,
    pub shares_accepted: u64,
    pub shares_rejected: u64,
    /// Connect time, seconds since the Unix epoch
    pub connected_since: i64,
    pub connected_at: Instant,
    pub last_activity: Instant,
    /// Estimated hashes per second from submitted shares
    pub hash_rate: f64,
}

impl StratumMiner {
    pub fn new(miner_id: &str, address: &str, difficulty: f64, now: i64) -> Self {
        let instant = Instant::now();
        StratumMiner {
            miner_id: miner_id.to_string(),
            address: address.to_string(),
            authorized: false,
            username: String::new(),
            difficulty,
            shares_accepted: 0,
            shares_rejected: 0,
            connected_since: now,
            connected_at: instant,
            last_activity: instant,
            hash_rate: 0.0,
        }
    }

    pub fn total_shares(&self) -> u64 {
        self.shares_accepted + self.shares_rejected
    }

    /// `(accepted + rejected) × difficulty / elapsed`
    pub fn estimate_hash_rate(&self) -> f64 {
        let elapsed = self.connected_at.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.total_shares() as f64 * self.difficulty / elapsed
    }
}

/// A job as handed out to pool miners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumJob {
    /// Block template; its difficulty is the network difficulty
    pub job: MiningJob,
    /// Per-job extra-nonce prefix, 8 hex characters
    pub extra_nonce1: String,
    /// Bytes of extra-nonce the miner chooses
    pub extra_nonce2_size: usize,
    /// Merkle path of the coinbase
    pub merkle_branches: Vec<String>,
    pub coinbase: JobTransaction,
    /// Miners must drop earlier jobs
    pub clean_jobs: bool,
    pub pool_difficulty: f64,
}

impl StratumJob {
    pub fn job_id(&self) -> &str {
        &self.job.job_id
    }

    pub fn network_difficulty(&self) -> f64 {
        self.job.difficulty
    }

    /// `[job_id, prev_hash, merkle_root, timestamp, difficulty_hex, clean_jobs,
    /// extra_nonce1, bits, extra_nonce2_size]`
    ///
    /// The trailing fields are everything else a remote miner needs to
    /// rebuild the share preimage `prev_hash ‖ merkle_root ‖ timestamp ‖
    /// bits ‖ nonce ‖ extra_nonce1 ‖ extra_nonce2`.
    pub fn notify_params(&self) -> Value {
        json!([
            self.job.job_id,
            self.job.previous_hash,
            self.job.merkle_root,
            self.job.timestamp,
            difficulty_hex(self.pool_difficulty),
            self.clean_jobs,
            self.extra_nonce1,
            self.job.bits,
            self.extra_nonce2_size
        ])
    }
}

/// Hex text of a difficulty, rounded to an integer
pub fn difficulty_hex(difficulty: f64) -> String {
    let value = if difficulty.is_finite() && difficulty > 0.0 {
        difficulty.round().min(u64::MAX as f64) as u64
    } else {
        0
    };
    format!("{:x}", value)
}

/// A share as submitted by a miner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumShare {
    pub job_id: String,
    /// Nonce as hex text
    pub nonce: String,
    pub extra_nonce2: String,
    pub miner_id: String,
}

/// Verdict on a share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareResponse {
    pub accepted: bool,
    /// Why the share was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The share also met the network difficulty
    #[serde(default)]
    pub block_candidate: bool,
}

impl ShareResponse {
    pub fn accepted(block_candidate: bool) -> Self {
        ShareResponse {
            accepted: true,
            reason: None,
            block_candidate,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        ShareResponse {
            accepted: false,
            reason: Some(reason.into()),
            block_candidate: false,
        }
    }
}

/// Server-initiated message for one miner
#[derive(Debug, Clone, PartialEq)]
pub enum PoolMessage {
    Notify(Value),
    SetDifficulty(f64),
}

impl PoolMessage {
    /// JSON-RPC notification text
    pub fn to_json(&self) -> Value {
        match self {
            PoolMessage::Notify(params) => json!({
                "id": null,
                "method": "mining.notify",
                "params": params
            }),
            PoolMessage::SetDifficulty(difficulty) => json!({
                "id": null,
                "method": "mining.set_difficulty",
                "params": [difficulty]
            }),
        }
    }
}

/// Pool-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStats {
    pub connected_miners: usize,
    pub authorized_miners: usize,
    pub hash_rate: f64,
    pub shares_accepted: u64,
    pub shares_rejected: u64,
    pub blocks_found: u64,
    pub cached_jobs: usize,
    pub uptime_secs: u64,
}
