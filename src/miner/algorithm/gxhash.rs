// src/miner/algorithm/gxhash.rs
//! GXHash engine
//!
//! Multi-round proof of work that binds the block's chain-of-custody data
//! into the digest. A candidate is only accepted when every non-coinbase
//! transaction satisfies
//!
//! ```text
//! Ti.Inputs[0].txHash == Ti.PrevTxHash
//!     && |Ti.Inputs[0].amount - Ti.ReferencedAmount| < EPSILON
//! ```
//!
//! carries a 64-character previous hash, and was created after the
//! activation time. Per-transaction verdicts are memoized in a bounded
//! [`TraceabilityCache`].

use super::Algorithm;
use crate::miner::digest::{Hash32, keccak256, sha256};
use crate::miner::job::{JobTransaction, MiningJob, MiningSolution, SolutionProof};
use crate::miner::scheduler::Scheduler;
use crate::miner::target::Target;
use crate::stats::MiningStats;
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::GXHASH_TARGET;
use crate::utils::unix_time;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Keccak rounds applied after the traceability digest
pub const ROUNDS: usize = 16;

/// A transaction hash is folded into the state every this many rounds
pub const FOLD_INTERVAL: usize = 4;

/// Transactions created at or before this time are not mineable
pub const DEFAULT_ACTIVATION_TIME: i64 = 1_704_067_200;

/// GXHash engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GxHashConfig {
    /// Lowers the target by one bit for traceability-valid blocks
    pub traceability_optimized: bool,
    pub activation_time: i64,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
}

impl Default for GxHashConfig {
    fn default() -> Self {
        GxHashConfig {
            traceability_optimized: true,
            activation_time: DEFAULT_ACTIVATION_TIME,
            cache_capacity: 50_000,
            cache_ttl_secs: 3600,
        }
    }
}

/// Full rule check for one transaction
pub fn transaction_passes(tx: &JobTransaction, activation_time: i64) -> bool {
    if tx.coinbase {
        return true;
    }
    tx.follows_traceability_formula()
        && tx.prev_tx_hash.len() == 64
        && tx.prev_tx_hash.chars().all(|c| c.is_ascii_hexdigit())
        && tx.timestamp > activation_time
}

/// Memoized per-transaction verdicts
///
/// `order` records insertions oldest first. A record whose timestamp no
/// longer matches its entry is stale (the entry was revalidated) and is
/// skipped when popped.
#[derive(Debug)]
pub struct TraceabilityCache {
    entries: HashMap<String, (bool, Instant)>,
    order: VecDeque<(Instant, String)>,
    capacity: usize,
    ttl: Duration,
    validations: u64,
}

impl TraceabilityCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        TraceabilityCache {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            ttl,
            validations: 0,
        }
    }

    /// Verdict for `tx`, computing and caching it on a miss
    pub fn check(&mut self, tx: &JobTransaction, activation_time: i64) -> bool {
        let now = Instant::now();
        if let Some((valid, at)) = self.entries.get(&tx.hash) {
            if now.duration_since(*at) <= self.ttl {
                return *valid;
            }
        }

        let valid = transaction_passes(tx, activation_time);
        self.validations += 1;
        self.evict(now, &tx.hash);
        self.entries.insert(tx.hash.clone(), (valid, now));
        self.order.push_back((now, tx.hash.clone()));
        valid
    }

    /// Checks every transaction of `job`
    ///
    /// Every transaction is visited so the cache is warmed for the whole job.
    pub fn refresh(&mut self, job: &MiningJob, activation_time: i64) -> bool {
        job.transactions
            .iter()
            .fold(true, |all, tx| self.check(tx, activation_time) && all)
    }

    /// Pops expired records from the front, then the oldest live entries
    /// until there is room for `incoming`
    fn evict(&mut self, now: Instant, incoming: &str) {
        while let Some((at, hash)) = self.order.front() {
            let live = self.entries.get(hash).is_some_and(|(_, current)| current == at);
            let expired = now.duration_since(*at) > self.ttl;
            let full = !self.entries.contains_key(incoming) && self.entries.len() >= self.capacity;
            if live && !expired && !full {
                break;
            }
            if let Some((_, hash)) = self.order.pop_front() {
                if live {
                    self.entries.remove(&hash);
                }
            }
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cache misses so far
    pub fn validations(&self) -> u64 {
        self.validations
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Nonce-independent inputs of the hash
pub struct GxHashPrepared {
    prefix: String,
    trace_payload: Vec<u8>,
    cross_validation: Hash32,
    fold_hashes: Vec<String>,
    target: Target,
}

impl GxHashPrepared {
    fn new(job: &MiningJob, optimized: bool) -> Self {
        let mut trace_payload = Vec::new();
        for tx in job.non_coinbase() {
            trace_payload.extend_from_slice(tx.prev_tx_hash.as_bytes());
            trace_payload.extend_from_slice(tx.referenced_amount.to_string().as_bytes());
            trace_payload.extend_from_slice(tx.timestamp.to_string().as_bytes());
            trace_payload.extend_from_slice(tx.traceability_proof.as_bytes());
        }

        let mut hashes: Vec<&str> = job.transactions.iter().map(|t| t.hash.as_str()).collect();
        let mut links: Vec<&str> = job.non_coinbase().map(|t| t.prev_tx_hash.as_str()).collect();
        hashes.sort_unstable();
        links.sort_unstable();
        let cross_validation = sha256(format!("{}{}", hashes.concat(), links.concat()).as_bytes());

        GxHashPrepared {
            prefix: job.header_prefix(),
            trace_payload,
            cross_validation,
            fold_hashes: job.transactions.iter().map(|t| t.hash.clone()).collect(),
            target: Target::gxhash(job.difficulty, optimized),
        }
    }

    /// `(final digest, traceability digest)` for `nonce`
    fn compute(&self, nonce: u64) -> (Hash32, Hash32) {
        let base = sha256(format!("{}{}", self.prefix, nonce).as_bytes());

        let mut trace_input = Vec::with_capacity(32 + self.trace_payload.len());
        trace_input.extend_from_slice(&base);
        trace_input.extend_from_slice(&self.trace_payload);
        let traceability = sha256(&trace_input);

        let nonce_bytes = nonce.to_le_bytes();
        let mut current = traceability;
        let mut buf = Vec::with_capacity(32 + 32 + 8 + 64);
        for round in 0..ROUNDS {
            buf.clear();
            buf.extend_from_slice(&current);
            buf.extend_from_slice(&self.cross_validation);
            buf.extend_from_slice(&nonce_bytes);
            if round % FOLD_INTERVAL == FOLD_INTERVAL - 1 && !self.fold_hashes.is_empty() {
                let fold = &self.fold_hashes[(round / FOLD_INTERVAL) % self.fold_hashes.len()];
                buf.extend_from_slice(fold.as_bytes());
            }
            current = keccak256(&buf);
        }
        (current, traceability)
    }
}

/// Hashing side of the engine
#[derive(Debug)]
pub struct GxHashAlgorithm {
    optimized: AtomicBool,
    activation_time: i64,
    cache: Mutex<TraceabilityCache>,
}

impl GxHashAlgorithm {
    pub fn new(config: &GxHashConfig) -> Self {
        GxHashAlgorithm {
            optimized: AtomicBool::new(config.traceability_optimized),
            activation_time: config.activation_time,
            cache: Mutex::new(TraceabilityCache::new(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            )),
        }
    }

    fn optimized(&self) -> bool {
        self.optimized.load(Ordering::Relaxed)
    }

    /// Evaluates the full rule set for one nonce without touching the cache
    pub fn mine_gxhash_block(&self, job: &MiningJob, nonce: u64) -> bool {
        let traceable = job
            .transactions
            .iter()
            .all(|tx| transaction_passes(tx, self.activation_time));
        if !traceable {
            return false;
        }
        let prepared = GxHashPrepared::new(job, self.optimized());
        let (digest, _) = prepared.compute(nonce);
        prepared.target.is_met_by(&digest)
    }
}

impl Algorithm for GxHashAlgorithm {
    type Prepared = GxHashPrepared;

    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::GxHash
    }

    /// Refuses jobs whose transactions fail the traceability rules
    fn prepare(&self, job: &MiningJob) -> Option<Self::Prepared> {
        if !self.cache.lock().refresh(job, self.activation_time) {
            return None;
        }
        Some(GxHashPrepared::new(job, self.optimized()))
    }

    fn try_nonce(
        &self,
        job: &MiningJob,
        prepared: &Self::Prepared,
        nonce: u64,
    ) -> Option<MiningSolution> {
        let (digest, traceability) = prepared.compute(nonce);
        if !prepared.target.is_met_by(&digest) {
            return None;
        }
        Some(MiningSolution {
            job_id: job.job_id.clone(),
            nonce,
            extra_nonce: 0,
            timestamp: unix_time(),
            algorithm: AlgorithmType::GxHash,
            hash: hex::encode(digest),
            proof: SolutionProof::GxHash {
                traceability_digest: hex::encode(traceability),
                cross_validation_digest: hex::encode(prepared.cross_validation),
                traceability_valid: true,
            },
        })
    }
}

/// GXHash mining engine
pub struct GxHashMiner {
    algorithm: Arc<GxHashAlgorithm>,
    scheduler: Scheduler,
    threads: usize,
    solution_sender: Option<Sender<MiningSolution>>,
}

impl GxHashMiner {
    pub fn new(threads: usize, config: &GxHashConfig) -> Self {
        GxHashMiner {
            algorithm: Arc::new(GxHashAlgorithm::new(config)),
            scheduler: Scheduler::new(GXHASH_TARGET),
            threads,
            solution_sender: None,
        }
    }

    pub fn set_solution_sender(&mut self, sender: Sender<MiningSolution>) {
        self.solution_sender = Some(sender);
    }

    pub fn start(&mut self) -> Result<(), MinerError> {
        let sender = self.solution_sender.clone().ok_or_else(|| {
            MinerError::ChannelError("No solution channel attached".to_string())
        })?;
        self.algorithm.cache.lock().clear();
        self.scheduler
            .start(self.algorithm.clone(), self.threads, sender)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Replaces the current job after refreshing the traceability cache
    pub fn set_job(&self, job: MiningJob) -> u64 {
        let valid = self
            .algorithm
            .cache
            .lock()
            .refresh(&job, self.algorithm.activation_time);
        if !valid {
            log::warn!(
                target: GXHASH_TARGET,
                "Job {} has transactions failing traceability; it will not be mined",
                job.job_id
            );
        }
        self.scheduler.publish(job)
    }

    /// See [`GxHashAlgorithm::mine_gxhash_block`]
    pub fn mine_gxhash_block(&self, job: &MiningJob, nonce: u64) -> bool {
        self.algorithm.mine_gxhash_block(job, nonce)
    }

    pub fn set_traceability_optimization(&self, enabled: bool) {
        self.algorithm.optimized.store(enabled, Ordering::Relaxed);
        log::info!(
            target: GXHASH_TARGET,
            "Traceability optimization {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn is_mining_capable(&self) -> bool {
        true
    }

    pub fn is_mining(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn stats(&self) -> MiningStats {
        let mut stats = MiningStats::from_scheduler(AlgorithmType::GxHash, &self.scheduler);
        stats.traceability_validations = Some(self.algorithm.cache.lock().validations());
        stats
    }

    pub fn optimization_info(&self) -> String {
        let cache = self.algorithm.cache.lock();
        format!(
            "GXHash: {} rounds, {} threads, traceability cache {} entries, optimization {}, {} validations",
            ROUNDS,
            self.threads,
            cache.len(),
            if self.algorithm.optimized() { "on" } else { "off" },
            cache.validations()
        )
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
