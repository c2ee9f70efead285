// src/stratum/server.rs
//! Stratum pool server
//!
//! Tracks remote miners, hands out jobs at pool difficulty and validates
//! shares. A share that also meets the network difficulty is promoted to a
//! block and offered to the ledger.
//!
//! The miner table and the job window have separate locks that are never
//! held together; share hashing runs with neither held.

use crate::ledger::{Ledger, mineable_transactions};
use crate::miner::digest::sha256d;
use crate::miner::job::{Block, JobTransaction, MiningJob, MiningSolution, SolutionProof};
use crate::miner::merkle::merkle_branches;
use crate::miner::reward::RewardConfig;
use crate::miner::target::check_difficulty_target;
use crate::stratum::auth::Authenticator;
use crate::stratum::types::{
    PoolMessage, PoolStats, ShareResponse, StratumJob, StratumMiner, StratumShare,
};
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::POOL_TARGET;
use crate::utils::unix_time;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// Pool server settings
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Difficulty assigned to new miners; never above the network difficulty
    /// of the job a share is checked against
    pub pool_difficulty: f64,
    /// Period of the job broadcast loop
    pub job_interval: Duration,
    /// Idle time after which a miner is evicted
    pub inactivity_timeout: Duration,
    /// Number of recent jobs that still accept shares
    pub job_window: usize,
    /// Pending transactions requested per job
    pub max_transactions: usize,
    /// Receiver of the pool's coinbase
    pub pool_address: String,
    pub extra_nonce2_size: usize,
    pub reward: RewardConfig,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            pool_difficulty: 1.0,
            job_interval: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(300),
            job_window: 10,
            max_transactions: 100,
            pool_address: String::new(),
            extra_nonce2_size: 4,
            reward: RewardConfig::default(),
        }
    }
}

/// Pool-side share digest: `sha256d(header(nonce) ‖ extra_nonce1 ‖ extra_nonce2)`
pub fn share_hash(job: &MiningJob, nonce: u64, extra_nonce1: &str, extra_nonce2: &str) -> String {
    let header = format!("{}{}{}", job.header(nonce), extra_nonce1, extra_nonce2);
    hex::encode(sha256d(header.as_bytes()))
}

struct MinerEntry {
    miner: StratumMiner,
    outbox: Option<UnboundedSender<PoolMessage>>,
}

impl MinerEntry {
    fn push(&self, message: PoolMessage) {
        if let Some(outbox) = &self.outbox {
            if outbox.send(message).is_err() {
                log::debug!(target: POOL_TARGET, "Outbox of {} is closed", self.miner.miner_id);
            }
        }
    }
}

struct CachedJob {
    job: StratumJob,
    /// `miner_id:nonce:extra_nonce2` of every share seen for this job
    seen: HashSet<String>,
}

/// Most recent jobs, oldest evicted first
struct JobWindow {
    order: VecDeque<String>,
    jobs: HashMap<String, CachedJob>,
    capacity: usize,
}

impl JobWindow {
    fn new(capacity: usize) -> Self {
        JobWindow {
            order: VecDeque::new(),
            jobs: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn insert(&mut self, job: StratumJob) {
        let id = job.job_id().to_string();
        if self.jobs.contains_key(&id) {
            return;
        }
        self.order.push_back(id.clone());
        self.jobs.insert(
            id,
            CachedJob {
                job,
                seen: HashSet::new(),
            },
        );
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.jobs.remove(&oldest);
            }
        }
    }

    fn latest(&self) -> Option<&StratumJob> {
        self.order
            .back()
            .and_then(|id| self.jobs.get(id))
            .map(|c| &c.job)
    }
}

/// Outcome of the locked job lookup for a share
enum JobLookup {
    Found(StratumJob),
    Unknown,
    Duplicate,
}

/// Stratum pool server
pub struct StratumServer {
    settings: PoolSettings,
    ledger: Arc<dyn Ledger>,
    auth: Arc<dyn Authenticator>,
    miners: RwLock<HashMap<String, MinerEntry>>,
    jobs: Mutex<JobWindow>,
    job_counter: AtomicU64,
    blocks_found: AtomicU64,
    started: Instant,
    stop: Arc<AtomicBool>,
    job_loop: Mutex<Option<JoinHandle<()>>>,
}

impl StratumServer {
    /// Creates a server with no miners and no jobs
    ///
    /// # Arguments
    /// * `settings` - Pool settings
    /// * `ledger` - Chain blocks are built on and submitted to
    /// * `auth` - Credential verifier for `authorize_miner`
    pub fn new(settings: PoolSettings, ledger: Arc<dyn Ledger>, auth: Arc<dyn Authenticator>) -> Self {
        StratumServer {
            jobs: Mutex::new(JobWindow::new(settings.job_window)),
            settings,
            ledger,
            auth,
            miners: RwLock::new(HashMap::new()),
            job_counter: AtomicU64::new(0),
            blocks_found: AtomicU64::new(0),
            started: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            job_loop: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Registers a connection; duplicate ids are ignored
    pub fn add_miner(&self, miner_id: &str, address: &str) {
        self.insert_miner(miner_id, address, None);
    }

    /// Registers a connection whose notifications go to `outbox`
    pub fn add_miner_with_outbox(
        &self,
        miner_id: &str,
        address: &str,
        outbox: UnboundedSender<PoolMessage>,
    ) {
        self.insert_miner(miner_id, address, Some(outbox));
    }

    fn insert_miner(&self, miner_id: &str, address: &str, outbox: Option<UnboundedSender<PoolMessage>>) {
        let mut miners = self.miners.write();
        if miners.contains_key(miner_id) {
            log::warn!(target: POOL_TARGET, "Miner {} already connected", miner_id);
            return;
        }
        miners.insert(
            miner_id.to_string(),
            MinerEntry {
                miner: StratumMiner::new(miner_id, address, self.settings.pool_difficulty, unix_time()),
                outbox,
            },
        );
        log::info!(target: POOL_TARGET, "Miner {} connected from {}", miner_id, address);
    }

    /// Forgets a miner (transport disconnect)
    pub fn remove_miner(&self, miner_id: &str) -> bool {
        let removed = self.miners.write().remove(miner_id).is_some();
        if removed {
            log::info!(target: POOL_TARGET, "Miner {} disconnected", miner_id);
        }
        removed
    }

    /// Checks credentials and, on success, sends the miner a fresh job
    ///
    /// # Returns
    /// `true` when the miner is now authorized
    pub fn authorize_miner(&self, miner_id: &str, username: &str, password: &str) -> bool {
        if !self.auth.verify(username, password) {
            log::warn!(target: POOL_TARGET, "Authorization failed for {} ({})", miner_id, username);
            return false;
        }

        {
            let mut miners = self.miners.write();
            let Some(entry) = miners.get_mut(miner_id) else {
                log::warn!(target: POOL_TARGET, "Authorization for unknown miner {}", miner_id);
                return false;
            };
            entry.miner.authorized = true;
            entry.miner.username = username.to_string();
            entry.miner.last_activity = Instant::now();
        }
        log::info!(target: POOL_TARGET, "Miner {} authorized as {}", miner_id, username);

        match self.generate_mining_job(false) {
            Ok(job) => {
                let miners = self.miners.read();
                if let Some(entry) = miners.get(miner_id) {
                    entry.push(PoolMessage::SetDifficulty(
                        entry.miner.difficulty.min(job.network_difficulty()),
                    ));
                    entry.push(PoolMessage::Notify(job.notify_params()));
                }
            }
            Err(e) => log::error!(target: POOL_TARGET, "Failed to build job for {}: {}", miner_id, e),
        }
        true
    }

    /// Builds a job from the ledger tip and caches it
    pub fn generate_mining_job(&self, clean_jobs: bool) -> Result<StratumJob, MinerError> {
        let tip = self.ledger.get_latest_block()?;
        let network_difficulty = self.ledger.get_difficulty()?;
        let height = tip.height + 1;
        let timestamp = unix_time();

        let coinbase = JobTransaction::coinbase(
            &self.settings.pool_address,
            self.settings.reward.calculate_mining_reward(height),
            height,
            timestamp,
        );
        let mut transactions = vec![coinbase.clone()];
        transactions.extend(mineable_transactions(
            self.ledger.as_ref(),
            self.settings.max_transactions,
        )?);
        let hashes: Vec<&str> = transactions.iter().map(|t| t.hash.as_str()).collect();
        let merkle_branches = merkle_branches(&hashes);

        let sequence = self.job_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let job = StratumJob {
            job: MiningJob::new(
                format!("{:x}", sequence),
                tip.hash(),
                height,
                network_difficulty,
                timestamp,
                transactions,
            ),
            extra_nonce1: format!("{:08x}", rand::random::<u32>()),
            extra_nonce2_size: self.settings.extra_nonce2_size,
            merkle_branches,
            coinbase,
            clean_jobs,
            pool_difficulty: self.settings.pool_difficulty.min(network_difficulty),
        };

        self.jobs.lock().insert(job.clone());
        log::debug!(
            target: POOL_TARGET,
            "Generated job {} at height {}",
            job.job_id(),
            height
        );
        Ok(job)
    }

    /// Sends `job` to every authorized miner with an outbox
    ///
    /// # Returns
    /// Number of miners notified
    pub fn broadcast_job(&self, job: &StratumJob) -> usize {
        let miners = self.miners.read();
        let mut notified = 0;
        for entry in miners.values().filter(|e| e.miner.authorized) {
            if entry.outbox.is_some() {
                entry.push(PoolMessage::Notify(job.notify_params()));
                notified += 1;
            }
        }
        notified
    }

    /// Validates a share and updates the miner's counters
    pub fn submit_share(&self, miner_id: &str, share: &StratumShare) -> ShareResponse {
        // unknown (or evicted) miners have no counters to update
        let difficulty = {
            let miners = self.miners.read();
            match miners.get(miner_id) {
                None => return ShareResponse::rejected("Unauthorized"),
                Some(entry) if !entry.miner.authorized => None,
                Some(entry) => Some(entry.miner.difficulty),
            }
        };
        let Some(difficulty) = difficulty else {
            return self.finish(miner_id, ShareResponse::rejected("Unauthorized"));
        };

        let nonce = match parse_nonce(&share.nonce) {
            Some(nonce) => nonce,
            None => return self.finish(miner_id, ShareResponse::rejected("Malformed nonce")),
        };
        if !is_hex_of_len(&share.extra_nonce2, self.settings.extra_nonce2_size * 2) {
            return self.finish(miner_id, ShareResponse::rejected("Malformed extra nonce"));
        }

        // job lookup
        let lookup = {
            let mut window = self.jobs.lock();
            match window.jobs.get_mut(&share.job_id) {
                None => JobLookup::Unknown,
                Some(cached) => {
                    let key = format!("{}:{}:{}", miner_id, nonce, share.extra_nonce2);
                    if cached.seen.insert(key) {
                        JobLookup::Found(cached.job.clone())
                    } else {
                        JobLookup::Duplicate
                    }
                }
            }
        };
        let job = match lookup {
            JobLookup::Found(job) => job,
            JobLookup::Unknown => return self.finish(miner_id, ShareResponse::rejected("Job not found")),
            JobLookup::Duplicate => return self.finish(miner_id, ShareResponse::rejected("Duplicate share")),
        };

        // hashing, no locks held
        let hash = share_hash(&job.job, nonce, &job.extra_nonce1, &share.extra_nonce2);
        if !check_difficulty_target(&hash, difficulty.min(job.network_difficulty())) {
            return self.finish(miner_id, ShareResponse::rejected("Low difficulty share"));
        }

        let block_candidate = check_difficulty_target(&hash, job.network_difficulty());
        let response = self.finish(miner_id, ShareResponse::accepted(block_candidate));
        if block_candidate {
            self.promote(&job, nonce, &share.extra_nonce2, &hash);
        }
        response
    }

    /// Updates the miner's counters for a share verdict
    fn finish(&self, miner_id: &str, response: ShareResponse) -> ShareResponse {
        let mut miners = self.miners.write();
        if let Some(entry) = miners.get_mut(miner_id) {
            if response.accepted {
                entry.miner.shares_accepted += 1;
            } else {
                entry.miner.shares_rejected += 1;
            }
            entry.miner.last_activity = Instant::now();
            entry.miner.hash_rate = entry.miner.estimate_hash_rate();
        }
        response
    }

    /// Offers a network-qualifying share to the ledger as a block
    fn promote(&self, job: &StratumJob, nonce: u64, extra_nonce2: &str, hash: &str) {
        let solution = MiningSolution {
            job_id: job.job_id().to_string(),
            nonce,
            extra_nonce: 0,
            timestamp: unix_time(),
            algorithm: AlgorithmType::Sha256,
            hash: hash.to_string(),
            proof: SolutionProof::None,
        };
        let mut block = Block::from_solution(&job.job, &solution, &self.settings.pool_address);
        block.extra_nonce = format!("{}{}", job.extra_nonce1, extra_nonce2);

        match self.ledger.add_block(&block) {
            Ok(true) => {
                self.blocks_found.fetch_add(1, Ordering::Relaxed);
                log::info!(target: POOL_TARGET, "Pool found block {} ({})", block.height, hash);
            }
            Ok(false) => log::warn!(target: POOL_TARGET, "Ledger rejected pool block {}", block.height),
            Err(e) => log::error!(target: POOL_TARGET, "Pool block submission failed: {}", e),
        }
    }

    /// Evicts miners idle longer than the inactivity timeout
    ///
    /// # Returns
    /// Ids of the evicted miners
    pub fn cleanup_inactive_miners(&self) -> Vec<String> {
        let timeout = self.settings.inactivity_timeout;
        let mut miners = self.miners.write();
        let stale: Vec<String> = miners
            .iter()
            .filter(|(_, e)| e.miner.last_activity.elapsed() > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            miners.remove(id);
            log::info!(target: POOL_TARGET, "Evicted inactive miner {}", id);
        }
        stale
    }

    /// Snapshot of one miner
    pub fn miner(&self, miner_id: &str) -> Option<StratumMiner> {
        self.miners.read().get(miner_id).map(|e| e.miner.clone())
    }

    pub fn connected_miners(&self) -> Vec<StratumMiner> {
        self.miners.read().values().map(|e| e.miner.clone()).collect()
    }

    /// The most recently generated job
    pub fn latest_job(&self) -> Option<StratumJob> {
        self.jobs.lock().latest().cloned()
    }

    pub fn job(&self, job_id: &str) -> Option<StratumJob> {
        self.jobs.lock().jobs.get(job_id).map(|c| c.job.clone())
    }

    pub fn stats(&self) -> PoolStats {
        let cached_jobs = self.jobs.lock().jobs.len();
        let miners = self.miners.read();
        PoolStats {
            connected_miners: miners.len(),
            authorized_miners: miners.values().filter(|e| e.miner.authorized).count(),
            hash_rate: miners.values().map(|e| e.miner.hash_rate).sum(),
            shares_accepted: miners.values().map(|e| e.miner.shares_accepted).sum(),
            shares_rejected: miners.values().map(|e| e.miner.shares_rejected).sum(),
            blocks_found: self.blocks_found.load(Ordering::Relaxed),
            cached_jobs,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    /// Starts the job loop: a clean job is broadcast every job interval and
    /// idle miners are evicted
    pub fn start(self: &Arc<Self>) -> Result<(), MinerError> {
        let mut slot = self.job_loop.lock();
        if slot.is_some() {
            return Ok(());
        }
        self.stop.store(false, Ordering::SeqCst);
        let server = self.clone();
        let handle = std::thread::Builder::new()
            .name("pool-jobs".to_string())
            .spawn(move || server.job_loop())
            .map_err(|e| MinerError::ThreadError(format!("Failed to spawn job loop: {}", e)))?;
        *slot = Some(handle);
        log::info!(target: POOL_TARGET, "Pool job loop started");
        Ok(())
    }

    fn job_loop(&self) {
        let mut next_job = Instant::now();
        while !self.stop.load(Ordering::Relaxed) {
            if Instant::now() >= next_job {
                next_job = Instant::now() + self.settings.job_interval;
                match self.generate_mining_job(true) {
                    Ok(job) => {
                        let notified = self.broadcast_job(&job);
                        log::info!(
                            target: POOL_TARGET,
                            "Broadcast job {} to {} miners",
                            job.job_id(),
                            notified
                        );
                    }
                    Err(e) => log::error!(target: POOL_TARGET, "Job generation failed: {}", e),
                }
                self.cleanup_inactive_miners();
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    /// Stops the job loop and waits for it
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.job_loop.lock().take() {
            if handle.join().is_err() {
                log::error!(target: POOL_TARGET, "Pool job loop panicked");
            }
        }
    }
}

fn parse_nonce(text: &str) -> Option<u64> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn is_hex_of_len(text: &str, len: usize) -> bool {
    text.len() == len && text.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::stratum::auth::{OpenAuthenticator, StaticAuthenticator};

    fn server_with(ledger: Arc<MemoryLedger>, pool_difficulty: f64) -> StratumServer {
        StratumServer::new(
            PoolSettings {
                pool_difficulty,
                pool_address: "GXCpool".to_string(),
                ..Default::default()
            },
            ledger,
            Arc::new(OpenAuthenticator),
        )
    }

    fn share(job: &StratumJob, miner: &str, nonce: u64) -> StratumShare {
        StratumShare {
            job_id: job.job_id().to_string(),
            nonce: format!("{:x}", nonce),
            extra_nonce2: "00000001".to_string(),
            miner_id: miner.to_string(),
        }
    }

    #[test]
    fn test_duplicate_miner_is_ignored() {
        let server = server_with(Arc::new(MemoryLedger::new(1.0)), 1.0);
        server.add_miner("m1", "10.0.0.1:1000");
        server.add_miner("m1", "10.0.0.2:2000");
        assert_eq!(server.connected_miners().len(), 1);
        assert_eq!(server.miner("m1").unwrap().address, "10.0.0.1:1000");
    }

    #[test]
    fn test_authorize_generates_and_sends_job() {
        let server = server_with(Arc::new(MemoryLedger::new(1.0)), 1.0);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        server.add_miner_with_outbox("m1", "peer", tx);
        assert!(server.authorize_miner("m1", "worker", "x"));
        assert!(server.miner("m1").unwrap().authorized);

        assert_eq!(rx.try_recv().unwrap(), PoolMessage::SetDifficulty(1.0));
        let job = server.latest_job().unwrap();
        assert_eq!(rx.try_recv().unwrap(), PoolMessage::Notify(job.notify_params()));
        assert_eq!(job.extra_nonce1.len(), 8);
        assert!(job.job.transactions[0].coinbase);
    }

    #[test]
    fn test_static_credentials_reject_unknown_user() {
        let server = StratumServer::new(
            PoolSettings::default(),
            Arc::new(MemoryLedger::new(1.0)),
            Arc::new(StaticAuthenticator::new(HashMap::from([(
                "alice".to_string(),
                "pw".to_string(),
            )]))),
        );
        server.add_miner("m1", "peer");
        assert!(!server.authorize_miner("m1", "mallory", "pw"));
        assert!(server.authorize_miner("m1", "alice", "pw"));
    }

    #[test]
    fn test_rejections_and_counters() {
        let server = server_with(Arc::new(MemoryLedger::new(1.0)), 0.0);
        server.add_miner("m1", "peer");
        let job = server.generate_mining_job(false).unwrap();

        // unauthorized share still counts
        let r = server.submit_share("m1", &share(&job, "m1", 1));
        assert_eq!(r.reason.as_deref(), Some("Unauthorized"));

        server.authorize_miner("m1", "worker", "x");
        let mut bad_nonce = share(&job, "m1", 1);
        bad_nonce.nonce = "zz".to_string();
        assert_eq!(
            server.submit_share("m1", &bad_nonce).reason.as_deref(),
            Some("Malformed nonce")
        );

        let mut unknown_job = share(&job, "m1", 1);
        unknown_job.job_id = "nope".to_string();
        assert_eq!(
            server.submit_share("m1", &unknown_job).reason.as_deref(),
            Some("Job not found")
        );

        server.submit_share("m1", &share(&job, "m1", 2));
        assert_eq!(
            server.submit_share("m1", &share(&job, "m1", 2)).reason.as_deref(),
            Some("Duplicate share")
        );

        let miner = server.miner("m1").unwrap();
        assert_eq!(miner.total_shares(), 5);

        assert_eq!(
            server.submit_share("ghost", &share(&job, "ghost", 1)).reason.as_deref(),
            Some("Unauthorized")
        );
    }

    #[test]
    fn test_job_window_keeps_ten_most_recent() {
        let server = server_with(Arc::new(MemoryLedger::new(1.0)), 1.0);
        let first = server.generate_mining_job(false).unwrap();
        for _ in 0..10 {
            server.generate_mining_job(false).unwrap();
        }
        assert!(server.job(first.job_id()).is_none());
        assert_eq!(server.stats().cached_jobs, 10);
    }

    #[test]
    fn test_accepted_share_meets_pool_target() {
        let ledger = Arc::new(MemoryLedger::new(1_000_000.0));
        let server = server_with(ledger.clone(), 0.0);
        server.add_miner("m1", "peer");
        server.authorize_miner("m1", "worker", "x");
        let job = server.latest_job().unwrap();

        let nonce = (0..2_000_000u64)
            .find(|n| {
                share_hash(&job.job, *n, &job.extra_nonce1, "00000001").starts_with("0000")
            })
            .unwrap();
        let response = server.submit_share("m1", &share(&job, "m1", nonce));
        assert!(response.accepted);
        assert!(!response.block_candidate);
        assert_eq!(ledger.submission_count(), 0);
        assert!(server.stats().hash_rate >= 0.0);
    }

    #[test]
    fn test_pool_bar_is_capped_at_network_difficulty() {
        let ledger = Arc::new(MemoryLedger::new(1000.0));
        let server = server_with(ledger.clone(), 10_000.0);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        server.add_miner_with_outbox("m1", "peer", tx);
        server.authorize_miner("m1", "worker", "x");
        let job = server.latest_job().unwrap();
        assert_eq!(job.pool_difficulty, 1000.0);
        assert_eq!(rx.try_recv().unwrap(), PoolMessage::SetDifficulty(1000.0));

        let nonce = (0..u64::MAX)
            .find(|n| check_difficulty_target(&share_hash(&job.job, *n, &job.extra_nonce1, "00000001"), 1000.0))
            .unwrap();
        let response = server.submit_share("m1", &share(&job, "m1", nonce));
        assert!(response.accepted);
        assert!(response.block_candidate);
        assert_eq!(ledger.submission_count(), 1);
    }

    #[test]
    fn test_cleanup_evicts_idle_miners() {
        let server = StratumServer::new(
            PoolSettings {
                inactivity_timeout: Duration::from_millis(20),
                ..Default::default()
            },
            Arc::new(MemoryLedger::new(1.0)),
            Arc::new(OpenAuthenticator),
        );
        server.add_miner("idle", "peer");
        std::thread::sleep(Duration::from_millis(50));
        server.add_miner("fresh", "peer");
        assert_eq!(server.cleanup_inactive_miners(), vec!["idle".to_string()]);
        assert!(server.miner("fresh").is_some());
    }

    #[test]
    fn test_parse_nonce() {
        assert_eq!(parse_nonce("ff"), Some(255));
        assert_eq!(parse_nonce("0x10"), Some(16));
        assert_eq!(parse_nonce(""), None);
        assert_eq!(parse_nonce("12345678901234567"), None);
    }
}
