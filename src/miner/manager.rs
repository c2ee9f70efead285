// src/miner/manager.rs
//! Mining manager
//!
//! Owns the active engine and drives it from the ledger:
//! - builds block templates (coinbase first, traceability-valid pending
//!   transactions after it) and publishes them as jobs
//! - refreshes the job when the chain height changes
//! - turns solutions into blocks and submits them, once per `job_id + nonce`
//! - adjusts difficulty from observed block times
//! - computes block rewards
//!
//! The manager runs three threads besides the engine's workers: the
//! submission thread, the coordinator loop and the difficulty loop. A
//! [`StatsReporter`] logs statistics periodically.

use crate::ledger::{Ledger, mineable_transactions};
use crate::miner::difficulty::{DifficultyAdjuster, DifficultyConfig};
use crate::miner::engine::{EngineSettings, MiningEngine};
use crate::miner::job::{Block, JobTransaction, MiningJob, MiningSolution};
use crate::miner::reward::RewardConfig;
use crate::stats::{MiningStats, StatsReporter};
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::MANAGER_TARGET;
use crate::utils::unix_time;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Granularity at which manager loops check the stop flag
const LOOP_TICK: Duration = Duration::from_millis(100);

/// Manager settings
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub algorithm: AlgorithmType,
    /// Worker threads per engine
    pub worker_threads: usize,
    /// Pending transactions requested per template
    pub max_transactions: usize,
    /// How often the coordinator checks the chain height
    pub refresh_interval: Duration,
    /// How often statistics are logged
    pub stats_interval: Duration,
    pub difficulty: DifficultyConfig,
    pub reward: RewardConfig,
    pub engines: EngineSettings,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            algorithm: AlgorithmType::Sha256,
            worker_threads: num_cpus::get(),
            max_transactions: 100,
            refresh_interval: Duration::from_secs(5),
            stats_interval: Duration::from_secs(60),
            difficulty: DifficultyConfig::default(),
            reward: RewardConfig::default(),
            engines: EngineSettings::default(),
        }
    }
}

/// Checks a reward address: non-empty, `GXC` (mainnet) or `tGXC` (testnet)
/// prefix, alphanumeric
pub fn validate_address(address: &str) -> Result<(), MinerError> {
    if address.is_empty() {
        return Err(MinerError::InputError("Miner address is empty".to_string()));
    }
    if !(address.starts_with("GXC") || address.starts_with("tGXC")) {
        return Err(MinerError::InputError(format!(
            "Miner address {} must start with GXC or tGXC",
            address
        )));
    }
    if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MinerError::InputError(format!(
            "Miner address {} contains invalid characters",
            address
        )));
    }
    Ok(())
}

/// What happened to a submitted solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The ledger accepted the block
    Accepted,
    /// The ledger rejected the block
    Rejected,
    /// The ledger could not be reached
    Failed,
    /// This `job_id + nonce` was already submitted
    Duplicate,
    /// The job is unknown or was superseded
    Stale,
}

/// State shared between the manager and its threads
struct Shared {
    config: ManagerConfig,
    ledger: Arc<dyn Ledger>,
    engine: Mutex<MiningEngine>,
    /// Template behind the engine's current job
    template: Mutex<Option<MiningJob>>,
    /// `job_id + nonce` pairs already submitted for the current template
    submitted: Mutex<HashSet<(String, u64)>>,
    difficulty: Mutex<DifficultyAdjuster>,
    /// Height and hash of the last tip seen
    last_tip: Mutex<Option<(u64, String)>>,
    miner_address: Mutex<String>,
    stop: AtomicBool,
    job_sequence: AtomicU64,
    blocks_found: AtomicU64,
    blocks_rejected: AtomicU64,
}

impl Shared {
    /// Records a new tip's time with the difficulty adjuster
    fn observe_tip(&self, tip: &Block) {
        let hash = tip.hash();
        let mut last = self.last_tip.lock();
        if last.as_ref().is_some_and(|(h, id)| *h == tip.height && *id == hash) {
            return;
        }
        *last = Some((tip.height, hash));
        drop(last);
        self.difficulty.lock().record_block_time(tip.timestamp);
    }

    /// Builds a template on top of the ledger's tip
    fn build_template(&self) -> Result<MiningJob, MinerError> {
        let tip = self.ledger.get_latest_block()?;
        self.observe_tip(&tip);

        let height = tip.height + 1;
        let difficulty = self.difficulty.lock().current();
        let timestamp = unix_time();
        let reward = self.config.reward.calculate_mining_reward(height);
        let address = self.miner_address.lock().clone();

        let mut transactions = vec![JobTransaction::coinbase(&address, reward, height, timestamp)];
        transactions.extend(mineable_transactions(
            self.ledger.as_ref(),
            self.config.max_transactions,
        )?);

        let sequence = self.job_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(MiningJob::new(
            format!("{}-{}", height, sequence),
            tip.hash(),
            height,
            difficulty,
            timestamp,
            transactions,
        ))
    }

    /// Builds a fresh template and hands it to the engine
    fn refresh_job(&self) -> Result<(), MinerError> {
        let job = self.build_template()?;
        log::info!(
            target: MANAGER_TARGET,
            "New job {} at height {} (difficulty {:.4}, {} transactions)",
            job.job_id,
            job.block_number,
            job.difficulty,
            job.transactions.len()
        );
        *self.template.lock() = Some(job.clone());
        self.submitted.lock().clear();
        self.engine.lock().set_job(job);
        Ok(())
    }

    /// True when the ledger moved away from the current template
    ///
    /// That is a different tip height, or a mineable pending set that no
    /// longer matches the template's transactions.
    fn needs_refresh(&self) -> Result<bool, MinerError> {
        let current = self.template.lock().as_ref().map(|job| {
            let included: Vec<String> = job.non_coinbase().map(|tx| tx.hash.clone()).collect();
            (job.block_number - 1, included)
        });
        let Some((height, included)) = current else {
            return Ok(true);
        };
        if self.ledger.get_height()? != height {
            return Ok(true);
        }
        let pending = mineable_transactions(self.ledger.as_ref(), self.config.max_transactions)?;
        Ok(pending.iter().map(|tx| &tx.hash).ne(included.iter()))
    }

    fn submit(&self, solution: &MiningSolution) -> SubmissionOutcome {
        let template = match self.template.lock().as_ref() {
            Some(job) if job.job_id == solution.job_id => job.clone(),
            _ => {
                log::debug!(
                    target: MANAGER_TARGET,
                    "Dropping solution for stale job {}",
                    solution.job_id
                );
                return SubmissionOutcome::Stale;
            }
        };

        if !self
            .submitted
            .lock()
            .insert((solution.job_id.clone(), solution.nonce))
        {
            return SubmissionOutcome::Duplicate;
        }

        let address = self.miner_address.lock().clone();
        let block = Block::from_solution(&template, solution, &address);
        match self.ledger.add_block(&block) {
            Ok(true) => {
                self.blocks_found.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    target: MANAGER_TARGET,
                    "Block {} accepted (nonce {}, hash {})",
                    block.height,
                    solution.nonce,
                    solution.hash
                );
                if let Err(e) = self.refresh_job() {
                    log::error!(target: MANAGER_TARGET, "Failed to refresh job: {}", e);
                }
                SubmissionOutcome::Accepted
            }
            Ok(false) => {
                self.blocks_rejected.fetch_add(1, Ordering::Relaxed);
                log::warn!(target: MANAGER_TARGET, "Block {} rejected by ledger", block.height);
                SubmissionOutcome::Rejected
            }
            Err(e) => {
                self.blocks_rejected.fetch_add(1, Ordering::Relaxed);
                log::error!(target: MANAGER_TARGET, "Block {} submission failed: {}", block.height, e);
                SubmissionOutcome::Failed
            }
        }
    }

    fn stats(&self) -> MiningStats {
        let mut stats = self.engine.lock().stats();
        stats.blocks_found = self.blocks_found.load(Ordering::Relaxed);
        stats.blocks_rejected = self.blocks_rejected.load(Ordering::Relaxed);
        stats.difficulty = self.difficulty.lock().current();
        stats
    }

    /// Sleeps up to `duration`, returning early on stop
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            if self.stop.load(Ordering::Relaxed) {
                return false;
            }
            std::thread::sleep(LOOP_TICK.min(deadline.saturating_duration_since(Instant::now())));
        }
        !self.stop.load(Ordering::Relaxed)
    }
}

/// Coordinates one engine against a ledger
pub struct MiningManager {
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
    reporter: Option<StatsReporter>,
    running: bool,
}

impl MiningManager {
    /// Creates a stopped manager
    ///
    /// # Arguments
    /// * `config` - Manager settings
    /// * `ledger` - Chain the manager mines on
    pub fn new(config: ManagerConfig, ledger: Arc<dyn Ledger>) -> Self {
        let engine = MiningEngine::new(config.algorithm, config.worker_threads, &config.engines);
        let difficulty = DifficultyAdjuster::new(config.difficulty.clone());
        MiningManager {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                template: Mutex::new(None),
                submitted: Mutex::new(HashSet::new()),
                difficulty: Mutex::new(difficulty),
                last_tip: Mutex::new(None),
                miner_address: Mutex::new(String::new()),
                stop: AtomicBool::new(false),
                job_sequence: AtomicU64::new(0),
                blocks_found: AtomicU64::new(0),
                blocks_rejected: AtomicU64::new(0),
                config,
                ledger,
            }),
            threads: Vec::new(),
            reporter: None,
            running: false,
        }
    }

    /// Starts mining for `miner_address`
    ///
    /// On error the manager is left stopped and may be started again.
    pub fn start(&mut self, miner_address: &str) -> Result<(), MinerError> {
        if self.running {
            log::warn!(target: MANAGER_TARGET, "Mining manager already running");
            return Ok(());
        }
        validate_address(miner_address)?;
        *self.shared.miner_address.lock() = miner_address.to_string();

        let (sender, receiver) = crossbeam_channel::unbounded();
        {
            let mut engine = self.shared.engine.lock();
            if !engine.is_mining_capable() {
                return Err(MinerError::CapabilityError(format!(
                    "{} engine cannot run on this host",
                    engine.algorithm()
                )));
            }
            engine.set_solution_sender(sender);
        }

        if let Ok(network) = self.shared.ledger.get_difficulty() {
            self.shared.difficulty.lock().set_current(network);
        }
        self.shared.refresh_job()?;
        self.shared.engine.lock().start()?;

        self.shared.stop.store(false, Ordering::SeqCst);
        if let Err(e) = self.spawn_loops(receiver) {
            self.stop();
            return Err(e);
        }

        let shared = self.shared.clone();
        let mut reporter =
            StatsReporter::new(Arc::new(move || shared.stats()), self.shared.config.stats_interval);
        reporter.start_reporting();
        self.reporter = Some(reporter);

        self.running = true;
        log::info!(
            target: MANAGER_TARGET,
            "Mining started with {} for {}",
            self.current_algorithm(),
            miner_address
        );
        Ok(())
    }

    fn spawn_loops(&mut self, receiver: Receiver<MiningSolution>) -> Result<(), MinerError> {
        let shared = self.shared.clone();
        self.spawn("manager-submit", move || {
            while !shared.stop.load(Ordering::Relaxed) {
                match receiver.recv_timeout(LOOP_TICK) {
                    Ok(solution) => {
                        shared.submit(&solution);
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;

        let shared = self.shared.clone();
        self.spawn("manager-coordinator", move || {
            // an accepted block already refreshed the template on the submit path
            while shared.wait(shared.config.refresh_interval) {
                match shared.needs_refresh() {
                    Ok(true) => {
                        if let Err(e) = shared.refresh_job() {
                            log::error!(target: MANAGER_TARGET, "Failed to refresh job: {}", e);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => log::warn!(target: MANAGER_TARGET, "Ledger check failed: {}", e),
                }
            }
        })?;

        let shared = self.shared.clone();
        let interval = Duration::from_secs(shared.config.difficulty.adjustment_interval_secs.max(1));
        self.spawn("manager-difficulty", move || {
            while shared.wait(interval) {
                let mut adjuster = shared.difficulty.lock();
                let before = adjuster.current();
                let after = adjuster.adjust();
                drop(adjuster);
                if (after - before).abs() > f64::EPSILON {
                    log::info!(
                        target: MANAGER_TARGET,
                        "Difficulty adjusted {:.4} -> {:.4}",
                        before,
                        after
                    );
                }
            }
        })?;
        Ok(())
    }

    fn spawn<F>(&mut self, name: &str, body: F) -> Result<(), MinerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|e| MinerError::ThreadError(format!("Failed to spawn {}: {}", name, e)))?;
        self.threads.push(handle);
        Ok(())
    }

    /// Stops the engine and every manager thread, waiting for all of them
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::error!(target: MANAGER_TARGET, "A manager thread panicked");
            }
        }
        self.shared.engine.lock().stop();
        if let Some(mut reporter) = self.reporter.take() {
            reporter.stop();
        }
        if self.running {
            log::info!(target: MANAGER_TARGET, "Mining stopped");
        }
        self.running = false;
    }

    /// Switches to `algorithm`, restarting the workers on the current job
    ///
    /// Statistics start over with the new engine. If the new engine cannot
    /// run, the previous one is kept. The new engine's dataset is built
    /// before the old engine is stopped, so the engine lock is only held for
    /// the swap itself.
    pub fn set_algorithm(&mut self, algorithm: AlgorithmType) -> Result<(), MinerError> {
        let previous = self.current_algorithm();
        if previous == algorithm {
            return Ok(());
        }

        let config = &self.shared.config;
        let mut next = MiningEngine::new(algorithm, config.worker_threads, &config.engines);
        if !next.is_mining_capable() {
            return Err(MinerError::CapabilityError(format!(
                "{} engine cannot run on this host",
                algorithm
            )));
        }
        let (sender, receiver) = crossbeam_channel::unbounded();
        next.set_solution_sender(sender);
        let template = self.shared.template.lock().clone();
        if let Some(job) = template {
            next.set_job(job);
        }
        next.prepare();

        let mut engine = self.shared.engine.lock();
        engine.stop();
        if self.running {
            if let Err(e) = next.start() {
                log::error!(
                    target: MANAGER_TARGET,
                    "Failed to start {} engine, restoring {}: {}",
                    algorithm,
                    previous,
                    e
                );
                let restarted = engine.start();
                if let Err(restart) = restarted {
                    log::error!(target: MANAGER_TARGET, "Failed to restart {}: {}", previous, restart);
                }
                return Err(e);
            }
        }

        *engine = next;
        drop(engine);
        log::info!(target: MANAGER_TARGET, "Switched algorithm {} -> {}", previous, algorithm);

        if self.running {
            // the submission thread is bound to the old engine's channel
            self.restart_submission(receiver)?;
        }
        Ok(())
    }

    /// Replaces the submission thread with one reading `receiver`
    fn restart_submission(&mut self, receiver: Receiver<MiningSolution>) -> Result<(), MinerError> {
        self.shared.stop.store(true, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::error!(target: MANAGER_TARGET, "A manager thread panicked");
            }
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        self.spawn_loops(receiver)
    }

    /// Hands a solution to the submission path directly
    pub fn submit_solution(&self, solution: &MiningSolution) -> SubmissionOutcome {
        self.shared.submit(solution)
    }

    /// Builds a template without publishing it
    pub fn build_template(&self) -> Result<MiningJob, MinerError> {
        self.shared.build_template()
    }

    /// Template behind the engine's current job
    pub fn current_job(&self) -> Option<MiningJob> {
        self.shared.template.lock().clone()
    }

    pub fn current_algorithm(&self) -> AlgorithmType {
        self.shared.engine.lock().algorithm()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reward paid by the coinbase at `height`
    pub fn calculate_mining_reward(&self, height: u64) -> f64 {
        self.shared.config.reward.calculate_mining_reward(height)
    }

    /// Current difficulty used for new templates
    pub fn difficulty(&self) -> f64 {
        self.shared.difficulty.lock().current()
    }

    /// Runs one difficulty adjustment immediately
    pub fn adjust_difficulty(&self) -> f64 {
        self.shared.difficulty.lock().adjust()
    }

    /// Records an observed block time, as the coordinator does for new tips
    pub fn record_block_time(&self, timestamp: i64) {
        self.shared.difficulty.lock().record_block_time(timestamp);
    }

    pub fn get_stats(&self) -> MiningStats {
        self.shared.stats()
    }

    pub fn optimization_info(&self) -> String {
        self.shared.engine.lock().optimization_info()
    }
}

impl Drop for MiningManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::miner::job::SolutionProof;

    const ADDRESS: &str = "tGXCtestminer";

    fn manager_with(ledger: Arc<MemoryLedger>, algorithm: AlgorithmType) -> MiningManager {
        MiningManager::new(
            ManagerConfig {
                algorithm,
                worker_threads: 1,
                ..Default::default()
            },
            ledger,
        )
    }

    fn solution_for(job: &MiningJob, nonce: u64) -> MiningSolution {
        MiningSolution {
            job_id: job.job_id.clone(),
            nonce,
            extra_nonce: 0,
            timestamp: unix_time(),
            algorithm: AlgorithmType::Sha256,
            hash: String::new(),
            proof: SolutionProof::None,
        }
    }

    #[test]
    fn test_address_validation() {
        assert!(validate_address("GXC9abc").is_ok());
        assert!(validate_address("tGXC9abc").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("BTC123").is_err());
        assert!(validate_address("GXC-bad").is_err());
    }

    #[test]
    fn test_start_rejects_bad_address_and_stays_stopped() {
        let ledger = Arc::new(MemoryLedger::new(1.0));
        let mut manager = manager_with(ledger, AlgorithmType::Sha256);
        assert!(matches!(manager.start("nope"), Err(MinerError::InputError(_))));
        assert!(!manager.is_running());
    }

    #[test]
    fn test_template_has_coinbase_first_and_filters_transactions() {
        let ledger = Arc::new(MemoryLedger::new(1.0));
        let good = JobTransaction::transfer(&"a".repeat(64), 2.0, 0.1, unix_time());
        let mut bad = JobTransaction::transfer(&"b".repeat(64), 2.0, 0.1, unix_time());
        bad.prev_tx_hash = "c".repeat(64);
        ledger.add_pending(good.clone());
        ledger.add_pending(bad);

        let manager = manager_with(ledger.clone(), AlgorithmType::Sha256);
        *manager.shared.miner_address.lock() = ADDRESS.to_string();
        let job = manager.build_template().unwrap();

        assert_eq!(job.block_number, 1);
        assert_eq!(job.previous_hash, ledger.get_latest_block().unwrap().hash());
        assert!(job.transactions[0].coinbase);
        assert_eq!(job.transactions[0].output_amount, manager.calculate_mining_reward(1));
        assert_eq!(job.transactions[0].receiver.as_deref(), Some(ADDRESS));
        assert_eq!(job.transactions.len(), 2);
        assert_eq!(job.transactions[1], good);
    }

    #[test]
    fn test_submission_is_idempotent_and_drops_stale_jobs() {
        let ledger = Arc::new(MemoryLedger::new(1.0));
        let manager = manager_with(ledger.clone(), AlgorithmType::Sha256);
        *manager.shared.miner_address.lock() = ADDRESS.to_string();
        manager.shared.refresh_job().unwrap();
        let job = manager.current_job().unwrap();

        ledger.set_reject_all(true);
        assert_eq!(manager.submit_solution(&solution_for(&job, 7)), SubmissionOutcome::Rejected);
        assert_eq!(manager.submit_solution(&solution_for(&job, 7)), SubmissionOutcome::Duplicate);
        assert_eq!(ledger.submission_count(), 1);

        let mut stale = solution_for(&job, 8);
        stale.job_id = "unknown".to_string();
        assert_eq!(manager.submit_solution(&stale), SubmissionOutcome::Stale);

        ledger.set_reject_all(false);
        assert_eq!(manager.submit_solution(&solution_for(&job, 9)), SubmissionOutcome::Accepted);
        assert_eq!(ledger.get_height().unwrap(), 1);
        // accepted block moves the manager to the next height
        assert_eq!(manager.current_job().unwrap().block_number, 2);
        let stats = manager.get_stats();
        assert_eq!((stats.blocks_found, stats.blocks_rejected), (1, 1));
    }

    #[test]
    fn test_start_mine_and_stop() {
        let ledger = Arc::new(MemoryLedger::new(0.0));
        let mut manager = manager_with(ledger.clone(), AlgorithmType::Sha256);
        manager.start(ADDRESS).unwrap();
        assert!(manager.is_running());

        let deadline = Instant::now() + Duration::from_secs(30);
        while ledger.get_height().unwrap() == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        manager.stop();
        assert!(!manager.is_running());
        assert!(ledger.get_height().unwrap() >= 1);
        assert!(manager.get_stats().blocks_found >= 1);

        // restartable
        manager.start(ADDRESS).unwrap();
        manager.stop();
    }

    #[test]
    fn test_set_algorithm_swaps_engine() {
        let ledger = Arc::new(MemoryLedger::new(1000.0));
        let mut manager = manager_with(ledger, AlgorithmType::Sha256);
        manager.start(ADDRESS).unwrap();
        manager.set_algorithm(AlgorithmType::GxHash).unwrap();
        assert_eq!(manager.current_algorithm(), AlgorithmType::GxHash);
        assert_eq!(manager.get_stats().algorithm, AlgorithmType::GxHash);
        assert!(manager.optimization_info().starts_with("GXHash"));
        manager.stop();
    }

    #[test]
    fn test_refresh_only_when_ledger_moves() {
        let ledger = Arc::new(MemoryLedger::new(1.0));
        let manager = manager_with(ledger.clone(), AlgorithmType::Sha256);
        *manager.shared.miner_address.lock() = ADDRESS.to_string();
        manager.shared.refresh_job().unwrap();
        assert!(!manager.shared.needs_refresh().unwrap());

        // the submit path already moved the template to the new tip
        let job = manager.current_job().unwrap();
        assert_eq!(manager.submit_solution(&solution_for(&job, 1)), SubmissionOutcome::Accepted);
        assert_eq!(ledger.get_height().unwrap(), 1);
        assert!(!manager.shared.needs_refresh().unwrap());

        let pending = JobTransaction::transfer(&"a".repeat(64), 2.0, 0.1, unix_time());
        ledger.add_pending(pending.clone());
        assert!(manager.shared.needs_refresh().unwrap());
        manager.shared.refresh_job().unwrap();
        assert!(!manager.shared.needs_refresh().unwrap());
        assert!(manager.current_job().unwrap().transactions.contains(&pending));
    }

    #[test]
    fn test_switch_to_ethash_builds_dataset_before_swapping() {
        let ledger = Arc::new(MemoryLedger::new(1000.0));
        let mut manager = manager_with(ledger, AlgorithmType::Sha256);
        manager.start(ADDRESS).unwrap();
        manager.set_algorithm(AlgorithmType::Ethash).unwrap();

        let stats = manager.get_stats();
        assert_eq!(stats.algorithm, AlgorithmType::Ethash);
        assert_eq!(stats.epoch, Some(0));
        assert!(manager.shared.engine.lock().is_mining());
        manager.stop();
    }

    #[test]
    fn test_difficulty_follows_recorded_block_times() {
        let ledger = Arc::new(MemoryLedger::new(1.0));
        let manager = manager_with(ledger, AlgorithmType::Sha256);
        let start = manager.difficulty();
        for i in 0..5 {
            manager.record_block_time(1_000 + i * 60);
        }
        assert!(manager.adjust_difficulty() > start);
    }
}
