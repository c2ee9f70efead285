// src/miner/algorithm/ethash.rs
//! Ethash engine
//!
//! Memory-hard proof of work keyed by an epoch dataset. The dataset for
//! `epoch = block_number / EPOCH_LENGTH` must be generated before any nonce
//! can be evaluated; a job from a new epoch triggers regeneration on a
//! background thread and workers idle until the dataset is ready again.
//!
//! Only a lookup cache is materialized in memory. Its nominal size still
//! follows the epoch growth schedule and is what the statistics report.

use super::Algorithm;
use crate::miner::digest::{Hash32, keccak256};
use crate::miner::job::{MiningJob, MiningSolution, SolutionProof};
use crate::miner::scheduler::Scheduler;
use crate::miner::target::Target;
use crate::stats::{MiningStats, available_memory};
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::ETHASH_TARGET;
use crate::utils::unix_time;
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Blocks per dataset epoch
pub const EPOCH_LENGTH: u64 = 30_000;

/// Nominal dataset size at epoch 0 (1 GiB)
pub const DATASET_BASE_SIZE: u64 = 1 << 30;

/// Nominal growth per epoch, in bytes
pub const DATASET_GROWTH: u64 = 8192;

/// Dataset lookups per hash
pub const CACHE_ROUNDS: usize = 3;

/// Size of one dataset item, in bytes
pub const ITEM_SIZE: usize = 64;

/// Ethash engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthashConfig {
    /// Bytes of lookup cache materialized per epoch
    pub cache_bytes: usize,
    /// Require the nominal dataset size to be free instead of the
    /// materialized cache size when checking capability
    pub require_nominal_memory: bool,
}

impl Default for EthashConfig {
    fn default() -> Self {
        EthashConfig {
            cache_bytes: 1 << 20,
            require_nominal_memory: false,
        }
    }
}

/// Dataset epoch of a block
pub fn epoch_of(block_number: u64) -> u64 {
    block_number / EPOCH_LENGTH
}

/// Nominal dataset size for `epoch`
pub fn dataset_size(epoch: u64) -> u64 {
    DATASET_BASE_SIZE.saturating_add(epoch.saturating_mul(DATASET_GROWTH))
}

/// Generated lookup data for one epoch
#[derive(Debug)]
pub struct DagDataset {
    epoch: u64,
    cache: Vec<u8>,
}

impl DagDataset {
    /// Generates the dataset for `epoch`
    ///
    /// The cache is a Keccak-256 chain seeded from the epoch number.
    ///
    /// # Arguments
    /// * `epoch` - Dataset epoch
    /// * `cache_bytes` - Materialized size, a non-zero multiple of [`ITEM_SIZE`]
    pub fn generate(epoch: u64, cache_bytes: usize) -> Result<Self, MinerError> {
        if cache_bytes == 0 || cache_bytes % ITEM_SIZE != 0 {
            return Err(MinerError::DatasetError(format!(
                "Cache size {} is not a positive multiple of {}",
                cache_bytes, ITEM_SIZE
            )));
        }

        let mut cache = vec![0u8; cache_bytes];
        let mut seed = keccak256(&epoch.to_le_bytes());
        for chunk in cache.chunks_mut(32) {
            chunk.copy_from_slice(&seed);
            seed = keccak256(&seed);
        }

        Ok(DagDataset { epoch, cache })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Nominal size of this epoch's dataset
    pub fn size(&self) -> u64 {
        dataset_size(self.epoch)
    }

    fn item_count(&self) -> usize {
        self.cache.len() / ITEM_SIZE
    }

    /// Item selected by `index`, wrapped to the cache
    pub fn item(&self, index: u64) -> &[u8] {
        let start = (index % self.item_count() as u64) as usize * ITEM_SIZE;
        &self.cache[start..start + ITEM_SIZE]
    }

    /// Mixes `header_digest` with dataset items
    ///
    /// # Returns
    /// `(final digest, mix digest)`
    pub fn hashimoto(&self, header_digest: &Hash32) -> (Hash32, Hash32) {
        let mut mix = *header_digest;
        let mut buf = [0u8; 32 + ITEM_SIZE];
        for round in 0..CACHE_ROUNDS {
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&mix[..8]);
            let index = u64::from_le_bytes(index_bytes) ^ round as u64;
            buf[..32].copy_from_slice(&mix);
            buf[32..].copy_from_slice(self.item(index));
            mix = keccak256(&buf);
        }

        let mut tail = [0u8; 64];
        tail[..32].copy_from_slice(header_digest);
        tail[32..].copy_from_slice(&mix);
        (keccak256(&tail), mix)
    }
}

/// Where the engine's dataset stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetStatus {
    NoDataset,
    Generating { epoch: u64 },
    Ready { epoch: u64 },
}

#[derive(Debug)]
struct DatasetSlot {
    status: DatasetStatus,
    dataset: Option<Arc<DagDataset>>,
    /// Bumped for every requested generation; stale results are discarded
    generation: u64,
}

/// Hashing side of the engine
#[derive(Debug)]
pub struct EthashAlgorithm {
    slot: RwLock<DatasetSlot>,
    cache_bytes: usize,
}

/// Per-job state: the ready dataset and the header text without the nonce
pub struct EthashPrepared {
    dataset: Arc<DagDataset>,
    prefix: String,
    block_number: u64,
    target: Target,
}

impl EthashAlgorithm {
    pub fn new(cache_bytes: usize) -> Self {
        EthashAlgorithm {
            slot: RwLock::new(DatasetSlot {
                status: DatasetStatus::NoDataset,
                dataset: None,
                generation: 0,
            }),
            cache_bytes,
        }
    }

    pub fn status(&self) -> DatasetStatus {
        self.slot.read().status
    }

    /// Dataset for `epoch` if it is generated
    fn ready_dataset(&self, epoch: u64) -> Option<Arc<DagDataset>> {
        let slot = self.slot.read();
        match slot.status {
            DatasetStatus::Ready { epoch: ready } if ready == epoch => slot.dataset.clone(),
            _ => None,
        }
    }

    /// Marks a generation for `epoch` as started
    ///
    /// # Returns
    /// The generation ticket, or `None` when `epoch` is already ready or
    /// being generated
    fn begin_generation(&self, epoch: u64) -> Option<u64> {
        let mut slot = self.slot.write();
        match slot.status {
            DatasetStatus::Ready { epoch: e } | DatasetStatus::Generating { epoch: e }
                if e == epoch =>
            {
                None
            }
            _ => {
                slot.generation += 1;
                slot.status = DatasetStatus::Generating { epoch };
                Some(slot.generation)
            }
        }
    }

    /// Installs a finished dataset unless a newer generation was requested
    fn finish_generation(
        &self,
        ticket: u64,
        result: Result<DagDataset, MinerError>,
    ) -> Result<(), MinerError> {
        let mut slot = self.slot.write();
        if slot.generation != ticket {
            log::debug!(target: ETHASH_TARGET, "Discarding superseded dataset generation");
            return Ok(());
        }
        match result {
            Ok(dataset) => {
                log::info!(
                    target: ETHASH_TARGET,
                    "Dataset generated for epoch {}: {} MB nominal",
                    dataset.epoch(),
                    dataset.size() / (1024 * 1024)
                );
                slot.status = DatasetStatus::Ready {
                    epoch: dataset.epoch(),
                };
                slot.dataset = Some(Arc::new(dataset));
                Ok(())
            }
            Err(e) => {
                slot.status = DatasetStatus::NoDataset;
                slot.dataset = None;
                Err(e)
            }
        }
    }

    /// Generates the dataset for `epoch` on the calling thread
    pub fn generate_now(&self, epoch: u64) -> Result<(), MinerError> {
        match self.begin_generation(epoch) {
            Some(ticket) => {
                log::info!(target: ETHASH_TARGET, "Generating dataset for epoch {}", epoch);
                self.finish_generation(ticket, DagDataset::generate(epoch, self.cache_bytes))
            }
            None => Ok(()),
        }
    }

    /// Evaluates one nonce; `None` unless the dataset for the job is ready
    fn evaluate(&self, job: &MiningJob, nonce: u64) -> Option<(Hash32, Hash32)> {
        let dataset = self.ready_dataset(epoch_of(job.block_number))?;
        let header = format!("{}{}", job.header(nonce), job.block_number);
        Some(dataset.hashimoto(&keccak256(header.as_bytes())))
    }
}

impl Algorithm for EthashAlgorithm {
    type Prepared = EthashPrepared;

    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Ethash
    }

    fn prepare(&self, job: &MiningJob) -> Option<Self::Prepared> {
        let dataset = self.ready_dataset(epoch_of(job.block_number))?;
        Some(EthashPrepared {
            dataset,
            prefix: job.header_prefix(),
            block_number: job.block_number,
            target: Target::ethash(job.difficulty),
        })
    }

    fn try_nonce(
        &self,
        job: &MiningJob,
        prepared: &Self::Prepared,
        nonce: u64,
    ) -> Option<MiningSolution> {
        let header = format!("{}{}{}", prepared.prefix, nonce, prepared.block_number);
        let (digest, mix) = prepared.dataset.hashimoto(&keccak256(header.as_bytes()));
        if !prepared.target.is_met_by(&digest) {
            return None;
        }
        Some(MiningSolution {
            job_id: job.job_id.clone(),
            nonce,
            extra_nonce: 0,
            timestamp: unix_time(),
            algorithm: AlgorithmType::Ethash,
            hash: hex::encode(digest),
            proof: SolutionProof::Ethash {
                mix_digest: hex::encode(mix),
            },
        })
    }
}

/// Ethash mining engine
pub struct EthashMiner {
    algorithm: Arc<EthashAlgorithm>,
    scheduler: Scheduler,
    config: EthashConfig,
    threads: usize,
    solution_sender: Option<Sender<MiningSolution>>,
    generators: Mutex<Vec<JoinHandle<()>>>,
}

impl EthashMiner {
    /// Creates a stopped engine with no dataset
    pub fn new(threads: usize, config: EthashConfig) -> Self {
        EthashMiner {
            algorithm: Arc::new(EthashAlgorithm::new(config.cache_bytes)),
            scheduler: Scheduler::new(ETHASH_TARGET),
            config,
            threads,
            solution_sender: None,
            generators: Mutex::new(Vec::new()),
        }
    }

    pub fn set_solution_sender(&mut self, sender: Sender<MiningSolution>) {
        self.solution_sender = Some(sender);
    }

    /// Bytes of free memory the engine needs
    pub fn memory_requirement(&self) -> u64 {
        let epoch = self
            .scheduler
            .current_job()
            .map_or(0, |job| epoch_of(job.block_number));
        if self.config.require_nominal_memory {
            dataset_size(epoch)
        } else {
            self.config.cache_bytes as u64
        }
    }

    /// True when the host has enough free memory for the dataset
    pub fn is_mining_capable(&self) -> bool {
        available_memory() >= self.memory_requirement()
    }

    /// Checks capability, generates the first dataset, starts the workers
    ///
    /// # Errors
    /// * [`MinerError::CapabilityError`] when memory is insufficient
    /// * [`MinerError::DatasetError`] when generation fails
    pub fn start(&mut self) -> Result<(), MinerError> {
        let sender = self.solution_sender.clone().ok_or_else(|| {
            MinerError::ChannelError("No solution channel attached".to_string())
        })?;

        let required = self.memory_requirement();
        let available = available_memory();
        if available < required {
            return Err(MinerError::CapabilityError(format!(
                "Ethash needs {} bytes of free memory, {} available",
                required, available
            )));
        }

        let epoch = self
            .scheduler
            .current_job()
            .map_or(0, |job| epoch_of(job.block_number));
        if self.algorithm.status() != (DatasetStatus::Ready { epoch }) {
            self.wait_for_dataset();
            self.algorithm.generate_now(epoch)?;
        }

        self.scheduler
            .start(self.algorithm.clone(), self.threads, sender)
    }

    /// Stops the workers and waits for any dataset generation in flight
    pub fn stop(&mut self) {
        self.scheduler.stop();
        for handle in self.generators.lock().drain(..) {
            if handle.join().is_err() {
                log::error!(target: ETHASH_TARGET, "Dataset generator panicked");
            }
        }
    }

    /// Replaces the current job, regenerating the dataset off-thread when
    /// the job belongs to a new epoch
    pub fn set_job(&self, job: MiningJob) -> u64 {
        let epoch = epoch_of(job.block_number);
        if let Some(ticket) = self.algorithm.begin_generation(epoch) {
            log::info!(target: ETHASH_TARGET, "Epoch changed to {}, regenerating dataset", epoch);
            let algorithm = self.algorithm.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("ethash-dataset-{}", epoch))
                .spawn(move || {
                    let result = DagDataset::generate(epoch, algorithm.cache_bytes);
                    if let Err(e) = algorithm.finish_generation(ticket, result) {
                        log::error!(target: ETHASH_TARGET, "Dataset generation failed: {}", e);
                    }
                });
            match spawned {
                Ok(handle) => {
                    let mut generators = self.generators.lock();
                    generators.retain(|h| !h.is_finished());
                    generators.push(handle);
                }
                Err(e) => {
                    log::error!(target: ETHASH_TARGET, "Failed to spawn dataset generator: {}", e);
                    let result = DagDataset::generate(epoch, self.algorithm.cache_bytes);
                    if let Err(e) = self.algorithm.finish_generation(ticket, result) {
                        log::error!(target: ETHASH_TARGET, "Dataset generation failed: {}", e);
                    }
                }
            }
        }
        self.scheduler.publish(job)
    }

    /// Evaluates one nonce; always false while the dataset is not ready
    pub fn mine(&self, job: &MiningJob, nonce: u64) -> bool {
        self.algorithm
            .evaluate(job, nonce)
            .is_some_and(|(digest, _)| Target::ethash(job.difficulty).is_met_by(&digest))
    }

    pub fn dataset_status(&self) -> DatasetStatus {
        self.algorithm.status()
    }

    /// Blocks until no dataset generation is in flight
    pub fn wait_for_dataset(&self) {
        for handle in self.generators.lock().drain(..) {
            if handle.join().is_err() {
                log::error!(target: ETHASH_TARGET, "Dataset generator panicked");
            }
        }
    }

    pub fn is_mining(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn stats(&self) -> MiningStats {
        let mut stats = MiningStats::from_scheduler(AlgorithmType::Ethash, &self.scheduler);
        if let DatasetStatus::Ready { epoch } | DatasetStatus::Generating { epoch } =
            self.algorithm.status()
        {
            stats.epoch = Some(epoch);
            stats.dataset_size = Some(dataset_size(epoch));
        }
        stats
    }

    pub fn optimization_info(&self) -> String {
        let status = match self.algorithm.status() {
            DatasetStatus::NoDataset => "not generated".to_string(),
            DatasetStatus::Generating { epoch } => format!("generating epoch {}", epoch),
            DatasetStatus::Ready { epoch } => format!(
                "epoch {}, {} MB nominal",
                epoch,
                dataset_size(epoch) / (1024 * 1024)
            ),
        };
        format!(
            "Ethash: {} threads, dataset {}, {} KiB cache, {} lookups per hash",
            self.threads,
            status,
            self.config.cache_bytes / 1024,
            CACHE_ROUNDS
        )
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EthashConfig {
        EthashConfig {
            cache_bytes: 64 * 1024,
            require_nominal_memory: false,
        }
    }

    fn job_at(block_number: u64) -> MiningJob {
        MiningJob::new("e", "0".repeat(64), block_number, 0.0, 1_750_000_000, Vec::new())
    }

    #[test]
    fn test_epoch_and_size_schedule() {
        assert_eq!(epoch_of(29_999), 0);
        assert_eq!(epoch_of(30_000), 1);
        assert_eq!(dataset_size(0), 1 << 30);
        assert!(dataset_size(2) > dataset_size(1));
    }

    #[test]
    fn test_dataset_is_deterministic_per_epoch() {
        let a = DagDataset::generate(3, 4096).unwrap();
        let b = DagDataset::generate(3, 4096).unwrap();
        let c = DagDataset::generate(4, 4096).unwrap();
        assert_eq!(a.item(7), b.item(7));
        assert_ne!(a.item(7), c.item(7));
        assert_eq!(a.item(64 + 7), a.item(7));
    }

    #[test]
    fn test_generate_rejects_bad_cache_size() {
        assert!(matches!(
            DagDataset::generate(0, 100),
            Err(MinerError::DatasetError(_))
        ));
    }

    #[test]
    fn test_mine_is_false_without_dataset() {
        let miner = EthashMiner::new(1, small_config());
        let job = job_at(1);
        assert_eq!(miner.dataset_status(), DatasetStatus::NoDataset);
        assert!((0..2_000u64).all(|nonce| !miner.mine(&job, nonce)));
        assert!(miner.algorithm.prepare(&job).is_none());
    }

    #[test]
    fn test_mine_succeeds_once_dataset_ready() {
        let miner = EthashMiner::new(1, small_config());
        let job = job_at(1);
        miner.algorithm.generate_now(0).unwrap();
        assert_eq!(miner.dataset_status(), DatasetStatus::Ready { epoch: 0 });
        // three zero bits: roughly one nonce in eight
        assert!((0..2_000u64).any(|nonce| miner.mine(&job, nonce)));
    }

    #[test]
    fn test_new_epoch_job_regenerates_in_background() {
        let miner = EthashMiner::new(1, small_config());
        miner.algorithm.generate_now(0).unwrap();
        miner.set_job(job_at(EPOCH_LENGTH));
        miner.wait_for_dataset();
        assert_eq!(miner.dataset_status(), DatasetStatus::Ready { epoch: 1 });
        assert_eq!(miner.stats().epoch, Some(1));
    }

    #[test]
    fn test_solution_carries_mix_digest() {
        let algorithm = EthashAlgorithm::new(4096);
        algorithm.generate_now(0).unwrap();
        let job = job_at(5);
        let prepared = algorithm.prepare(&job).unwrap();
        let solution = (0..5_000u64)
            .find_map(|nonce| algorithm.try_nonce(&job, &prepared, nonce))
            .unwrap();
        match solution.proof {
            SolutionProof::Ethash { mix_digest } => assert_eq!(mix_digest.len(), 64),
            other => panic!("unexpected proof {:?}", other),
        }
    }
}
