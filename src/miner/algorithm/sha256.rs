// src/miner/algorithm/sha256.rs
//! SHA-256d engine
//!
//! Bitcoin-style proof of work: the header text
//! `previous_hash ‖ merkle_root ‖ timestamp ‖ bits ‖ nonce` is hashed twice
//! with SHA-256 and accepted when the digest has enough leading zero hex
//! characters for the job's difficulty.

use super::Algorithm;
use crate::miner::digest::{Hash32, sha256d};
use crate::miner::job::{MiningJob, MiningSolution, SolutionProof};
use crate::miner::scheduler::Scheduler;
use crate::miner::target::Target;
use crate::stats::MiningStats;
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::SHA256_TARGET;
use crate::utils::unix_time;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Proof-of-work digest of `job` at `nonce`
pub fn sha256_pow(job: &MiningJob, nonce: u64) -> Hash32 {
    sha256d(job.header(nonce).as_bytes())
}

/// Hashing side of the engine
#[derive(Debug, Default)]
pub struct Sha256Algorithm;

/// Header text without the nonce, and the job's target
pub struct Sha256Prepared {
    prefix: String,
    target: Target,
}

impl Algorithm for Sha256Algorithm {
    type Prepared = Sha256Prepared;

    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Sha256
    }

    fn prepare(&self, job: &MiningJob) -> Option<Self::Prepared> {
        Some(Sha256Prepared {
            prefix: job.header_prefix(),
            target: Target::sha256(job.difficulty),
        })
    }

    fn try_nonce(
        &self,
        job: &MiningJob,
        prepared: &Self::Prepared,
        nonce: u64,
    ) -> Option<MiningSolution> {
        let digest = sha256d(format!("{}{}", prepared.prefix, nonce).as_bytes());
        if !prepared.target.is_met_by(&digest) {
            return None;
        }
        Some(MiningSolution {
            job_id: job.job_id.clone(),
            nonce,
            extra_nonce: 0,
            timestamp: unix_time(),
            algorithm: AlgorithmType::Sha256,
            hash: hex::encode(digest),
            proof: SolutionProof::None,
        })
    }
}

/// SHA-256d mining engine
pub struct Sha256Miner {
    algorithm: Arc<Sha256Algorithm>,
    scheduler: Scheduler,
    threads: usize,
    solution_sender: Option<Sender<MiningSolution>>,
}

impl Sha256Miner {
    /// Creates a stopped engine
    ///
    /// # Arguments
    /// * `threads` - Number of worker threads started by [`start`](Self::start)
    pub fn new(threads: usize) -> Self {
        Sha256Miner {
            algorithm: Arc::new(Sha256Algorithm),
            scheduler: Scheduler::new(SHA256_TARGET),
            threads,
            solution_sender: None,
        }
    }

    pub fn set_solution_sender(&mut self, sender: Sender<MiningSolution>) {
        self.solution_sender = Some(sender);
    }

    /// Starts the worker pool
    ///
    /// Workers idle until a job is set.
    pub fn start(&mut self) -> Result<(), MinerError> {
        let sender = self.solution_sender.clone().ok_or_else(|| {
            MinerError::ChannelError("No solution channel attached".to_string())
        })?;
        self.scheduler
            .start(self.algorithm.clone(), self.threads, sender)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Replaces the current job; returns its version
    pub fn set_job(&self, job: MiningJob) -> u64 {
        self.scheduler.publish(job)
    }

    pub fn is_mining(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Always true: the engine has no special hardware requirements
    pub fn is_mining_capable(&self) -> bool {
        true
    }

    /// Evaluates one nonce against the job's target
    pub fn mine(&self, job: &MiningJob, nonce: u64) -> bool {
        Target::sha256(job.difficulty).is_met_by(&sha256_pow(job, nonce))
    }

    pub fn stats(&self) -> MiningStats {
        MiningStats::from_scheduler(AlgorithmType::Sha256, &self.scheduler)
    }

    pub fn optimization_info(&self) -> String {
        format!(
            "SHA-256d: {} threads, random nonce start per worker, stats merged every {} hashes",
            self.threads,
            AlgorithmType::Sha256.stats_bucket()
        )
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_prev_job(difficulty: f64) -> MiningJob {
        MiningJob::new("job-1", "0".repeat(64), 1, difficulty, 1_750_000_000, Vec::new())
    }

    #[test]
    fn test_finds_solution_at_difficulty_one() {
        let miner = Sha256Miner::new(1);
        let job = zero_prev_job(1.0);
        assert!((0..1_000_000u64).any(|nonce| miner.mine(&job, nonce)));
    }

    #[test]
    fn test_try_nonce_agrees_with_mine() {
        let miner = Sha256Miner::new(1);
        let job = zero_prev_job(0.0);
        let algorithm = Sha256Algorithm;
        let prepared = algorithm.prepare(&job).expect("always prepares");
        for nonce in 0..20_000u64 {
            let solution = algorithm.try_nonce(&job, &prepared, nonce);
            assert_eq!(solution.is_some(), miner.mine(&job, nonce));
            if let Some(solution) = solution {
                assert_eq!(solution.hash, hex::encode(sha256_pow(&job, nonce)));
                assert!(solution.hash.starts_with("0000"));
            }
        }
    }

    #[test]
    fn test_start_requires_solution_channel() {
        let mut miner = Sha256Miner::new(1);
        assert!(matches!(miner.start(), Err(MinerError::ChannelError(_))));
        assert!(!miner.is_mining());
    }
}
