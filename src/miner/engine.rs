// src/miner/engine.rs
//! Closed set of mining engines behind one interface.

use crate::miner::algorithm::ethash::{EthashConfig, EthashMiner};
use crate::miner::algorithm::gxhash::{GxHashConfig, GxHashMiner};
use crate::miner::algorithm::sha256::Sha256Miner;
use crate::miner::job::{MiningJob, MiningSolution};
use crate::miner::scheduler::Scheduler;
use crate::stats::MiningStats;
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crossbeam_channel::Sender;

/// Engine-specific settings consulted when an engine is built
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub ethash: EthashConfig,
    pub gxhash: GxHashConfig,
}

/// The active engine, selected by [`AlgorithmType`]
pub enum MiningEngine {
    Sha256(Sha256Miner),
    Ethash(EthashMiner),
    GxHash(GxHashMiner),
}

impl MiningEngine {
    /// Builds a stopped engine for `algorithm`
    pub fn new(algorithm: AlgorithmType, threads: usize, settings: &EngineSettings) -> Self {
        match algorithm {
            AlgorithmType::Sha256 => MiningEngine::Sha256(Sha256Miner::new(threads)),
            AlgorithmType::Ethash => {
                MiningEngine::Ethash(EthashMiner::new(threads, settings.ethash.clone()))
            }
            AlgorithmType::GxHash => {
                MiningEngine::GxHash(GxHashMiner::new(threads, &settings.gxhash))
            }
        }
    }

    pub fn algorithm(&self) -> AlgorithmType {
        match self {
            MiningEngine::Sha256(_) => AlgorithmType::Sha256,
            MiningEngine::Ethash(_) => AlgorithmType::Ethash,
            MiningEngine::GxHash(_) => AlgorithmType::GxHash,
        }
    }

    pub fn set_solution_sender(&mut self, sender: Sender<MiningSolution>) {
        match self {
            MiningEngine::Sha256(e) => e.set_solution_sender(sender),
            MiningEngine::Ethash(e) => e.set_solution_sender(sender),
            MiningEngine::GxHash(e) => e.set_solution_sender(sender),
        }
    }

    pub fn start(&mut self) -> Result<(), MinerError> {
        match self {
            MiningEngine::Sha256(e) => e.start(),
            MiningEngine::Ethash(e) => e.start(),
            MiningEngine::GxHash(e) => e.start(),
        }
    }

    pub fn stop(&mut self) {
        match self {
            MiningEngine::Sha256(e) => e.stop(),
            MiningEngine::Ethash(e) => e.stop(),
            MiningEngine::GxHash(e) => e.stop(),
        }
    }

    /// Replaces the current job; returns its version
    pub fn set_job(&self, job: MiningJob) -> u64 {
        match self {
            MiningEngine::Sha256(e) => e.set_job(job),
            MiningEngine::Ethash(e) => e.set_job(job),
            MiningEngine::GxHash(e) => e.set_job(job),
        }
    }

    /// Blocks until the data the current job needs is built
    ///
    /// Only Ethash has such data; starting afterwards skips generation.
    pub fn prepare(&self) {
        if let MiningEngine::Ethash(e) = self {
            e.wait_for_dataset();
        }
    }

    pub fn is_mining_capable(&self) -> bool {
        match self {
            MiningEngine::Sha256(e) => e.is_mining_capable(),
            MiningEngine::Ethash(e) => e.is_mining_capable(),
            MiningEngine::GxHash(e) => e.is_mining_capable(),
        }
    }

    pub fn is_mining(&self) -> bool {
        match self {
            MiningEngine::Sha256(e) => e.is_mining(),
            MiningEngine::Ethash(e) => e.is_mining(),
            MiningEngine::GxHash(e) => e.is_mining(),
        }
    }

    pub fn stats(&self) -> MiningStats {
        match self {
            MiningEngine::Sha256(e) => e.stats(),
            MiningEngine::Ethash(e) => e.stats(),
            MiningEngine::GxHash(e) => e.stats(),
        }
    }

    pub fn optimization_info(&self) -> String {
        match self {
            MiningEngine::Sha256(e) => e.optimization_info(),
            MiningEngine::Ethash(e) => e.optimization_info(),
            MiningEngine::GxHash(e) => e.optimization_info(),
        }
    }

    /// Evaluates a single nonce with the engine's own rules
    pub fn check_nonce(&self, job: &MiningJob, nonce: u64) -> bool {
        match self {
            MiningEngine::Sha256(e) => e.mine(job, nonce),
            MiningEngine::Ethash(e) => e.mine(job, nonce),
            MiningEngine::GxHash(e) => e.mine_gxhash_block(job, nonce),
        }
    }

    pub fn current_job(&self) -> Option<std::sync::Arc<MiningJob>> {
        self.scheduler().current_job()
    }

    /// True once all workers picked up job `version`
    pub fn workers_observed(&self, version: u64) -> bool {
        self.scheduler().workers_observed(version)
    }

    fn scheduler(&self) -> &Scheduler {
        match self {
            MiningEngine::Sha256(e) => e.scheduler(),
            MiningEngine::Ethash(e) => e.scheduler(),
            MiningEngine::GxHash(e) => e.scheduler(),
        }
    }
}
