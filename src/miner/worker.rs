// src/miner/worker.rs
//! Worker thread implementation
//!
//! A worker snapshots the current job, prepares the algorithm's per-job
//! state and walks its own nonce stream from a random start. The job slot is
//! re-read at every batch boundary; on a version change local progress is
//! dropped and the stream is re-randomized.

use crate::miner::algorithm::Algorithm;
use crate::miner::job::MiningSolution;
use crate::miner::scheduler::{HashMeter, PublishedJob};
use arc_swap::ArcSwapOption;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Delay between polls while there is nothing to mine
pub const IDLE_POLL: Duration = Duration::from_millis(100);

/// Nonces attempted between two reads of the job slot
const BATCH_SIZE: u64 = 64;

/// Shared state handed to every worker of one pool
pub struct WorkerContext {
    /// Current job slot owned by the scheduler
    pub job_slot: Arc<ArcSwapOption<PublishedJob>>,
    /// Set when the pool is shutting down
    pub stop: Arc<AtomicBool>,
    /// Last job version picked up by each worker
    pub observed: Arc<Vec<AtomicU64>>,
    /// Shared hash counters
    pub meter: Arc<Mutex<HashMeter>>,
    /// Channel for sending found solutions
    pub solution_sender: Sender<MiningSolution>,
    pub log_target: &'static str,
}

/// Worker thread that performs mining computations
pub struct Worker<A: Algorithm> {
    id: usize,
    /// The mining algorithm implementation to use
    algorithm: Arc<A>,
    ctx: WorkerContext,
}

impl<A: Algorithm> Worker<A> {
    /// Creates a new Worker instance
    ///
    /// # Arguments
    /// * `id` - Index of the worker within its pool
    /// * `algorithm` - The mining algorithm to use
    /// * `ctx` - State shared with the scheduler
    pub fn new(id: usize, algorithm: Arc<A>, ctx: WorkerContext) -> Self {
        Worker { id, algorithm, ctx }
    }

    /// Runs until the stop flag is set
    pub fn run(self) {
        let bucket = self.algorithm.algorithm_type().stats_bucket();
        let mut local: Option<(Arc<PublishedJob>, A::Prepared)> = None;
        let mut nonce: u64 = 0;
        let mut pending: u64 = 0;

        while !self.ctx.stop.load(Ordering::Relaxed) {
            let Some(published) = self.ctx.job_slot.load_full() else {
                local = None;
                self.idle(&mut pending);
                continue;
            };

            let stale = local
                .as_ref()
                .is_none_or(|(current, _)| current.version != published.version);
            if stale {
                self.ctx.observed[self.id].store(published.version, Ordering::SeqCst);
                match self.algorithm.prepare(&published.job) {
                    Some(prepared) => {
                        nonce = rand::random::<u64>();
                        local = Some((published, prepared));
                    }
                    None => {
                        local = None;
                        self.idle(&mut pending);
                        continue;
                    }
                }
            }

            let Some((current, prepared)) = local.as_ref() else {
                continue;
            };

            for _ in 0..BATCH_SIZE {
                let found = self.algorithm.try_nonce(&current.job, prepared, nonce);
                nonce = nonce.wrapping_add(1);
                pending += 1;

                if let Some(solution) = found {
                    self.emit(current.version, solution);
                }
                if pending >= bucket {
                    self.flush(&mut pending);
                }
            }
        }

        self.flush(&mut pending);
        log::debug!(target: self.ctx.log_target, "Worker {} exiting", self.id);
    }

    /// Sends a solution if its job is still the current one
    fn emit(&self, version: u64, solution: MiningSolution) {
        let current = self
            .ctx
            .job_slot
            .load()
            .as_ref()
            .map_or(0, |p| p.version);
        if current != version {
            log::debug!(
                target: self.ctx.log_target,
                "Worker {} dropped solution for superseded job {}",
                self.id,
                solution.job_id
            );
            return;
        }

        log::info!(
            target: self.ctx.log_target,
            "Worker {} found solution for job {} (nonce {})",
            self.id,
            solution.job_id,
            solution.nonce
        );
        if let Err(e) = self.ctx.solution_sender.send(solution) {
            log::warn!(target: self.ctx.log_target, "Solution channel closed: {}", e);
        }
    }

    fn flush(&self, pending: &mut u64) {
        if *pending > 0 {
            self.ctx.meter.lock().record(*pending);
            *pending = 0;
        }
    }

    fn idle(&self, pending: &mut u64) {
        self.flush(pending);
        std::thread::sleep(IDLE_POLL);
    }
}
