// src/miner/scheduler.rs
//! Mining job scheduler implementation
//!
//! Publishes jobs to workers by replacement, owns the worker threads of one
//! engine and merges their hash counts. A published job carries a version;
//! workers compare versions to notice supersession and only emit solutions
//! for the version that is still current.

use crate::miner::algorithm::Algorithm;
use crate::miner::job::{MiningJob, MiningSolution};
use crate::miner::worker::{Worker, WorkerContext};
use crate::utils::error::MinerError;
use arc_swap::ArcSwapOption;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Window over which the rolling hash rate is computed
const RATE_WINDOW: Duration = Duration::from_secs(10);

/// A job as seen by the workers
#[derive(Debug)]
pub struct PublishedJob {
    /// Monotonic publication counter, starting at 1
    pub version: u64,
    pub job: Arc<MiningJob>,
}

/// Shared hash counters, merged by workers in buckets
#[derive(Debug)]
pub struct HashMeter {
    started: Instant,
    total: u64,
    samples: VecDeque<(Instant, u64)>,
}

impl Default for HashMeter {
    fn default() -> Self {
        HashMeter {
            started: Instant::now(),
            total: 0,
            samples: VecDeque::new(),
        }
    }
}

impl HashMeter {
    /// Adds `hashes` computed since the worker's last merge
    pub fn record(&mut self, hashes: u64) {
        let now = Instant::now();
        self.total += hashes;
        self.samples.push_back((now, hashes));
        while let Some((at, _)) = self.samples.front() {
            if now.duration_since(*at) > RATE_WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Hashes per second over the recent window
    pub fn hash_rate(&self) -> f64 {
        let span = self.started.elapsed().min(RATE_WINDOW).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        let now = Instant::now();
        let recent: u64 = self
            .samples
            .iter()
            .filter(|(at, _)| now.duration_since(*at) <= RATE_WINDOW)
            .map(|(_, n)| n)
            .sum();
        recent as f64 / span
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// State of one running worker pool
struct Run {
    stop: Arc<AtomicBool>,
    observed: Arc<Vec<AtomicU64>>,
    handles: Vec<JoinHandle<()>>,
}

/// Coordinates the current job across worker threads
pub struct Scheduler {
    /// Current job (atomically swappable)
    current_job: Arc<ArcSwapOption<PublishedJob>>,
    /// Last version handed out
    version: AtomicU64,
    /// Shared hash counters
    meter: Arc<Mutex<HashMeter>>,
    /// Running workers, if any
    run: Mutex<Option<Run>>,
    /// Log target of the owning engine
    log_target: &'static str,
}

impl Scheduler {
    /// Creates an idle scheduler
    ///
    /// # Arguments
    /// * `log_target` - Log target used by the scheduler and its workers
    pub fn new(log_target: &'static str) -> Self {
        Scheduler {
            current_job: Arc::new(ArcSwapOption::empty()),
            version: AtomicU64::new(0),
            meter: Arc::new(Mutex::new(HashMeter::default())),
            run: Mutex::new(None),
            log_target,
        }
    }

    /// Replaces the current job
    ///
    /// # Returns
    /// The version assigned to the new job
    pub fn publish(&self, job: MiningJob) -> u64 {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.current_job.store(Some(Arc::new(PublishedJob {
            version,
            job: Arc::new(job),
        })));
        log::debug!(target: self.log_target, "Published job version {}", version);
        version
    }

    /// The job workers are currently given
    pub fn current_job(&self) -> Option<Arc<MiningJob>> {
        self.current_job.load_full().map(|p| p.job.clone())
    }

    /// Version of the current job, 0 when none was published
    pub fn current_version(&self) -> u64 {
        self.current_job.load().as_ref().map_or(0, |p| p.version)
    }

    /// Spawns `workers` threads mining with `algorithm`
    ///
    /// # Arguments
    /// * `algorithm` - The mining algorithm to use
    /// * `workers` - Number of worker threads to spawn
    /// * `solution_sender` - Channel receiving found solutions
    pub fn start<A: Algorithm>(
        &self,
        algorithm: Arc<A>,
        workers: usize,
        solution_sender: Sender<MiningSolution>,
    ) -> Result<(), MinerError> {
        let mut run = self.run.lock();
        if run.is_some() {
            return Err(MinerError::ThreadError(
                "Workers are already running".to_string(),
            ));
        }

        *self.meter.lock() = HashMeter::default();
        let workers = workers.max(1);
        let stop = Arc::new(AtomicBool::new(false));
        let observed: Arc<Vec<AtomicU64>> =
            Arc::new((0..workers).map(|_| AtomicU64::new(0)).collect());
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let worker = Worker::new(
                id,
                algorithm.clone(),
                WorkerContext {
                    job_slot: self.current_job.clone(),
                    stop: stop.clone(),
                    observed: observed.clone(),
                    meter: self.meter.clone(),
                    solution_sender: solution_sender.clone(),
                    log_target: self.log_target,
                },
            );
            let spawned = std::thread::Builder::new()
                .name(format!("{}-worker-{}", algorithm.algorithm_type(), id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.store(true, Ordering::SeqCst);
                    for handle in handles {
                        if handle.join().is_err() {
                            log::error!(target: self.log_target, "Worker thread panicked");
                        }
                    }
                    return Err(MinerError::ThreadError(format!(
                        "Failed to spawn worker {}: {}",
                        id, e
                    )));
                }
            }
        }

        log::info!(
            target: self.log_target,
            "Started {} {} workers",
            workers,
            algorithm.algorithm_type()
        );
        *run = Some(Run {
            stop,
            observed,
            handles,
        });
        Ok(())
    }

    /// Stops all workers and waits for them to exit
    pub fn stop(&self) {
        let Some(run) = self.run.lock().take() else {
            return;
        };
        run.stop.store(true, Ordering::SeqCst);
        for handle in run.handles {
            if handle.join().is_err() {
                log::error!(target: self.log_target, "A worker thread panicked");
            }
        }
        log::info!(target: self.log_target, "Workers stopped");
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().is_some()
    }

    /// Number of running worker threads
    pub fn active_threads(&self) -> usize {
        self.run.lock().as_ref().map_or(0, |r| r.handles.len())
    }

    /// True once every running worker has picked up `version` or a later one
    pub fn workers_observed(&self, version: u64) -> bool {
        match self.run.lock().as_ref() {
            Some(run) => run
                .observed
                .iter()
                .all(|v| v.load(Ordering::SeqCst) >= version),
            None => false,
        }
    }

    /// Total hashes, rolling hash rate and uptime
    pub fn hash_counters(&self) -> (u64, f64, Duration) {
        let meter = self.meter.lock();
        (meter.total(), meter.hash_rate(), meter.uptime())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_assigns_increasing_versions() {
        let scheduler = Scheduler::new("test");
        assert_eq!(scheduler.current_version(), 0);
        assert!(scheduler.current_job().is_none());

        let job = MiningJob::new("a", "0".repeat(64), 1, 1.0, 0, Vec::new());
        assert_eq!(scheduler.publish(job.clone()), 1);
        assert_eq!(scheduler.publish(job), 2);
        assert_eq!(scheduler.current_version(), 2);
    }

    #[test]
    fn test_meter_accumulates() {
        let mut meter = HashMeter::default();
        meter.record(500);
        meter.record(500);
        assert_eq!(meter.total(), 1000);
        assert!(meter.hash_rate() >= 0.0);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let scheduler = Scheduler::new("test");
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.workers_observed(1));
    }
}
