// src/stats/reporter.rs
use crate::miner::scheduler::Scheduler;
use crate::types::AlgorithmType;
use crate::utils::logging::STATS_TARGET;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sysinfo::{Components, System};

/// Snapshot of an engine's (or the manager's) mining statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiningStats {
    pub algorithm: AlgorithmType,
    /// Rolling hash rate (hashes per second)
    pub hash_rate: f64,
    /// Total number of hashes computed since the engine started
    pub total_hashes: u64,
    pub active_threads: usize,
    pub uptime_secs: u64,
    /// Nominal dataset size (Ethash only)
    pub dataset_size: Option<u64>,
    /// Dataset epoch (Ethash only)
    pub epoch: Option<u64>,
    /// Traceability cache misses (GXHash only)
    pub traceability_validations: Option<u64>,
    /// Blocks accepted by the ledger
    pub blocks_found: u64,
    /// Blocks rejected by the ledger or failed to submit
    pub blocks_rejected: u64,
    /// Difficulty of the current job
    pub difficulty: f64,
}

impl MiningStats {
    /// Zeroed statistics for `algorithm`
    pub fn empty(algorithm: AlgorithmType) -> Self {
        MiningStats {
            algorithm,
            hash_rate: 0.0,
            total_hashes: 0,
            active_threads: 0,
            uptime_secs: 0,
            dataset_size: None,
            epoch: None,
            traceability_validations: None,
            blocks_found: 0,
            blocks_rejected: 0,
            difficulty: 0.0,
        }
    }

    /// Engine-level statistics read from a worker pool
    pub fn from_scheduler(algorithm: AlgorithmType, scheduler: &Scheduler) -> Self {
        let (total_hashes, hash_rate, uptime) = scheduler.hash_counters();
        MiningStats {
            hash_rate,
            total_hashes,
            active_threads: scheduler.active_threads(),
            uptime_secs: uptime.as_secs(),
            difficulty: scheduler.current_job().map_or(0.0, |job| job.difficulty),
            ..MiningStats::empty(algorithm)
        }
    }
}

/// Statistics related to hardware performance
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently in use system-wide (in bytes)
    pub memory_used: u64,
    /// Memory available for new allocations (in bytes)
    pub memory_available: u64,
    /// Current CPU temperature in Celsius
    pub temperature: f32,
}

/// Bytes of memory currently available to new allocations
pub fn available_memory() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.available_memory()
}

/// Source of the statistics the reporter logs
pub type StatsSource = Arc<dyn Fn() -> MiningStats + Send + Sync>;

/// Periodically logs mining and hardware statistics
pub struct StatsReporter {
    source: StatsSource,
    /// Interval at which stats are reported
    report_interval: Duration,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Samples CPU, memory and temperature through `sysinfo`
struct HardwareSampler {
    system: System,
    components: Components,
}

impl HardwareSampler {
    fn new() -> Self {
        HardwareSampler {
            system: System::new_all(),
            components: Components::new_with_refreshed_list(),
        }
    }

    /// Refreshes system information and returns a snapshot
    fn sample(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.components.refresh(true);

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let temperature = self
            .components
            .iter()
            .find(|c| c.label().contains("CPU"))
            .and_then(|c| c.temperature())
            .unwrap_or(0.0);

        HardwareStats {
            cpu_usage,
            memory_used: self.system.used_memory(),
            memory_available: self.system.available_memory(),
            temperature,
        }
    }
}

impl StatsReporter {
    /// Creates a reporter polling `source` every `report_interval`
    ///
    /// # Arguments
    /// * `source` - Closure returning the current statistics
    /// * `report_interval` - How often to log statistics
    pub fn new(source: StatsSource, report_interval: Duration) -> Self {
        StatsReporter {
            source,
            report_interval,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Current statistics from the source
    pub fn get_stats(&self) -> MiningStats {
        (self.source)()
    }

    /// Current hardware statistics
    pub fn get_hardware_stats(&self) -> HardwareStats {
        HardwareSampler::new().sample()
    }

    /// Starts the periodic reporting of statistics
    ///
    /// This spawns a background thread that logs stats at the configured
    /// interval until [`stop`](Self::stop) is called.
    pub fn start_reporting(&mut self) {
        if self.handle.is_some() {
            return;
        }
        self.stop.store(false, Ordering::SeqCst);
        let source = self.source.clone();
        let stop = self.stop.clone();
        let interval = self.report_interval;

        let spawned = std::thread::Builder::new()
            .name("stats-reporter".to_string())
            .spawn(move || {
                let mut sampler = HardwareSampler::new();
                let mut last = Instant::now();
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(100));
                    if last.elapsed() < interval {
                        continue;
                    }
                    last = Instant::now();

                    let stats = source();
                    let hw = sampler.sample();
                    log::info!(
                        target: STATS_TARGET,
                        "{} | Hashrate: {:.2} H/s | Hashes: {} | Threads: {} | Blocks found/rejected: {}/{} | Difficulty: {:.4} | CPU: {:.1}% | Mem: {} MB used, {} MB free | Temp: {:.1}°C",
                        stats.algorithm,
                        stats.hash_rate,
                        stats.total_hashes,
                        stats.active_threads,
                        stats.blocks_found,
                        stats.blocks_rejected,
                        stats.difficulty,
                        hw.cpu_usage,
                        hw.memory_used / (1024 * 1024),
                        hw.memory_available / (1024 * 1024),
                        hw.temperature
                    );
                }
            });

        match spawned {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => log::error!(target: STATS_TARGET, "Failed to start stats reporter: {}", e),
        }
    }

    /// Stops the reporting thread and waits for it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!(target: STATS_TARGET, "Stats reporter panicked");
            }
        }
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_polls_source_and_stops() {
        let source: StatsSource = Arc::new(|| MiningStats {
            total_hashes: 42,
            ..MiningStats::empty(AlgorithmType::Sha256)
        });
        let mut reporter = StatsReporter::new(source, Duration::from_millis(150));
        reporter.start_reporting();
        assert_eq!(reporter.get_stats().total_hashes, 42);
        std::thread::sleep(Duration::from_millis(300));
        reporter.stop();
        assert!(reporter.handle.is_none());
    }

    #[test]
    fn test_available_memory_is_reported() {
        assert!(available_memory() > 0);
    }

    #[test]
    fn test_hardware_sample() {
        let reporter = StatsReporter::new(
            Arc::new(|| MiningStats::empty(AlgorithmType::Ethash)),
            Duration::from_secs(60),
        );
        let hw = reporter.get_hardware_stats();
        assert!(hw.memory_used + hw.memory_available > 0);
        assert!(hw.cpu_usage >= 0.0);
    }

    #[test]
    fn test_stats_from_idle_scheduler() {
        let scheduler = Scheduler::new("test");
        let stats = MiningStats::from_scheduler(AlgorithmType::GxHash, &scheduler);
        assert_eq!(stats.total_hashes, 0);
        assert_eq!(stats.active_threads, 0);
        assert_eq!(stats.traceability_validations, None);
    }
}
