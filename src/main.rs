// src/main.rs
use clap::Parser;
use gxc_miner_rs::ledger::Ledger;
use gxc_miner_rs::miner::EngineSettings;
use gxc_miner_rs::miner::job::{JobTransaction, MiningJob};
use gxc_miner_rs::utils::logging::init_bench_logging;
use gxc_miner_rs::utils::unix_time;
use gxc_miner_rs::{self, *};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Main entry point for GXC miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Pool(opts) => run_pool(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Solo-mines against the configured node until Ctrl-C
///
/// # Arguments
/// * `opts` - Command line options for mining operation
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads and validates configuration
/// 3. Connects to the node ledger
/// 4. Starts the mining manager
/// 5. Waits for Ctrl-C, then stops and joins everything
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::load(&opts.config)?;
    // Apply CLI overrides
    if let Some(workers) = opts.workers {
        config.worker_threads = workers;
    }
    if let Some(algo) = opts.algorithm {
        config.algorithm = algo;
    }
    if let Some(address) = opts.address {
        config.miner_address = address;
    }

    let ledger: Arc<dyn Ledger> = Arc::new(NodeClient::new(config.node.clone())?);
    let mut manager = MiningManager::new(config.manager_config(), ledger.clone());
    manager.start(&config.miner_address)?;
    log::info!("{}", manager.optimization_info());

    let rt = Runtime::new()?;
    let signal = rt.block_on(tokio::signal::ctrl_c());
    drop(rt);

    log::info!("Shutting down");
    manager.stop();
    let stats = manager.get_stats();
    log::info!(
        "Blocks found: {}, rejected: {}, total hashes: {}",
        stats.blocks_found,
        stats.blocks_rejected,
        stats.total_hashes
    );
    signal.map_err(MinerError::from)
}

/// Runs the pool server until Ctrl-C
///
/// # Arguments
/// * `opts` - Command line options for the pool
fn run_pool(opts: cli::PoolOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::load(&opts.config)?;
    if let Some(listen) = opts.listen {
        config.pool.listen_addr = listen;
    }
    if config.pool.pool_address.is_empty() {
        return Err(MinerError::ConfigError("pool.pool_address is required".into()));
    }

    let ledger: Arc<dyn Ledger> = Arc::new(NodeClient::new(config.node.clone())?);
    let server = Arc::new(StratumServer::new(
        config.pool_settings(),
        ledger.clone(),
        config.authenticator()?,
    ));
    server.start()?;

    let listener = PoolListener::new(server.clone(), config.pool.listen_addr.clone());
    let rt = Runtime::new()?;
    let result = rt.block_on(listener.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
        }
    }));
    // connection tasks release their server handles here, inside no runtime
    drop(rt);

    server.stop();
    let stats = server.stats();
    log::info!(
        "Pool stopped: {} shares accepted, {} rejected, {} blocks",
        stats.shares_accepted,
        stats.shares_rejected,
        stats.blocks_found
    );
    result
}

/// Runs mining algorithm benchmarks
///
/// # Arguments
/// * `opts` - Benchmark configuration options
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Creates the engine and a synthetic job
/// 3. Mines for the requested duration
/// 4. Reports performance statistics
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let mut engine = MiningEngine::new(opts.algorithm, opts.threads.max(1), &EngineSettings::default());
    if !engine.is_mining_capable() {
        return Err(MinerError::CapabilityError(format!(
            "{} engine cannot run on this host",
            opts.algorithm
        )));
    }
    let (sender, receiver) = crossbeam_channel::unbounded();
    engine.set_solution_sender(sender);

    let now = unix_time();
    let coinbase = JobTransaction::coinbase("GXCbenchmark", 0.0, 1, now);
    engine.set_job(MiningJob::new(
        "bench",
        "0".repeat(64),
        1,
        opts.difficulty,
        now,
        vec![coinbase],
    ));

    log::info!(
        "Starting {} benchmark for {} seconds on {} threads",
        opts.algorithm,
        opts.duration,
        opts.threads
    );
    log::info!("{}", engine.optimization_info());

    engine.start()?;
    let started = Instant::now();
    while started.elapsed() < Duration::from_secs(opts.duration) {
        std::thread::sleep(Duration::from_secs(1));
        let stats = engine.stats();
        log::debug!("{:.1} H/s, {} hashes", stats.hash_rate, stats.total_hashes);
    }
    engine.stop();

    // Report final results
    let stats = engine.stats();
    let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", stats.total_hashes);
    log::info!("Average hashrate: {:.2} H/s", stats.total_hashes as f64 / elapsed);
    log::info!("Solutions found: {}", receiver.len());
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
///
/// # Arguments
/// * `opts` - Configuration generation options
///
/// # Operations
/// 1. Generates template content based on options
/// 2. Writes template to specified output file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template(opts.pool, opts.node);
    std::fs::write(opts.output, config)?;
    Ok(())
}
