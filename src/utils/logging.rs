// src/utils/logging.rs
//! Logging configuration and utilities
//!
//! The library only ever talks to the `log` facade. Installing a backend is
//! the binary's job (or a test's), so components stay testable without any
//! process-wide logger. Each component logs under its own target, handed to
//! shared code such as the scheduler through its constructor.
//!
//! Uses `env_logger` under the hood with custom formatting and filtering.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Log target used by the SHA-256d engine
pub const SHA256_TARGET: &str = "gxc_miner::sha256";

/// Log target used by the Ethash engine and its dataset generator
pub const ETHASH_TARGET: &str = "gxc_miner::ethash";

/// Log target used by the GXHash engine
pub const GXHASH_TARGET: &str = "gxc_miner::gxhash";

/// Log target used by ledger adapters
pub const LEDGER_TARGET: &str = "gxc_miner::ledger";

/// Log target used by the statistics reporter
pub const STATS_TARGET: &str = "gxc_miner::stats";

/// Log target used by the mining manager
pub const MANAGER_TARGET: &str = "gxc_miner::manager";

/// Log target used by the pool server and its transport
pub const POOL_TARGET: &str = "gxc_miner::pool";

/// Initializes the logging subsystem for long-running commands
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info
/// - `RUST_LOG` overrides the default when set
pub fn init_logging() {
    let mut builder = common_log_config();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// Configures benchmark-specific logging
///
/// # Differences from Standard Logging
/// - Default log level: Debug (if RUST_LOG not set)
/// - Same custom formatting as standard logging
pub fn init_bench_logging() {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.parse_env("RUST_LOG");
    }

    builder.init();
}

/// Installs a capture-friendly logger for unit and integration tests
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_test_logging() {
    let _ = common_log_config()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Creates and configures a base logger builder with common settings
///
/// Format: `[<unix seconds> <level> <target>:<line>] <message>`
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let target = record.target();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                target,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
