// src/cli/commands.rs
use crate::types::AlgorithmType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GXC Miner CLI - multi-algorithm proof-of-work miner and pool server
#[derive(Parser, Debug)]
#[command(name = "gxc-miner")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start solo mining against a node
    Start(StartOptions),

    /// Run the pool server
    Pool(PoolOptions),

    /// Run performance benchmarks for mining algorithms
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of worker threads to use (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Mining algorithm to use (overrides config)
    #[arg(short, long)]
    pub algorithm: Option<AlgorithmType>,

    /// Reward address (overrides config)
    #[arg(long)]
    pub address: Option<String>,
}

/// Options for running the pool server
#[derive(Parser, Debug)]
pub struct PoolOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Listen address (overrides config)
    #[arg(short, long)]
    pub listen: Option<String>,
}

/// Options for running mining benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Algorithm to benchmark
    #[arg(short, long)]
    pub algorithm: AlgorithmType,

    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// Difficulty of the synthetic job
    #[arg(long, default_value_t = 1000.0)]
    pub difficulty: f64,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Include pool server configuration section
    #[arg(short, long)]
    pub pool: bool,

    /// Include node configuration section
    #[arg(short, long)]
    pub node: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_overrides() {
        let cli = Commands::try_parse_from(["gxc-miner", "start", "-w", "2", "-a", "gxhash"]).unwrap();
        match cli.action {
            Action::Start(opts) => {
                assert_eq!(opts.workers, Some(2));
                assert_eq!(opts.algorithm, Some(AlgorithmType::GxHash));
                assert_eq!(opts.config, PathBuf::from("config.toml"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_parse_benchmark() {
        let cli = Commands::try_parse_from(["gxc-miner", "benchmark", "-a", "ethash", "-d", "5", "-t", "1"]).unwrap();
        match cli.action {
            Action::Benchmark(opts) => {
                assert_eq!(opts.algorithm, AlgorithmType::Ethash);
                assert_eq!(opts.duration, 5);
                assert_eq!(opts.threads, 1);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        assert!(Commands::try_parse_from(["gxc-miner", "benchmark", "-a", "scrypt"]).is_err());
    }
}
