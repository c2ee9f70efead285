// src/config/config.rs
use crate::{
    miner::{
        algorithm::{ethash::EthashConfig, gxhash::GxHashConfig},
        difficulty::DifficultyConfig,
        engine::EngineSettings,
        manager::{ManagerConfig, validate_address},
        reward::RewardConfig,
    },
    network::node::NodeConfig,
    stratum::{Authenticator, OpenAuthenticator, PoolSettings, StaticAuthenticator},
    types::AlgorithmType,
    utils::error::MinerError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the mining application
///
/// Contains all settings needed to run the solo miner or the pool:
/// algorithm selection, worker configuration, the node to mine against and
/// per-component sections. Every field has a default, so an empty file is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mining algorithm to use ("sha256", "ethash" or "gxhash")
    pub algorithm: AlgorithmType,

    /// Address receiving solo-mining rewards
    pub miner_address: String,

    /// Number of worker threads to use for mining
    /// (0 = number of CPU cores)
    pub worker_threads: usize,

    /// Seconds between statistics log lines
    pub stats_interval_secs: u64,

    /// Node the miner builds templates from and submits blocks to
    pub node: NodeConfig,

    pub difficulty: DifficultyConfig,
    pub reward: RewardConfig,
    pub ethash: EthashConfig,
    pub gxhash: GxHashConfig,

    /// Pool server settings
    pub pool: PoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            algorithm: AlgorithmType::Sha256,
            miner_address: String::new(),
            worker_threads: 0,
            stats_interval_secs: 60,
            node: NodeConfig::default(),
            difficulty: DifficultyConfig::default(),
            reward: RewardConfig::default(),
            ethash: EthashConfig::default(),
            gxhash: GxHashConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

/// `[pool]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Socket address of the WebSocket listener
    pub listen_addr: String,
    /// Share difficulty, capped at each job's network difficulty
    pub pool_difficulty: f64,
    pub job_interval_secs: u64,
    pub inactivity_timeout_secs: u64,
    pub job_window: usize,
    pub max_transactions: usize,
    /// Address receiving the coinbase of pool blocks
    pub pool_address: String,
    /// Accept any username when no credentials are configured
    pub open_access: bool,
    /// Username to password table
    pub credentials: HashMap<String, String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            listen_addr: "0.0.0.0:3333".to_string(),
            pool_difficulty: 1.0,
            job_interval_secs: 30,
            inactivity_timeout_secs: 300,
            job_window: 10,
            max_transactions: 100,
            pool_address: String::new(),
            open_access: false,
            credentials: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&config_str)
    }

    /// Parses TOML text
    pub fn parse(text: &str) -> Result<Self, MinerError> {
        toml::from_str(text)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Worker threads after resolving 0 to the CPU count
    pub fn effective_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }

    /// Checks values that parse but cannot work
    pub fn validate(&self) -> Result<(), MinerError> {
        let url = Url::parse(&self.node.rpc_url)
            .map_err(|e| MinerError::ConfigError(format!("Invalid node URL '{}': {}", self.node.rpc_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MinerError::ConfigError(format!(
                "Node URL '{}' must use http or https",
                self.node.rpc_url
            )));
        }

        if !self.miner_address.is_empty() {
            validate_address(&self.miner_address)?;
        }
        if !self.pool.pool_address.is_empty() {
            validate_address(&self.pool.pool_address)?;
        }

        self.pool.listen_addr.parse::<SocketAddr>().map_err(|e| {
            MinerError::ConfigError(format!("Invalid pool listen address '{}': {}", self.pool.listen_addr, e))
        })?;
        if !(self.pool.pool_difficulty.is_finite() && self.pool.pool_difficulty >= 0.0) {
            return Err(MinerError::ConfigError("Pool difficulty must be non-negative".into()));
        }
        if self.pool.job_window == 0 {
            return Err(MinerError::ConfigError("Pool job window must be at least 1".into()));
        }

        let d = &self.difficulty;
        if d.min_ratio <= 0.0 || d.min_ratio > d.max_ratio {
            return Err(MinerError::ConfigError(format!(
                "Difficulty ratios must satisfy 0 < min ({}) <= max ({})",
                d.min_ratio, d.max_ratio
            )));
        }
        if d.target_block_time_secs == 0 {
            return Err(MinerError::ConfigError("Target block time must be positive".into()));
        }
        Ok(())
    }

    /// Settings for the mining manager
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            algorithm: self.algorithm,
            worker_threads: self.effective_threads(),
            stats_interval: Duration::from_secs(self.stats_interval_secs.max(1)),
            difficulty: self.difficulty.clone(),
            reward: self.reward.clone(),
            engines: EngineSettings {
                ethash: self.ethash.clone(),
                gxhash: self.gxhash.clone(),
            },
            ..ManagerConfig::default()
        }
    }

    /// Settings for the pool server
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            pool_difficulty: self.pool.pool_difficulty,
            job_interval: Duration::from_secs(self.pool.job_interval_secs.max(1)),
            inactivity_timeout: Duration::from_secs(self.pool.inactivity_timeout_secs),
            job_window: self.pool.job_window,
            max_transactions: self.pool.max_transactions,
            pool_address: self.pool.pool_address.clone(),
            reward: self.reward.clone(),
            ..PoolSettings::default()
        }
    }

    /// Credential verifier for the pool
    ///
    /// # Errors
    /// Returns `ConfigError` when no credentials are configured and open
    /// access is not enabled
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>, MinerError> {
        if !self.pool.credentials.is_empty() {
            return Ok(Arc::new(StaticAuthenticator::new(self.pool.credentials.clone())));
        }
        if self.pool.open_access {
            log::warn!("Pool accepts any username (open_access = true)");
            return Ok(Arc::new(OpenAuthenticator));
        }
        Err(MinerError::ConfigError(
            "Pool has no [pool.credentials] and open_access is false".into(),
        ))
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `pool` - Include the pool server section
    /// * `node` - Include the node section
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(pool: bool, node: bool) -> String {
        let mut template = String::new();
        template.push_str("# GXC Miner Configuration\n\n");
        template.push_str("# Supported algorithms: sha256, ethash, gxhash\n");
        template.push_str("algorithm = \"sha256\"\n");
        template.push_str("# Reward address (GXC... mainnet, tGXC... testnet)\n");
        template.push_str("miner_address = \"GXCyouraddress\"\n");
        template.push_str("# Number of worker threads (0 = auto-detect)\n");
        template.push_str("worker_threads = 0\n");
        template.push_str("stats_interval_secs = 60\n\n");

        if node {
            template.push_str("# Node the miner reads templates from\n");
            template.push_str("[node]\n");
            template.push_str("rpc_url = \"http://127.0.0.1:8332\"\n");
            template.push_str("rpc_user = \"\"\n");
            template.push_str("rpc_password = \"\"\n");
            template.push_str("timeout_secs = 10\n\n");
        }

        template.push_str("[difficulty]\n");
        template.push_str("initial_difficulty = 1000.0\n");
        template.push_str("target_block_time_secs = 600\n");
        template.push_str("adjustment_interval_secs = 60\n\n");

        template.push_str("[ethash]\n");
        template.push_str("# Bytes of lookup cache materialized per epoch\n");
        template.push_str("cache_bytes = 1048576\n\n");

        template.push_str("[gxhash]\n");
        template.push_str("traceability_optimized = true\n\n");

        if pool {
            template.push_str("# Pool server\n");
            template.push_str("[pool]\n");
            template.push_str("listen_addr = \"0.0.0.0:3333\"\n");
            template.push_str("pool_difficulty = 1.0\n");
            template.push_str("job_interval_secs = 30\n");
            template.push_str("inactivity_timeout_secs = 300\n");
            template.push_str("job_window = 10\n");
            template.push_str("pool_address = \"GXCpooladdress\"\n");
            template.push_str("open_access = false\n\n");
            template.push_str("[pool.credentials]\n");
            template.push_str("worker01 = \"x\"\n");
        }

        template
    }
}
