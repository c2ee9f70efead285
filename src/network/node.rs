// src/network/node.rs
use crate::ledger::Ledger;
use crate::miner::job::{Block, JobTransaction, SolutionProof};
use crate::types::AlgorithmType;
use crate::utils::error::MinerError;
use crate::utils::logging::LEDGER_TARGET;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Configuration for connecting to a node's RPC interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// URL of the node's RPC endpoint (e.g., "http://127.0.0.1:8332")
    pub rpc_url: String,
    /// Username for RPC authentication (if required)
    pub rpc_user: String,
    /// Password for RPC authentication (if required)
    pub rpc_password: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            rpc_url: "http://127.0.0.1:8332".to_string(),
            rpc_user: String::new(),
            rpc_password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Block as described by the node's `getblock` call
#[derive(Debug, Deserialize)]
struct NodeBlock {
    hash: String,
    height: u64,
    #[serde(default)]
    merkleroot: String,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    bits: String,
    #[serde(default)]
    difficulty: f64,
    #[serde(default)]
    previousblockhash: String,
}

impl From<NodeBlock> for Block {
    fn from(b: NodeBlock) -> Self {
        Block {
            height: b.height,
            previous_hash: b.previousblockhash,
            merkle_root: b.merkleroot,
            timestamp: b.time,
            bits: b.bits,
            difficulty: b.difficulty,
            nonce: b.nonce,
            extra_nonce: String::new(),
            algorithm: AlgorithmType::Sha256,
            miner_address: String::new(),
            transactions: Vec::new(),
            pow_hash: String::new(),
            proof: SolutionProof::None,
            reported_hash: Some(b.hash),
        }
    }
}

/// JSON-RPC client for a node, used as the miner's ledger
///
/// Calls block the current thread; async callers must go through
/// `spawn_blocking`.
pub struct NodeClient {
    /// Configuration for the node connection
    config: NodeConfig,
    /// HTTP client for making RPC requests
    client: Client,
    /// Request id counter
    next_id: AtomicU64,
}

impl NodeClient {
    /// Creates a new NodeClient with the given configuration
    ///
    /// # Arguments
    /// * `config` - Node configuration containing RPC connection details
    pub fn new(config: NodeConfig) -> Result<Self, MinerError> {
        url::Url::parse(&config.rpc_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(NodeClient {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Makes an RPC call to the node
    ///
    /// # Arguments
    /// * `method` - The RPC method to call
    /// * `params` - Positional parameters for the call
    ///
    /// # Returns
    /// * `Ok(Value)` - The `result` member of the response (may be null)
    /// * `Err(MinerError)` - Transport failure or an RPC error object
    fn rpc_call(&self, method: &str, params: Value) -> Result<Value, MinerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = self.client.post(&self.config.rpc_url).json(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }));
        if !self.config.rpc_user.is_empty() {
            request = request.basic_auth(&self.config.rpc_user, Some(&self.config.rpc_password));
        }

        let mut response: Value = request.send()?.json()?;
        match response.get("error") {
            Some(error) if !error.is_null() => Err(MinerError::LedgerError(format!(
                "{} failed: {}",
                method, error
            ))),
            _ => Ok(response
                .get_mut("result")
                .map(Value::take)
                .unwrap_or(Value::Null)),
        }
    }

    fn get_best_block_hash(&self) -> Result<String, MinerError> {
        self.rpc_call("getbestblockhash", json!([]))?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MinerError::ProtocolError("getbestblockhash returned no hash".to_string()))
    }
}

impl Ledger for NodeClient {
    fn get_latest_block(&self) -> Result<Block, MinerError> {
        let hash = self.get_best_block_hash()?;
        let block: NodeBlock = serde_json::from_value(self.rpc_call("getblock", json!([hash, true]))?)?;
        Ok(block.into())
    }

    fn get_height(&self) -> Result<u64, MinerError> {
        self.rpc_call("getblockcount", json!([]))?
            .as_u64()
            .ok_or_else(|| MinerError::ProtocolError("getblockcount returned no height".to_string()))
    }

    fn get_difficulty(&self) -> Result<f64, MinerError> {
        self.rpc_call("getdifficulty", json!([]))?
            .as_f64()
            .ok_or_else(|| MinerError::ProtocolError("getdifficulty returned no number".to_string()))
    }

    fn get_pending_transactions(&self, limit: usize) -> Result<Vec<JobTransaction>, MinerError> {
        let mut template = self.rpc_call("getblocktemplate", json!([]))?;
        let transactions = template
            .get_mut("transactions")
            .map(Value::take)
            .unwrap_or_else(|| json!([]));
        let mut transactions: Vec<JobTransaction> = serde_json::from_value(transactions)?;
        transactions.truncate(limit);
        Ok(transactions)
    }

    fn add_block(&self, block: &Block) -> Result<bool, MinerError> {
        let payload = hex::encode(serde_json::to_vec(block)?);
        match self.rpc_call("submitblock", json!([payload])) {
            Ok(Value::Null) => Ok(true),
            Ok(reason) => {
                log::warn!(target: LEDGER_TARGET, "Node rejected block {}: {}", block.height, reason);
                Ok(false)
            }
            Err(MinerError::LedgerError(reason)) => {
                log::warn!(target: LEDGER_TARGET, "Node rejected block {}: {}", block.height, reason);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_rpc_url() {
        let config = NodeConfig {
            rpc_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(NodeClient::new(config), Err(MinerError::UrlError(_))));
    }

    #[test]
    fn test_node_block_keeps_reported_hash() {
        let block: NodeBlock = serde_json::from_value(json!({
            "hash": "ab".repeat(32),
            "height": 12,
            "merkleroot": "cd".repeat(32),
            "time": 1_750_000_000,
            "bits": "1d00ffff",
            "previousblockhash": "ef".repeat(32)
        }))
        .unwrap();
        let block: Block = block.into();
        assert_eq!(block.height, 12);
        assert_eq!(block.hash(), "ab".repeat(32));
    }

    #[test]
    fn test_unreachable_node_is_an_error() {
        let client = NodeClient::new(NodeConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();
        assert!(client.get_height().is_err());
    }
}
