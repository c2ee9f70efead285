// src/network/mod.rs
//! Network adapters
//!
//! - `NodeClient`: ledger backed by a node's JSON-RPC interface
//! - `PoolListener`: WebSocket transport for the pool server

/// Node RPC ledger adapter
///
/// Reads the chain tip, difficulty and pending transactions from a node and
/// submits candidate blocks to it.
pub mod node;

/// Pool WebSocket transport
///
/// Accepts miner connections and relays JSON-RPC messages to the pool
/// server.
pub mod pool;

pub use node::{NodeClient, NodeConfig};
pub use pool::PoolListener;
