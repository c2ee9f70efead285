// src/stratum/mod.rs
//! Pool server
//!
//! Miner registry, job window and share validation for remote miners. The
//! WebSocket transport in [`crate::network::pool`] turns protocol messages
//! into calls on [`StratumServer`].

/// Credential checks for `mining.authorize`
pub mod auth;

/// Share validation, job window and miner bookkeeping
pub mod server;

/// Miner, job and share records
pub mod types;

pub use auth::{Authenticator, OpenAuthenticator, StaticAuthenticator};
pub use server::{PoolSettings, StratumServer, share_hash};
pub use types::{PoolMessage, PoolStats, ShareResponse, StratumJob, StratumMiner, StratumShare};
