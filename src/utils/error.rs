// src/utils/error.rs
use crate::miner::job::MiningSolution;
use serde_json;
use std::io;
use thiserror::Error;
use tokio_tungstenite::tungstenite;
use url;

/// Main error type for the mining application
///
/// This enum represents every failure that can leave a component: start-up
/// and capability failures, ledger and network errors, protocol and
/// configuration problems. Expected misses (a nonce that does not meet the
/// target) and share rejections are not errors and never use this type.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Errors related to mining algorithms (e.g., unsupported algorithm)
    #[error("Algorithm error: {0}")]
    AlgorithmError(String),

    /// The host cannot run the selected engine (e.g., not enough memory)
    #[error("Capability error: {0}")]
    CapabilityError(String),

    /// Dataset generation for the memory-hard engine failed
    #[error("Dataset error: {0}")]
    DatasetError(String),

    /// The ledger collaborator failed or returned unusable data
    #[error("Ledger error: {0}")]
    LedgerError(String),

    /// Errors related to network connectivity
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// Errors in protocol handling or invalid protocol messages
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// WebSocket communication errors
    #[error("WebSocket error: {0}")]
    WsError(#[from] tungstenite::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Worker or loop thread could not be spawned
    #[error("Thread error: {0}")]
    ThreadError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts crossbeam channel send errors for solutions into MinerError
///
/// Raised when the consumer side of the solution queue has gone away.
impl From<crossbeam_channel::SendError<MiningSolution>> for MinerError {
    fn from(e: crossbeam_channel::SendError<MiningSolution>) -> Self {
        MinerError::ChannelError(format!("Solution send failed: {}", e))
    }
}

/// Converts hex decoding errors into MinerError
///
/// Used when invalid hex data is encountered in job fields, share nonces
/// or node responses.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InputError(format!("Hex conversion failed: {}", e))
    }
}

/// Converts TOML parse errors into MinerError
impl From<toml::de::Error> for MinerError {
    fn from(e: toml::de::Error) -> Self {
        MinerError::ConfigError(format!("Invalid config format: {}", e))
    }
}

/// Converts async task join errors into MinerError
///
/// Used when a blocking task spawned from the pool transport fails.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}
