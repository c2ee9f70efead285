// src/miner/digest.rs
//! Hash primitives shared by the engines, the manager and the pool server.
//!
//! All digests are 32 bytes. Hex helpers produce lowercase text, which is
//! the form the leading-zero target checks and the ledger operate on.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// A 32-byte digest
pub type Hash32 = [u8; 32];

/// Single SHA-256
pub fn sha256(data: &[u8]) -> Hash32 {
    Sha256::digest(data).into()
}

/// Bitcoin-style double SHA-256
pub fn sha256d(data: &[u8]) -> Hash32 {
    sha256(&sha256(data))
}

/// Keccak-256 (the pre-standard SHA-3 padding used by Ethash)
pub fn keccak256(data: &[u8]) -> Hash32 {
    Keccak256::digest(data).into()
}

/// SHA-256 of text, hex encoded
pub fn sha256_hex(data: &str) -> String {
    hex::encode(sha256(data.as_bytes()))
}

/// Double SHA-256 of text, hex encoded
pub fn sha256d_hex(data: &str) -> String {
    hex::encode(sha256d(data.as_bytes()))
}
