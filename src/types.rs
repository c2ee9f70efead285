// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported proof-of-work algorithms
///
/// The set is closed: the manager selects one of these tags and builds the
/// matching engine. Each variant has different hardware requirements and a
/// different difficulty-to-target mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    /// Double SHA-256 over the block header (fast, CPU friendly)
    #[clap(name = "sha256")]
    Sha256,

    /// Memory-hard, epoch-keyed dataset algorithm
    ///
    /// Requires enough free memory to hold the dataset before it can start.
    #[clap(name = "ethash")]
    Ethash,

    /// Traceability-aware multi-round hash
    ///
    /// Only produces valid proofs for blocks whose transactions satisfy the
    /// chain-of-custody formula.
    #[clap(name = "gxhash")]
    GxHash,
}

impl AlgorithmType {
    /// Number of hashes a worker accumulates before merging its counters
    /// into the shared statistics. Fast engines use bigger buckets.
    pub fn stats_bucket(self) -> u64 {
        match self {
            AlgorithmType::Sha256 => 1000,
            AlgorithmType::Ethash | AlgorithmType::GxHash => 500,
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmType::Sha256 => write!(f, "sha256"),
            AlgorithmType::Ethash => write!(f, "ethash"),
            AlgorithmType::GxHash => write!(f, "gxhash"),
        }
    }
}

impl FromStr for AlgorithmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha256d" => Ok(AlgorithmType::Sha256),
            "ethash" => Ok(AlgorithmType::Ethash),
            "gxhash" | "gxc" => Ok(AlgorithmType::GxHash),
            _ => Err(format!("Unknown algorithm: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip_names() {
        assert_eq!("SHA256".parse::<AlgorithmType>(), Ok(AlgorithmType::Sha256));
        assert_eq!("gxc".parse::<AlgorithmType>(), Ok(AlgorithmType::GxHash));
        assert_eq!(AlgorithmType::Ethash.to_string(), "ethash");
        assert!("randomx".parse::<AlgorithmType>().is_err());
    }

    #[test]
    fn test_stats_bucket_is_larger_for_fast_engine() {
        assert!(AlgorithmType::Sha256.stats_bucket() > AlgorithmType::GxHash.stats_bucket());
    }
}
