// src/miner/target.rs
//! Difficulty-to-target mapping.
//!
//! Targets are expressed as a required count of leading zeros in a digest,
//! either hex characters (nibbles) or bits. This is a heuristic stand-in for
//! a numeric 256-bit target comparison; every check in the crate goes
//! through [`Target`] so the comparison can be swapped in one place.

use crate::miner::digest::Hash32;

/// Leading-zero requirement a digest must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// At least this many leading zero hex characters
    ZeroNibbles(u32),
    /// At least this many leading zero bits
    ZeroBits(u32),
}

impl Target {
    /// Engine A and pool shares: `difficulty / 1000 + 4` zero hex characters
    pub fn sha256(difficulty: f64) -> Self {
        Target::ZeroNibbles(required_zeros(difficulty, 1000.0, 4))
    }

    /// Engine B: `difficulty / 2000 + 3` zero bits
    pub fn ethash(difficulty: f64) -> Self {
        Target::ZeroBits(required_zeros(difficulty, 2000.0, 3))
    }

    /// Engine C: `difficulty / 800 + 5` zero bits, one bit easier when the
    /// traceability optimization is enabled
    pub fn gxhash(difficulty: f64, optimized: bool) -> Self {
        let bits = required_zeros(difficulty, 800.0, 5);
        Target::ZeroBits(if optimized { bits.saturating_sub(1) } else { bits })
    }

    /// True when `digest` has at least the required leading zeros
    pub fn is_met_by(&self, digest: &Hash32) -> bool {
        match *self {
            Target::ZeroNibbles(n) => leading_zero_nibbles(digest) >= n,
            Target::ZeroBits(n) => leading_zero_bits(digest) >= n,
        }
    }
}

/// Checks a hex digest against the Engine A / pool difficulty mapping
///
/// Pure function of its inputs, so repeated calls always agree.
pub fn check_difficulty_target(hash_hex: &str, difficulty: f64) -> bool {
    let zeros = hash_hex.chars().take_while(|c| *c == '0').count() as u32;
    !hash_hex.is_empty() && zeros >= required_zeros(difficulty, 1000.0, 4)
}

/// Count of leading zero hex characters of a digest
pub fn leading_zero_nibbles(digest: &Hash32) -> u32 {
    leading_zero_bits(digest) / 4
}

/// Count of leading zero bits of a digest
pub fn leading_zero_bits(digest: &Hash32) -> u32 {
    let mut bits = 0;
    for byte in digest {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// Compact textual form of a difficulty carried in block headers
pub fn bits_for(difficulty: f64) -> String {
    let scaled = if difficulty.is_finite() && difficulty > 0.0 {
        (difficulty * 1000.0).min(u32::MAX as f64) as u32
    } else {
        0
    };
    format!("{:08x}", scaled)
}

fn required_zeros(difficulty: f64, divisor: f64, base: u32) -> u32 {
    if !difficulty.is_finite() || difficulty <= 0.0 {
        return base;
    }
    let extra = (difficulty / divisor).floor().min(u32::MAX as f64) as u32;
    extra.saturating_add(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_with_prefix(prefix: &[u8]) -> Hash32 {
        let mut d = [0xffu8; 32];
        d[..prefix.len()].copy_from_slice(prefix);
        d
    }

    #[test]
    fn test_leading_zero_counts() {
        let d = digest_with_prefix(&[0x00, 0x00, 0x0f]);
        assert_eq!(leading_zero_bits(&d), 20);
        assert_eq!(leading_zero_nibbles(&d), 5);
        assert_eq!(leading_zero_bits(&[0u8; 32]), 256);
    }

    #[test]
    fn test_required_zeros_per_engine() {
        assert_eq!(Target::sha256(1.0), Target::ZeroNibbles(4));
        assert_eq!(Target::sha256(4000.0), Target::ZeroNibbles(8));
        assert_eq!(Target::ethash(4500.0), Target::ZeroBits(5));
        assert_eq!(Target::gxhash(1600.0, false), Target::ZeroBits(7));
        assert_eq!(Target::gxhash(1600.0, true), Target::ZeroBits(6));
        assert_eq!(Target::sha256(f64::NAN), Target::ZeroNibbles(4));
    }

    #[test]
    fn test_check_difficulty_target_is_deterministic() {
        let hash = "00000abc";
        let first = check_difficulty_target(hash, 1000.0);
        for _ in 0..10 {
            assert_eq!(check_difficulty_target(hash, 1000.0), first);
        }
        assert!(first);
        assert!(!check_difficulty_target(hash, 2000.0));
        assert!(!check_difficulty_target("", 0.0));
    }

    #[test]
    fn test_target_is_met_by_matches_hex_check() {
        let d = digest_with_prefix(&[0x00, 0x00, 0x01]);
        let hex = hex::encode(d);
        assert_eq!(Target::sha256(0.0).is_met_by(&d), check_difficulty_target(&hex, 0.0));
        assert_eq!(Target::sha256(1000.0).is_met_by(&d), check_difficulty_target(&hex, 1000.0));
    }

    #[test]
    fn test_bits_for_is_fixed_width() {
        assert_eq!(bits_for(1.0), "000003e8");
        assert_eq!(bits_for(-3.0), "00000000");
    }
}
