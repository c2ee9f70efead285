// src/miner/merkle.rs
//! Merkle root and branch computation over transaction hashes.
//!
//! Nodes are hex text; a parent is `sha256d(left ‖ right)` over the hex
//! strings, and an odd node at any level is paired with itself. The branch
//! returned by [`merkle_branches`] is the path for the first leaf (the
//! coinbase), which is what pool jobs hand out.

use crate::miner::digest::sha256d_hex;

/// Root used for an empty transaction set
pub const EMPTY_MERKLE_ROOT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Computes the merkle root of `leaves`
pub fn merkle_root<S: AsRef<str>>(leaves: &[S]) -> String {
    if leaves.is_empty() {
        return EMPTY_MERKLE_ROOT.to_string();
    }
    let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_string()).collect();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.swap_remove(0)
}

/// Sibling hashes on the path from the first leaf to the root
pub fn merkle_branches<S: AsRef<str>>(leaves: &[S]) -> Vec<String> {
    let mut branches = Vec::new();
    let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_string()).collect();
    while let [_, sibling, ..] = level.as_slice() {
        branches.push(sibling.clone());
        level = next_level(&level);
    }
    branches
}

/// Rebuilds the root from the first leaf and its branch
pub fn root_from_branches(first_leaf: &str, branches: &[String]) -> String {
    branches
        .iter()
        .fold(first_leaf.to_string(), |acc, sibling| {
            sha256d_hex(&format!("{}{}", acc, sibling))
        })
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            sha256d_hex(&format!("{}{}", left, right))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single_leaf() {
        let none: [&str; 0] = [];
        assert_eq!(merkle_root(&none), EMPTY_MERKLE_ROOT);
        assert_eq!(merkle_root(&["aa"]), "aa");
        assert!(merkle_branches(&["aa"]).is_empty());
    }

    #[test]
    fn test_odd_leaf_is_paired_with_itself() {
        let ab = sha256d_hex("ab");
        let cc = sha256d_hex("cc");
        let expected = sha256d_hex(&format!("{}{}", ab, cc));
        assert_eq!(merkle_root(&["a", "b", "c"]), expected);
    }

    #[test]
    fn test_branches_rebuild_the_root() {
        let leaves: Vec<String> = (0..7).map(|i| format!("tx{}", i)).collect();
        let branches = merkle_branches(&leaves);
        assert_eq!(branches.len(), 3);
        assert_eq!(root_from_branches(&leaves[0], &branches), merkle_root(&leaves));
    }

    #[test]
    fn test_branch_path_for_first_leaf() {
        let none: [&str; 0] = [];
        assert!(merkle_branches(&none).is_empty());
        assert_eq!(merkle_branches(&["a", "b"]), vec!["b".to_string()]);
        let cc = sha256d_hex("cc");
        assert_eq!(merkle_branches(&["a", "b", "c"]), vec!["b".to_string(), cc]);
    }
}
