// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merkle accounting for sectors and storage obligations.
//!
//! Two distinct trees are in play: a sector's own content address is the
//! root of a tree over small fixed-size segments of that sector, while a
//! contract's `file_merkle_root` is the root of a tree over the ordered list
//! of sector roots it currently covers.

use host_types::SectorRoot;

/// Leaf width for the segment tree inside one sector. Matches the
/// reference network's proof granularity.
pub const SEGMENT_SIZE: usize = 64;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

fn leaf_hash(segment: &[u8]) -> [u8; 32] {
    let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
    hasher.update(&[LEAF_PREFIX]);
    hasher.update(segment);
    hasher.finalize().as_bytes()[..32].try_into().unwrap()
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
    hasher.update(&[NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().as_bytes()[..32].try_into().unwrap()
}

/// Roots a list of 32-byte leaves, padding with copies of the final leaf up
/// to the next power of two so every internal node always has two children.
fn root_of_leaves(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return leaf_hash(&[]);
    }
    let target = leaves.len().next_power_of_two();
    if let Some(&last) = leaves.last() {
        leaves.resize(target, last);
    }
    while leaves.len() > 1 {
        leaves = leaves
            .chunks(2)
            .map(|pair| node_hash(&pair[0], &pair[1]))
            .collect();
    }
    leaves[0]
}

/// Content address of a sector: the root of the segment tree over its
/// fixed-size body. `sector.len()` must be a multiple of [`SEGMENT_SIZE`].
pub fn sector_root(sector: &[u8]) -> SectorRoot {
    let leaves = sector.chunks(SEGMENT_SIZE).map(leaf_hash).collect();
    SectorRoot(root_of_leaves(leaves))
}

/// `file_merkle_root`: the root of the tree whose leaves are the ordered
/// sector roots a contract currently covers.
pub fn file_root(sector_roots: &[SectorRoot]) -> [u8; 32] {
    root_of_leaves(sector_roots.iter().map(|r| r.0).collect())
}

/// An inclusion proof that one sector root sits at a given position in a
/// contract's `file_merkle_root` tree, used to answer `StorageProofSegment`
/// challenges without re-hashing the whole sector list on every verify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub siblings: Vec<[u8; 32]>,
}

/// Builds the inclusion proof for `sector_roots[leaf_index]`. `None` if the
/// index is out of range.
pub fn prove_leaf(sector_roots: &[SectorRoot], leaf_index: usize) -> Option<MerkleProof> {
    if leaf_index >= sector_roots.len() {
        return None;
    }
    let mut leaves: Vec<[u8; 32]> = sector_roots.iter().map(|r| r.0).collect();
    let target = leaves.len().next_power_of_two();
    if let Some(&last) = leaves.last() {
        leaves.resize(target, last);
    }

    let mut idx = leaf_index;
    let mut siblings = Vec::new();
    while leaves.len() > 1 {
        siblings.push(leaves[idx ^ 1]);
        leaves = leaves
            .chunks(2)
            .map(|pair| node_hash(&pair[0], &pair[1]))
            .collect();
        idx /= 2;
    }
    Some(MerkleProof { leaf_index, siblings })
}

/// Recomputes the root implied by `proof` over `leaf` and checks it matches
/// `root`.
pub fn verify_leaf(root: [u8; 32], leaf: [u8; 32], proof: &MerkleProof) -> bool {
    let mut hash = leaf;
    let mut idx = proof.leaf_index;
    for sibling in &proof.siblings {
        hash = if idx % 2 == 0 {
            node_hash(&hash, sibling)
        } else {
            node_hash(sibling, &hash)
        };
        idx /= 2;
    }
    hash == root
}

/// Incrementally builds a [`sector_root`]-compatible digest from bytes
/// arriving in arbitrary-sized chunks, so the negotiation protocol can tee a
/// network read into both the sector engine and the Merkle accounting
/// without buffering the whole delta in memory first.
#[derive(Default)]
pub struct StreamingSegmentTree {
    leaves: Vec<[u8; 32]>,
    pending: Vec<u8>,
}

impl StreamingSegmentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, mut chunk: &[u8]) {
        if !self.pending.is_empty() {
            let need = SEGMENT_SIZE - self.pending.len();
            let take = need.min(chunk.len());
            self.pending.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];
            if self.pending.len() == SEGMENT_SIZE {
                self.leaves.push(leaf_hash(&self.pending));
                self.pending.clear();
            }
        }
        while chunk.len() >= SEGMENT_SIZE {
            self.leaves.push(leaf_hash(&chunk[..SEGMENT_SIZE]));
            chunk = &chunk[SEGMENT_SIZE..];
        }
        if !chunk.is_empty() {
            self.pending.extend_from_slice(chunk);
        }
    }

    /// Finishes the tree, hashing any short trailing segment as-is.
    pub fn finish(mut self) -> [u8; 32] {
        if !self.pending.is_empty() {
            self.leaves.push(leaf_hash(&self.pending));
        }
        root_of_leaves(self.leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_matches_whole_sector_root() {
        let sector = vec![0x42u8; SEGMENT_SIZE * 8];
        let whole = sector_root(&sector);

        let mut streaming = StreamingSegmentTree::new();
        for chunk in sector.chunks(17) {
            streaming.update(chunk);
        }
        assert_eq!(streaming.finish(), whole.0);
    }

    #[test]
    fn file_root_changes_when_order_changes() {
        let a = SectorRoot([1u8; 32]);
        let b = SectorRoot([2u8; 32]);
        assert_ne!(file_root(&[a, b]), file_root(&[b, a]));
    }

    #[test]
    fn single_sector_file_root_is_its_own_root() {
        let a = SectorRoot([9u8; 32]);
        assert_eq!(file_root(&[a]), a.0);
    }

    #[test]
    fn a_leaf_proof_verifies_against_the_file_root() {
        let roots: Vec<SectorRoot> = (0u8..5).map(|i| SectorRoot([i; 32])).collect();
        let root = file_root(&roots);
        for i in 0..roots.len() {
            let proof = prove_leaf(&roots, i).unwrap();
            assert!(verify_leaf(root, roots[i].0, &proof));
        }
    }

    #[test]
    fn a_proof_for_the_wrong_leaf_does_not_verify() {
        let roots: Vec<SectorRoot> = (0u8..3).map(|i| SectorRoot([i; 32])).collect();
        let root = file_root(&roots);
        let proof = prove_leaf(&roots, 0).unwrap();
        assert!(!verify_leaf(root, roots[1].0, &proof));
    }

    use proptest::prelude::*;

    proptest! {
        /// Every leaf of an arbitrary-sized, arbitrary-content sector list
        /// proves against that list's `file_root`, regardless of how the
        /// padding to the next power of two falls out.
        #[test]
        fn every_leaf_in_an_arbitrary_contract_proves_against_its_file_root(
            seeds in prop::collection::vec(any::<u8>(), 1..64),
        ) {
            let roots: Vec<SectorRoot> = seeds.iter().map(|&b| SectorRoot([b; 32])).collect();
            let root = file_root(&roots);
            for (i, sector_root) in roots.iter().enumerate() {
                let proof = prove_leaf(&roots, i).unwrap();
                prop_assert!(verify_leaf(root, sector_root.0, &proof));
            }
        }

        /// Streaming the same bytes through [`StreamingSegmentTree`] in any
        /// chunk split reproduces [`sector_root`] computed over the whole
        /// buffer at once.
        #[test]
        fn streaming_in_arbitrary_chunks_matches_the_whole_sector_root(
            body in prop::collection::vec(any::<u8>(), 0..SEGMENT_SIZE * 6),
            chunk_size in 1usize..40,
        ) {
            let whole = sector_root(&body);
            let mut streaming = StreamingSegmentTree::new();
            for chunk in body.chunks(chunk_size) {
                streaming.update(chunk);
            }
            prop_assert_eq!(streaming.finish(), whole.0);
        }
    }
}
