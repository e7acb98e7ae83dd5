//! Merkle node algebra.
//!
//! A node is addressed by `(height, index)` in a complete binary tree
//! whose leaves sit at height 0. Leaves are one-time-signature public
//! keys derived from the signer secret; interior nodes hash their two
//! children together.

use std::cmp::Ordering;

use crate::error::Result;
use crate::hash::{prg_block, sha256};
use crate::params::HASH_SIZE;
use crate::wots::Wots;

/// One node of a Merkle tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MerkleNode {
    /// The node hash.
    pub hash: [u8; HASH_SIZE],
    /// Height above the leaves (leaves are height 0).
    pub height: u8,
    /// Index within the height level, counted from the left.
    pub index: u32,
}

impl Default for MerkleNode {
    fn default() -> Self {
        MerkleNode {
            hash: [0u8; HASH_SIZE],
            height: 0,
            index: 0,
        }
    }
}

impl MerkleNode {
    /// Position of this node in a left-to-right treehash sweep: the
    /// number of leaves that must have been consumed before the node
    /// is complete.
    pub fn traversal_position(&self) -> u64 {
        (1 + self.index as u64) << self.height
    }
}

/// Orders nodes by the point at which a left-to-right treehash sweep
/// completes them; equal completion points resolve lower height first.
///
/// This is a strict total order on distinct `(height, index)` pairs
/// within one tree, and the order in which [`crate::treehash::Treehash`]
/// produces nodes.
pub fn traversal_cmp(a: &MerkleNode, b: &MerkleNode) -> Ordering {
    a.traversal_position()
        .cmp(&b.traversal_position())
        .then(a.height.cmp(&b.height))
}

/// Combines two sibling nodes into their parent.
///
/// Callers guarantee `a` and `b` are siblings with `a.index + 1 ==
/// b.index` and equal heights.
pub fn combine(a: MerkleNode, b: MerkleNode) -> MerkleNode {
    let mut input = [0u8; 2 * HASH_SIZE];
    input[..HASH_SIZE].copy_from_slice(&a.hash);
    input[HASH_SIZE..].copy_from_slice(&b.hash);
    MerkleNode {
        hash: sha256(&input),
        height: b.height + 1,
        index: b.index / 2,
    }
}

/// Computes the leaf node at `index`: the public key of the one-time
/// key pair derived from `secret` at that index.
pub fn leafcalc(secret: &[u8], index: u64) -> Result<MerkleNode> {
    let w = wotscalc(secret, index)?;
    Ok(MerkleNode {
        hash: w.public_key(),
        height: 0,
        index: index as u32,
    })
}

/// Derives the one-time signer for leaf `index` from `secret`.
pub fn wotscalc(secret: &[u8], index: u64) -> Result<Wots> {
    let key_material = prg_block(secret, index)?;
    Wots::fixed_weight(&key_material)
}
