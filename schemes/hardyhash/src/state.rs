//! Persistent structures: signatures and per-signer state.

use zeroize::Zeroize;

use crate::node::MerkleNode;
use crate::params::HASH_SIZE;
use crate::treehash::Treehash;
use crate::wots::OtsSignature;

/// A complete hypertree signature.
#[derive(Clone, Debug)]
pub struct Signature {
    /// Sibling chain from the consumed leaf up to the hypertree
    /// root.
    pub auth_path: Vec<MerkleNode>,
    /// The consumed leaf: the one-time public key and its position.
    pub leaf: MerkleNode,
    /// The one-time signature over the message.
    pub ots: OtsSignature,
}

/// Everything one signer needs to keep signing, persisted to its
/// state file between signatures.
///
/// `auth_path[h].index` is always the sibling of the next leaf to
/// sign, for heights inside the subtree; entries above the subtree
/// were copied from the tree-top at initialization and never change.
#[derive(Clone, Debug)]
pub struct SignerState {
    /// Seed from which every leaf key pair of this subtree derives.
    pub secret_key: [u8; HASH_SIZE],
    /// Authentication path for the next leaf.
    pub auth_path: Vec<MerkleNode>,
    /// Pre-saved right-spine node at subtree height `H - 2`; the one
    /// node the traversal cannot recompute in time when it is
    /// needed.
    pub retain: MerkleNode,
    /// Tail computations for upcoming auth-path nodes, one per
    /// height below `H - 1`.
    pub treehash_instances: Vec<Treehash>,
    /// Per-height memo of the last left-child auth-path node,
    /// consumed when its right sibling completes.
    pub keep: Vec<MerkleNode>,
    /// Stack shared by all treehash instances of this signer. Each
    /// instance owns a contiguous segment at the top, sized by its
    /// `nodes_on_stack`.
    pub treehash_stack: Vec<MerkleNode>,
    /// Root of this signer's subtree. In-memory only; not persisted.
    pub root: MerkleNode,
    /// Set when the last leaf has been signed. A state carrying this
    /// flag must never sign again.
    pub exhausted: bool,
}

impl Drop for SignerState {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl SignerState {
    /// Height of this signer's subtree.
    pub fn subtree_height(&self) -> u32 {
        self.keep.len() as u32
    }

    /// Total number of signatures this state supports over its
    /// lifetime.
    pub fn max_signatures(&self) -> u64 {
        1 << self.subtree_height()
    }

    /// The next leaf to consume: the opposite-parity neighbor of the
    /// stored auth-path leaf, which always points at the sibling.
    pub fn current_leaf(&self) -> u64 {
        let sibling = self.auth_path[0].index as u64;
        if sibling % 2 == 1 {
            sibling - 1
        } else {
            sibling + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(height: u8, index: u32) -> MerkleNode {
        MerkleNode {
            hash: [0u8; HASH_SIZE],
            height,
            index,
        }
    }

    fn state_with_sibling(index: u32) -> SignerState {
        SignerState {
            secret_key: [0u8; HASH_SIZE],
            auth_path: vec![node(0, index)],
            retain: MerkleNode::default(),
            treehash_instances: Vec::new(),
            keep: vec![MerkleNode::default(); 4],
            treehash_stack: Vec::new(),
            root: MerkleNode::default(),
            exhausted: false,
        }
    }

    #[test]
    fn test_current_leaf_is_sibling_neighbor() {
        assert_eq!(state_with_sibling(1).current_leaf(), 0);
        assert_eq!(state_with_sibling(0).current_leaf(), 1);
        assert_eq!(state_with_sibling(6).current_leaf(), 7);
        assert_eq!(state_with_sibling(7).current_leaf(), 6);
    }

    #[test]
    fn test_capacity_follows_keep_length() {
        let state = state_with_sibling(1);
        assert_eq!(state.subtree_height(), 4);
        assert_eq!(state.max_signatures(), 16);
    }
}
