//! Incremental Merkle tree traversal.
//!
//! `Treehash` advances a left-to-right postorder sweep of a complete
//! subtree one leaf per update, keeping only a logarithmic tail of
//! pending nodes. Several instances inside one signer share a single
//! stack; an instance owns exactly the top `nodes_on_stack` entries,
//! and the lowest-height-first scheduling in the signer guarantees
//! the segments never interleave. The stack is passed in by the
//! owner at every call, so instances hold no reference to it and
//! serialize cleanly.

use zeroize::Zeroize;

use crate::error::Result;
use crate::node::{combine, leafcalc, MerkleNode};
use crate::params::HASH_SIZE;

/// One tail computation over a subtree of height `h` starting at
/// `leaf_index`.
#[derive(Clone, Debug)]
pub struct Treehash {
    /// Seed from which leaves are derived.
    pub secret: [u8; HASH_SIZE],
    /// Next leaf to consume.
    pub leaf_index: u64,
    /// Target height; the instance completes when a single node of
    /// this height remains.
    pub h: u8,
    /// How many of the top entries of the shared stack belong to
    /// this instance.
    pub nodes_on_stack: u64,
    /// Whether the instance is currently running. Cleared on
    /// completion.
    pub initialized: bool,
    /// Updates consumed since the last (re)initialization.
    pub n_updates: u64,
    /// The completed node, valid once `initialized` is false after a
    /// run.
    pub node: MerkleNode,
}

impl Drop for Treehash {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl Treehash {
    /// Creates an instance for the subtree of height `h` whose
    /// leftmost leaf is `leaf_index`.
    pub fn new(secret: [u8; HASH_SIZE], leaf_index: u64, h: u8) -> Self {
        Treehash {
            secret,
            leaf_index,
            h,
            nodes_on_stack: 0,
            initialized: false,
            n_updates: 0,
            node: MerkleNode::default(),
        }
    }

    /// Reseats the instance at a new starting leaf and marks it
    /// running again.
    pub fn initialize(&mut self, leaf_index: u64) {
        self.leaf_index = leaf_index;
        self.nodes_on_stack = 0;
        self.initialized = true;
        self.n_updates = 0;
    }

    /// Performs one update step: produce the next leaf and combine as
    /// far up as the stack allows.
    pub fn update(&mut self, stack: &mut Vec<MerkleNode>) -> Result<()> {
        let leaf = leafcalc(&self.secret, self.leaf_index)?;
        self.step(stack, leaf, None);
        Ok(())
    }

    /// Like [`Treehash::update`], harvesting any produced node whose
    /// `(height, index)` matches the top of `to_save`.
    ///
    /// `to_save` must be sorted so the next node the sweep will
    /// complete is last (traversal order, reversed). Returns the
    /// harvested nodes.
    pub fn update_saving(
        &mut self,
        stack: &mut Vec<MerkleNode>,
        to_save: &mut Vec<MerkleNode>,
    ) -> Result<Vec<MerkleNode>> {
        let leaf = leafcalc(&self.secret, self.leaf_index)?;
        Ok(self.step(stack, leaf, Some(to_save)))
    }

    /// Update step over precomputed leaves instead of the PRG. Used
    /// for the tree-top sweep over subtree roots.
    pub fn update_explicit(
        &mut self,
        stack: &mut Vec<MerkleNode>,
        leaves: &[MerkleNode],
        to_save: &mut Vec<MerkleNode>,
    ) -> Vec<MerkleNode> {
        let leaf = leaves[self.leaf_index as usize];
        self.step(stack, leaf, Some(to_save))
    }

    fn step(
        &mut self,
        stack: &mut Vec<MerkleNode>,
        leaf: MerkleNode,
        mut to_save: Option<&mut Vec<MerkleNode>>,
    ) -> Vec<MerkleNode> {
        fn save_if_wanted(
            saved: &mut Vec<MerkleNode>,
            to_save: &mut Option<&mut Vec<MerkleNode>>,
            node: &MerkleNode,
        ) {
            if let Some(wanted) = to_save.as_deref_mut() {
                if let Some(next) = wanted.last() {
                    if next.height == node.height && next.index == node.index {
                        saved.push(*node);
                        wanted.pop();
                    }
                }
            }
        }

        let mut current = leaf;
        self.leaf_index += 1;
        self.n_updates += 1;
        let mut saved = Vec::new();

        while self.nodes_on_stack > 0
            && stack.last().map(|top| top.height) == Some(current.height)
        {
            save_if_wanted(&mut saved, &mut to_save, &current);
            let Some(top) = stack.pop() else { break };
            self.nodes_on_stack -= 1;
            current = combine(top, current);
        }
        save_if_wanted(&mut saved, &mut to_save, &current);
        stack.push(current);
        self.nodes_on_stack += 1;

        if self.nodes_on_stack == 1 && current.height == self.h {
            self.initialized = false;
            self.node = current;
            stack.pop();
            self.nodes_on_stack = 0;
        }

        saved
    }

    /// Height of the lowest tail node this instance has on the
    /// stack, or the target height if it has none yet. `None` when
    /// the instance is not running; the signer's scheduler skips
    /// those.
    pub fn height(&self, stack: &[MerkleNode]) -> Option<u8> {
        if !self.initialized {
            return None;
        }
        let mut lowest = self.h;
        for node in stack.iter().rev().take(self.nodes_on_stack as usize) {
            if node.height < lowest {
                lowest = node.height;
            }
        }
        Some(lowest)
    }
}
