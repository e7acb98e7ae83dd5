//! Key initialization.
//!
//! Initialization builds the whole hypertree once. Each signer's
//! subtree is swept by a single treehash pass that harvests, in the
//! same pass, every node the signer will later need: the initial
//! authentication path (`index == 1` at each height), the
//! pre-completed treehash nodes and the retain node (`index == 3`),
//! and the subtree root. The subtree sweeps are independent pure
//! computations and run on a bounded worker pool; the tree-top over
//! the subtree roots is then built single-threaded, and its sibling
//! nodes are copied into every signer's upper authentication path.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::thread;

use tracing::info;

use crate::codec::{encode_public_key, encode_signer_state};
use crate::error::{Error, Result};
use crate::hash::prg_block;
use crate::node::{traversal_cmp, MerkleNode};
use crate::params::{Params, HASH_SIZE, MAX_RANDOMNESS_LEN};
use crate::state::SignerState;
use crate::treehash::Treehash;

/// The full output of initialization: one state per signer plus the
/// shared public key.
pub struct Keys {
    /// Root of the hypertree; the only thing verifiers need.
    pub public_key: [u8; HASH_SIZE],
    /// Initial state for every signer.
    pub signer_states: Vec<SignerState>,
    /// Number of signers.
    pub n_signers: u32,
}

/// Derives one independent secret seed per signer from the
/// user-supplied randomness.
pub fn generate_signer_seeds(n_keys: u64, randomness: &[u8]) -> Result<Vec<[u8; HASH_SIZE]>> {
    let mut seeds = Vec::with_capacity(n_keys as usize);
    for i in 0..n_keys {
        seeds.push(prg_block(randomness, i)?);
    }
    Ok(seeds)
}

fn placeholder(height: u8, index: u32) -> MerkleNode {
    MerkleNode {
        hash: [0u8; HASH_SIZE],
        height,
        index,
    }
}

/// Builds one signer's subtree and harvests its initial state.
///
/// The returned state still lacks the upper authentication path; the
/// caller appends it after the tree-top is built.
pub fn build_subtree(secret_key: [u8; HASH_SIZE], height: u32) -> Result<SignerState> {
    // The retain node lives at height - 2.
    assert!(height >= 2, "subtree height must be at least 2");
    let h = height as usize;
    let mut state = SignerState {
        secret_key,
        auth_path: vec![MerkleNode::default(); h],
        retain: MerkleNode::default(),
        treehash_instances: (0..=h - 2)
            .map(|i| Treehash::new(secret_key, 0, i as u8))
            .collect(),
        keep: vec![MerkleNode::default(); h],
        treehash_stack: Vec::new(),
        root: MerkleNode::default(),
        exhausted: false,
    };

    // Nodes to harvest during the sweep, keyed by (height, index):
    // the initial auth path, the pre-completed tail nodes plus the
    // retain node, and the root. Reversing the traversal-sorted list
    // keeps the next wanted node on top.
    let mut to_save = Vec::with_capacity(2 * h);
    for i in 0..h {
        to_save.push(placeholder(i as u8, 1));
    }
    for i in 0..h - 1 {
        to_save.push(placeholder(i as u8, 3));
    }
    to_save.push(placeholder(h as u8, 0));
    to_save.sort_by(traversal_cmp);
    to_save.reverse();

    let mut sweep = Treehash::new(secret_key, 0, h as u8);
    let mut saved = Vec::with_capacity(to_save.len());
    for _ in 0..(1u64 << height) {
        saved.extend(sweep.update_saving(&mut state.treehash_stack, &mut to_save)?);
    }

    for node in saved {
        let node_height = node.height as usize;
        if node.index == 1 {
            state.auth_path[node_height] = node;
        } else if node.index == 3 && node_height < h - 2 {
            state.treehash_instances[node_height].node = node;
        } else if node.index == 3 && node_height == h - 2 {
            state.retain = node;
        } else if node.index == 0 && node_height == h {
            state.root = node;
        }
    }
    Ok(state)
}

/// Sweeps every signer's subtree on a bounded worker pool, joining
/// the results in signer order.
fn build_subtrees(
    seeds: Vec<[u8; HASH_SIZE]>,
    lg_messages_per_signer: u32,
) -> Result<Vec<SignerState>> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let chunk_size = seeds.len().div_ceil(workers).max(1);
    let mut signer_states = Vec::with_capacity(seeds.len());
    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::new();
        for chunk in seeds.chunks(chunk_size) {
            handles.push(scope.spawn(move || -> Result<Vec<SignerState>> {
                chunk
                    .iter()
                    .map(|seed| build_subtree(*seed, lg_messages_per_signer))
                    .collect()
            }));
        }
        for handle in handles {
            signer_states.extend(handle.join().expect("subtree worker panicked")?);
        }
        Ok(())
    })?;
    Ok(signer_states)
}

/// Builds the tree-top over the subtree roots, returning every node
/// of its levels (the sweep harvests all of them).
fn build_treetop(signer_states: &[SignerState], lg_n_signers: u32) -> Vec<MerkleNode> {
    let n = signer_states.len();
    let leaves: Vec<MerkleNode> = signer_states
        .iter()
        .enumerate()
        .map(|(i, state)| MerkleNode {
            hash: state.root.hash,
            height: 0,
            index: i as u32,
        })
        .collect();

    let mut to_save = Vec::with_capacity(2 * n);
    let mut height = 0u32;
    while (1usize << height) <= n {
        for index in 0..(n >> height) {
            to_save.push(placeholder(height as u8, index as u32));
        }
        height += 1;
    }
    to_save.sort_by(traversal_cmp);
    to_save.reverse();

    let mut stack = Vec::new();
    let mut sweep = Treehash::new([0u8; HASH_SIZE], 0, lg_n_signers as u8);
    let mut saved = Vec::with_capacity(to_save.len());
    for _ in 0..n {
        saved.extend(sweep.update_explicit(&mut stack, &leaves, &mut to_save));
    }
    saved
}

/// Builds the full hypertree: per-signer states and the public key.
pub fn initialize(params: Params, randomness: &[u8]) -> Result<Keys> {
    if randomness.len() > MAX_RANDOMNESS_LEN {
        return Err(Error::Usage {
            reason: "randomness must be at most 1024 bytes",
        });
    }

    let n_signers = params.n_signers();
    info!(n_signers, "generating signer seeds");
    let seeds = generate_signer_seeds(n_signers, randomness)?;

    info!(
        n_signers,
        subtree_height = params.lg_messages_per_signer,
        "initializing subtrees"
    );
    let mut signer_states = build_subtrees(seeds, params.lg_messages_per_signer)?;

    info!("calculating public key");
    let treetop = build_treetop(&signer_states, params.lg_n_signers);
    let treetop_map: HashMap<(u8, u32), MerkleNode> = treetop
        .into_iter()
        .map(|node| ((node.height, node.index), node))
        .collect();

    // Extend each signer's auth path with its tree-top siblings,
    // re-based to hypertree heights.
    for (i, state) in signer_states.iter_mut().enumerate() {
        let mut index = i as u32;
        for height in 0..params.lg_n_signers {
            let neighbor = index ^ 1;
            let mut node = treetop_map[&(height as u8, neighbor)];
            node.height += params.lg_messages_per_signer as u8;
            state.auth_path.push(node);
            index /= 2;
        }
    }

    let public_key = treetop_map[&(params.lg_n_signers as u8, 0)].hash;
    Ok(Keys {
        public_key,
        signer_states,
        n_signers: n_signers as u32,
    })
}

/// Writes one `signer_{i}` file per signer plus the `public_key`
/// file into an existing directory.
pub fn write_signer_states(keys: &Keys, output_dir: &Path) -> Result<()> {
    for (i, state) in keys.signer_states.iter().enumerate() {
        let path = output_dir.join(format!("signer_{}", i));
        fs::write(&path, encode_signer_state(state)).map_err(|source| Error::Io {
            context: "writing signer state file",
            source,
        })?;
    }
    let path = output_dir.join("public_key");
    fs::write(&path, encode_public_key(&keys.public_key)).map_err(|source| Error::Io {
        context: "writing public key file",
        source,
    })
}
