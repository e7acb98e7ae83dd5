//! Stateful signing.
//!
//! Signing consumes exactly one leaf of the signer's subtree. The
//! authentication path for that leaf was fully prepared by the
//! previous call, so the work here is housekeeping: advance the
//! state to the next leaf with the traversal update of Buchmann,
//! Dahmen, and Schneider, persist the advanced state, and only then
//! produce the one-time signature. Persisting first means a crash
//! can discard an in-flight signature but can never leave a leaf
//! reusable.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::codec::{decode_signer_state, encode_signature, encode_signer_state, write_atomic};
use crate::error::{Error, Result};
use crate::node::{combine, leafcalc, wotscalc, MerkleNode};
use crate::state::{Signature, SignerState};

/// Loads a signer state from its file.
pub fn load_signer_state(path: &Path) -> Result<SignerState> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        context: "reading signer state file",
        source,
    })?;
    decode_signer_state(&bytes)
}

/// Persists a signer state atomically (temporary file and rename).
pub fn store_signer_state(path: &Path, state: &SignerState) -> Result<()> {
    write_atomic(path, &encode_signer_state(state))
}

/// Writes a signature to a file.
pub fn write_signature(path: &Path, signature: &Signature) -> Result<()> {
    fs::write(path, encode_signature(signature)).map_err(|source| Error::Io {
        context: "writing signature file",
        source,
    })
}

/// Height of the lowest ancestor of `leaf_index` that is a left
/// child.
fn tau(leaf_index: u64) -> u32 {
    (leaf_index + 1).trailing_zeros()
}

/// Advances the stored authentication path from the leaf just
/// consumed to the next one.
///
/// The update works height by height: below `tau` every auth node
/// flips to a precomputed value (a completed treehash node, or the
/// retain node at height `H - 2`), at `tau` the new node is combined
/// from the old path and the kept left sibling, and the freed
/// treehash instances are reseated three subtrees ahead. The call
/// finishes with `H / 2` treehash ticks, always advancing the
/// instance with the lowest tail.
pub fn update_auth_path(state: &mut SignerState) -> Result<()> {
    let leaf_index = state.current_leaf();
    let subtree_height = state.keep.len();

    let tau = tau(leaf_index) as usize;
    let parent_even = (leaf_index >> (tau + 1)) % 2 == 0;
    if tau < subtree_height && parent_even {
        state.keep[tau] = state.auth_path[tau];
    }

    if tau == 0 {
        // The next leaf is odd; its sibling is the leaf just
        // consumed.
        state.auth_path[0] = leafcalc(&state.secret_key, leaf_index)?;
    } else {
        state.auth_path[tau] = combine(state.auth_path[tau - 1], state.keep[tau - 1]);
        for h in 0..tau {
            state.auth_path[h] = if h == subtree_height - 2 {
                state.retain
            } else {
                state.treehash_instances[h].node
            };
            let new_start = leaf_index + 1 + 3 * (1 << h);
            if new_start < (1u64 << subtree_height) {
                state.treehash_instances[h].initialize(new_start);
            }
        }
    }

    for _ in 0..subtree_height / 2 {
        let mut best: Option<(u8, usize)> = None;
        for (ix, instance) in state.treehash_instances.iter().enumerate() {
            if let Some(height) = instance.height(&state.treehash_stack) {
                if best.map_or(true, |(best_height, _)| height < best_height) {
                    best = Some((height, ix));
                }
            }
        }
        if let Some((_, ix)) = best {
            state.treehash_instances[ix].update(&mut state.treehash_stack)?;
        }
    }

    Ok(())
}

/// Signs a message, consuming the next leaf of the state at
/// `state_path`.
///
/// The state file is rewritten (atomically) before the signature is
/// returned; on the final leaf it is tombstoned with
/// `exhausted = true` and then deleted. The returned signature
/// carries the authentication path for the consumed leaf, not the
/// next one.
pub fn sign(state_path: &Path, message: &[u8]) -> Result<Signature> {
    let mut state = load_signer_state(state_path)?;
    if state.auth_path.is_empty() || state.keep.is_empty() {
        return Err(Error::Decoding {
            context: "signer state has no authentication path",
        });
    }

    let auth_path = state.auth_path.clone();
    let leaf_index = state.current_leaf();
    let signatures_allowed = state.max_signatures();

    if state.exhausted || leaf_index >= signatures_allowed {
        return Err(Error::Exhausted);
    }

    info!(
        message_number = leaf_index + 1,
        allowed = signatures_allowed,
        "signing"
    );

    if leaf_index < signatures_allowed - 1 {
        // Advance and persist before the signature exists anywhere.
        update_auth_path(&mut state)?;
        store_signer_state(state_path, &state)?;
    } else {
        info!("this is the last signature this state file can support");
        state.exhausted = true;
        store_signer_state(state_path, &state)?;
        if let Err(err) = fs::remove_file(state_path) {
            warn!(
                path = %state_path.display(),
                error = %err,
                "state file could not be removed; delete it manually, it is no longer useful"
            );
        } else {
            info!("state file removed");
        }
    }

    let mut w = wotscalc(&state.secret_key, leaf_index)?;
    let ots = w.sign(message)?;
    Ok(Signature {
        auth_path,
        leaf: MerkleNode {
            hash: w.public_key(),
            height: 0,
            index: leaf_index as u32,
        },
        ots,
    })
}
