//! Signature verification.
//!
//! Verification is stateless: it needs only the 32-byte public key,
//! the message, and the signature. Two independent checks must both
//! pass: the one-time signature must open to the leaf's public key,
//! and the leaf must hash through its authentication path to the
//! hypertree root.

use std::fs;
use std::path::Path;

use crate::codec::{decode_public_key, decode_signature};
use crate::error::{Error, Result};
use crate::hash::sha256;
use crate::params::HASH_SIZE;
use crate::state::Signature;
use crate::wots::{self, Encoding};

/// Loads a signature file.
pub fn load_signature(path: &Path) -> Result<Signature> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        context: "reading signature file",
        source,
    })?;
    decode_signature(&bytes)
}

/// Loads a public key file.
pub fn load_public_key(path: &Path) -> Result<[u8; HASH_SIZE]> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        context: "reading public key file",
        source,
    })?;
    decode_public_key(&bytes)
}

/// Checks that the leaf hashes through its authentication path to
/// the public key.
///
/// An auth node with odd index is a right sibling, so the running
/// node is the left input; an even index puts the running node on
/// the right.
pub fn verify_leaf(signature: &Signature, public_key: &[u8; HASH_SIZE]) -> bool {
    let mut current = signature.leaf.hash;
    for node in &signature.auth_path {
        let mut input = [0u8; 2 * HASH_SIZE];
        if node.index % 2 == 1 {
            input[..HASH_SIZE].copy_from_slice(&current);
            input[HASH_SIZE..].copy_from_slice(&node.hash);
        } else {
            input[..HASH_SIZE].copy_from_slice(&node.hash);
            input[HASH_SIZE..].copy_from_slice(&current);
        }
        current = sha256(&input);
    }
    current == *public_key
}

/// Checks the one-time signature against the leaf's public key.
pub fn verify_ots(signature: &Signature, message: &[u8]) -> bool {
    wots::verify(
        Encoding::FixedWeight,
        &signature.leaf.hash,
        message,
        &signature.ots,
    )
}

/// Verifies a public key, message, signature triple.
pub fn verify(public_key: &[u8; HASH_SIZE], message: &[u8], signature: &Signature) -> bool {
    verify_ots(signature, message) && verify_leaf(signature, public_key)
}
