//! Winternitz one-time signatures.
//!
//! A key pair is 134 hash chains of depth 3. Signing reveals each
//! chain iterated to the depth named by the message digit vector;
//! verification completes every chain to full depth and compares the
//! compressed result against the public key.
//!
//! Two digit encodings share all of the chain machinery:
//!
//! - [`Encoding::Basic`] reads `sha512(message)` two bits at a time.
//! - [`Encoding::FixedWeight`] maps `sha256(message)` through the
//!   restricted-composition bijection of [`crate::compose`], so every
//!   digit vector has the same total weight and no checksum block is
//!   needed.
//!
//! Each key pair signs exactly one message. The signer marks itself
//! used on the first call and refuses a second.

use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::compose::{index_to_composition, CompositionCounts};
use crate::error::{Error, Result};
use crate::hash::{prg, sha256, sha512};
use crate::params::{HASH_SIZE, WOTS_DEPTH, WOTS_WEIGHT, WOTS_WIDTH};

/// A one-time signature: one revealed chain value per digit.
pub type OtsSignature = Vec<[u8; HASH_SIZE]>;

/// Digit encoding used to map a message to chain depths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Two bits of `sha512(message)` per digit.
    Basic,
    /// Fixed-weight restricted composition of `sha256(message)`.
    FixedWeight,
}

impl Encoding {
    /// Maps a message to `WOTS_WIDTH` digits, each in
    /// `[0, WOTS_DEPTH]`.
    pub fn transform_message(self, message: &[u8]) -> Vec<u8> {
        match self {
            Encoding::Basic => transform_basic(message),
            Encoding::FixedWeight => transform_fixed_weight(message),
        }
    }
}

/// One-time signer holding a key pair derived from 32 bytes of key
/// material.
#[derive(Clone, Debug)]
pub struct Wots {
    sk_seed: [u8; HASH_SIZE],
    pk: [u8; HASH_SIZE],
    encoding: Encoding,
    used: bool,
}

impl Drop for Wots {
    fn drop(&mut self) {
        self.sk_seed.zeroize();
    }
}

impl Wots {
    /// Builds a one-time signer with the basic encoding.
    pub fn basic(key_material: &[u8; HASH_SIZE]) -> Result<Self> {
        Self::with_encoding(key_material, Encoding::Basic)
    }

    /// Builds a one-time signer with the fixed-weight encoding.
    pub fn fixed_weight(key_material: &[u8; HASH_SIZE]) -> Result<Self> {
        Self::with_encoding(key_material, Encoding::FixedWeight)
    }

    fn with_encoding(key_material: &[u8; HASH_SIZE], encoding: Encoding) -> Result<Self> {
        let sk_seed = sha256(key_material);
        let pk = derive_pk(&sk_seed)?;
        Ok(Wots {
            sk_seed,
            pk,
            encoding,
            used: false,
        })
    }

    /// The compressed public key: the hash of every chain end.
    pub fn public_key(&self) -> [u8; HASH_SIZE] {
        self.pk
    }

    /// Signs `message`, consuming this key pair.
    ///
    /// A second call returns [`Error::OneTimeKeyReused`]; revealing
    /// chain values for two different digit vectors would let an
    /// observer forge signatures.
    pub fn sign(&mut self, message: &[u8]) -> Result<OtsSignature> {
        if self.used {
            return Err(Error::OneTimeKeyReused);
        }
        self.used = true;
        let digits = self.encoding.transform_message(message);
        let mut sk = derive_sk(&self.sk_seed)?;
        let mut signature = Vec::with_capacity(WOTS_WIDTH);
        for (i, &digit) in digits.iter().enumerate() {
            let mut chain = [0u8; HASH_SIZE];
            chain.copy_from_slice(&sk[i * HASH_SIZE..(i + 1) * HASH_SIZE]);
            signature.push(iter_f(chain, digit as usize));
        }
        sk.zeroize();
        Ok(signature)
    }
}

/// Verifies a one-time signature against a claimed public key.
pub fn verify(
    encoding: Encoding,
    pk: &[u8; HASH_SIZE],
    message: &[u8],
    signature: &[[u8; HASH_SIZE]],
) -> bool {
    if signature.len() != WOTS_WIDTH {
        return false;
    }
    let digits = encoding.transform_message(message);
    let mut pk_uncompressed = vec![0u8; WOTS_WIDTH * HASH_SIZE];
    for (i, &digit) in digits.iter().enumerate() {
        let end = iter_f(signature[i], WOTS_DEPTH - digit as usize);
        pk_uncompressed[i * HASH_SIZE..(i + 1) * HASH_SIZE].copy_from_slice(&end);
    }
    sha256(&pk_uncompressed) == *pk
}

/// Applies `sha256` to `base` `n_iters` times.
fn iter_f(mut base: [u8; HASH_SIZE], n_iters: usize) -> [u8; HASH_SIZE] {
    for _ in 0..n_iters {
        base = sha256(&base);
    }
    base
}

/// Expands the seed into the full secret key: one hash-sized chain
/// start per digit position.
fn derive_sk(sk_seed: &[u8; HASH_SIZE]) -> Result<Vec<u8>> {
    prg(sk_seed, WOTS_WIDTH * HASH_SIZE, 0)
}

/// Derives the compressed public key from the seed by running every
/// chain to full depth.
fn derive_pk(sk_seed: &[u8; HASH_SIZE]) -> Result<[u8; HASH_SIZE]> {
    let mut sk = derive_sk(sk_seed)?;
    let mut pk_uncompressed = vec![0u8; WOTS_WIDTH * HASH_SIZE];
    for i in 0..WOTS_WIDTH {
        let mut chain = [0u8; HASH_SIZE];
        chain.copy_from_slice(&sk[i * HASH_SIZE..(i + 1) * HASH_SIZE]);
        let end = iter_f(chain, WOTS_DEPTH);
        pk_uncompressed[i * HASH_SIZE..(i + 1) * HASH_SIZE].copy_from_slice(&end);
    }
    sk.zeroize();
    Ok(sha256(&pk_uncompressed))
}

/// Reads `sha512(message)` two bits at a time, little-endian within
/// each byte.
fn transform_basic(message: &[u8]) -> Vec<u8> {
    let digest = sha512(message);
    let mut digits = Vec::with_capacity(WOTS_WIDTH);
    for i in 0..WOTS_WIDTH {
        let byte = digest[i / 4];
        digits.push((byte >> (2 * (i % 4))) & 3);
    }
    digits
}

/// Maps `sha256(message)`, read as a big-endian integer, through the
/// lexicographic composition ordering.
fn transform_fixed_weight(message: &[u8]) -> Vec<u8> {
    let index = BigUint::from_bytes_be(&sha256(message));
    let counts = CompositionCounts::build(WOTS_WEIGHT, WOTS_WIDTH, WOTS_DEPTH);
    index_to_composition(&index, &counts)
}
