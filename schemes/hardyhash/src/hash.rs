//! Hash and key-derivation primitives.
//!
//! Everything in the scheme reduces to SHA-256, SHA-512, and one PRG.
//! The PRG is HKDF (extract-then-expand) over SHA-256 with a fixed
//! salt; the `info` input is the decimal ASCII rendering of a 64-bit
//! domain-separation counter. All primitives are pure except
//! [`random_bytes`], which reads the operating system RNG.

use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};
use crate::params::HASH_SIZE;

/// Fixed salt for the HKDF extract step. Part of the key-derivation
/// contract: changing it invalidates every existing key and state.
const PRG_SALT: &[u8] = b"salt";

/// Computes the SHA-256 digest of `input`.
pub fn sha256(input: &[u8]) -> [u8; HASH_SIZE] {
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&Sha256::digest(input));
    out
}

/// Computes the SHA-512 digest of `input`.
pub fn sha512(input: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(input));
    out
}

/// Expands `seed` into `out_len` pseudorandom bytes.
///
/// HKDF-SHA256 with the fixed salt; `info` separates the derivation
/// domains (leaf indices, signer indices, chain expansion). The
/// decimal form of `info` is held in an owned buffer for the whole
/// call.
pub fn prg(seed: &[u8], out_len: usize, info: u64) -> Result<Vec<u8>> {
    let info_str = info.to_string();
    let hk = Hkdf::<Sha256>::new(Some(PRG_SALT), seed);
    let mut out = vec![0u8; out_len];
    hk.expand(info_str.as_bytes(), &mut out)
        .map_err(|_| Error::Primitive {
            context: "hkdf expand",
        })?;
    Ok(out)
}

/// Expands `seed` into a single hash-sized block. See [`prg`].
pub fn prg_block(seed: &[u8], info: u64) -> Result<[u8; HASH_SIZE]> {
    let expanded = prg(seed, HASH_SIZE, info)?;
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&expanded);
    Ok(out)
}

/// Fills a buffer with bytes from the operating system RNG.
///
/// Failure is reported as a primitive error; callers must treat it
/// as fatal rather than fall back to weaker entropy.
pub fn random_bytes(n: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut out)
        .map_err(|_| Error::Primitive {
            context: "os random number generator",
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_fixture() {
        let digest = sha256(b"sha256");
        assert_eq!(
            hex::encode(digest),
            "5d5b09f6dcb2d53a5fffc60c4ac0d55fabdf556069d6631545f42aa6e3500f2e"
        );
    }

    #[test]
    fn test_sha512_output_size_and_determinism() {
        let a = sha512(b"input");
        let b = sha512(b"input");
        assert_eq!(a, b);
        assert_ne!(sha512(b"other")[..], a[..]);
    }

    #[test]
    fn test_prg_deterministic() {
        let seed = [7u8; HASH_SIZE];
        let a = prg(&seed, 64, 3).unwrap();
        let b = prg(&seed, 64, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_prg_info_separates_domains() {
        let seed = [7u8; HASH_SIZE];
        let a = prg(&seed, HASH_SIZE, 0).unwrap();
        let b = prg(&seed, HASH_SIZE, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_prg_explicit_leaf_fixture() {
        // First leaf hash of the treehash fixture with a seed of
        // 32 copies of 0x2a.
        let seed = [0x2au8; HASH_SIZE];
        let leaf0 = prg_block(&seed, 0).unwrap();
        assert_eq!(
            hex::encode(leaf0),
            "66020db0cff30cd94d511cb1300c8abe29bce36b4acaf0531fa2587dd9c53b59"
        );
    }

    #[test]
    fn test_random_bytes_len_and_variability() {
        let a = random_bytes(HASH_SIZE).unwrap();
        let b = random_bytes(HASH_SIZE).unwrap();
        assert_eq!(a.len(), HASH_SIZE);
        assert_ne!(a, b);
    }
}
