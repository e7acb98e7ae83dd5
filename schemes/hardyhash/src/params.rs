//! Scheme parameters.
//!
//! The hypertree has two levels: a tree-top of height `lg_n_signers`
//! whose leaves are the roots of `2^lg_n_signers` signer subtrees,
//! each of height `lg_messages_per_signer`. Every leaf of a subtree
//! carries one Winternitz one-time key, so the whole structure can
//! sign `2^(lg_n_signers + lg_messages_per_signer)` messages.
//!
//! The one-time signature parameters are fixed: 134 hash chains of
//! depth 3, with the fixed-weight encoding constrained to total
//! weight 241.

use crate::error::{Error, Result};

/// Hash output size in bytes (SHA-256).
pub const HASH_SIZE: usize = 32;

/// Number of hash chains in a one-time signature.
pub const WOTS_WIDTH: usize = 134;

/// Maximum number of hash iterations per chain.
pub const WOTS_DEPTH: usize = 3;

/// Total weight of every fixed-weight digit vector.
pub const WOTS_WEIGHT: usize = 241;

/// Smallest accepted value for either `lg` parameter.
pub const MIN_LG: u32 = 2;

/// Largest accepted value for either `lg` parameter.
pub const MAX_LG: u32 = 16;

/// Longest accepted user randomness, in bytes.
pub const MAX_RANDOMNESS_LEN: usize = 1024;

/// Validated tree-shape parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Log2 of the number of signers (tree-top height).
    pub lg_n_signers: u32,
    /// Log2 of the number of messages per signer (subtree height).
    pub lg_messages_per_signer: u32,
}

impl Params {
    /// Validates and builds a parameter set.
    ///
    /// Both parameters must be even integers in `[MIN_LG, MAX_LG]`.
    pub fn new(lg_n_signers: u32, lg_messages_per_signer: u32) -> Result<Self> {
        if lg_n_signers % 2 != 0 || !(MIN_LG..=MAX_LG).contains(&lg_n_signers) {
            return Err(Error::Usage {
                reason: "lg_n_signers must be an even integer between 2 and 16, inclusive",
            });
        }
        if lg_messages_per_signer % 2 != 0
            || !(MIN_LG..=MAX_LG).contains(&lg_messages_per_signer)
        {
            return Err(Error::Usage {
                reason: "lg_messages_per_signer must be an even integer between 2 and 16, inclusive",
            });
        }
        Ok(Params {
            lg_n_signers,
            lg_messages_per_signer,
        })
    }

    /// Number of independent signer states produced by initialization.
    pub const fn n_signers(&self) -> u64 {
        1 << self.lg_n_signers
    }

    /// Number of messages each signer state can sign.
    pub const fn messages_per_signer(&self) -> u64 {
        1 << self.lg_messages_per_signer
    }

    /// Height of the full hypertree.
    pub const fn total_height(&self) -> u32 {
        self.lg_n_signers + self.lg_messages_per_signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_even_in_range() {
        for lg in [2, 4, 8, 16] {
            assert!(Params::new(lg, lg).is_ok());
        }
    }

    #[test]
    fn test_rejects_odd() {
        assert!(Params::new(3, 4).is_err());
        assert!(Params::new(4, 5).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Params::new(0, 4).is_err());
        assert!(Params::new(4, 18).is_err());
    }

    #[test]
    fn test_derived_counts() {
        let params = Params::new(4, 6).unwrap();
        assert_eq!(params.n_signers(), 16);
        assert_eq!(params.messages_per_signer(), 64);
        assert_eq!(params.total_height(), 10);
    }
}
