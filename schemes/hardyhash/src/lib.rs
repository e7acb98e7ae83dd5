//! Stateful hash-based digital signatures.
//!
//! A two-level Merkle hypertree over fixed-weight Winternitz
//! one-time signatures. A keyholder initializes a bounded pool of
//! signing capacity split across independent signer states; each
//! signature consumes one one-time leaf, and verification needs only
//! the 32-byte Merkle root. Security rests entirely on the collision
//! resistance of SHA-256; no number-theoretic assumption is used.
//!
//! # Structure
//!
//! - **Initialization** builds every signer's subtree in parallel,
//!   harvesting the nodes each signer needs to start signing, then
//!   builds a tree-top over the subtree roots whose root is the
//!   public key.
//! - **Signing** is stateful: a signer state file holds the
//!   authentication path for the next leaf plus the logarithmic
//!   bookkeeping (treehash tails, keep and retain nodes) that keeps
//!   every signature at O(H) work and space. The state file is
//!   rewritten atomically before each signature is released and
//!   destroyed on exhaustion, because reusing a one-time leaf is
//!   catastrophic.
//! - **Verification** recomputes the one-time public key from the
//!   signature and folds it through the authentication path to the
//!   root.
//!
//! # Example
//!
//! ```no_run
//! use hardyhash::{initialize, sign, verify, Params};
//!
//! let params = Params::new(4, 4)?;
//! let keys = initialize(params, b"a good source of entropy")?;
//! hardyhash::keygen::write_signer_states(&keys, "keys_dir".as_ref())?;
//!
//! let signature = sign("keys_dir/signer_0".as_ref(), b"message")?;
//! assert!(verify(&keys.public_key, b"message", &signature));
//! # Ok::<(), hardyhash::Error>(())
//! ```
//!
//! # Security warning
//!
//! The signer is stateful. Restoring a state file from a backup, or
//! signing with the same file from two processes at once, reuses
//! one-time leaves and breaks the scheme. Mutual exclusion per state
//! file is the operator's responsibility.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod compose;
pub mod error;
pub mod hash;
pub mod keygen;
pub mod node;
pub mod params;
pub mod sign;
pub mod state;
pub mod treehash;
pub mod verify;
pub mod wots;

pub use error::{Error, Result};
pub use keygen::{initialize, Keys};
pub use node::MerkleNode;
pub use params::Params;
pub use sign::sign;
pub use state::{Signature, SignerState};
pub use verify::verify;
