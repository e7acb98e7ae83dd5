//! Error types for hardyhash operations.

use std::fmt;
use std::io;

/// Errors that can occur while initializing, signing, or verifying.
#[derive(Debug)]
pub enum Error {
    /// Malformed or out-of-range command input.
    Usage {
        /// Description of what was wrong with the input.
        reason: &'static str,
    },

    /// A file could not be read, written, renamed, or created.
    Io {
        /// What the operation was doing when it failed.
        context: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A cryptographic primitive (HKDF expansion or the OS random
    /// number generator) reported failure. Always fatal: continuing
    /// could produce key material with insufficient entropy.
    Primitive {
        /// The primitive that failed.
        context: &'static str,
    },

    /// The signer state has no leaves left. The state file must be
    /// discarded; no further signatures can be derived from it.
    Exhausted,

    /// A one-time key was asked to sign a second message.
    OneTimeKeyReused,

    /// Signature verification failed.
    Verification,

    /// A persisted structure could not be decoded.
    Decoding {
        /// What was being decoded.
        context: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage { reason } => write!(f, "usage error: {}", reason),
            Error::Io { context, source } => {
                write!(f, "i/o error while {}: {}", context, source)
            }
            Error::Primitive { context } => {
                write!(f, "cryptographic primitive failed: {}", context)
            }
            Error::Exhausted => write!(
                f,
                "signer state is exhausted; delete the state file, it can sign no further messages"
            ),
            Error::OneTimeKeyReused => {
                write!(f, "attempted to sign twice with a one-time key")
            }
            Error::Verification => write!(f, "signature verification failed"),
            Error::Decoding { context } => write!(f, "decoding error: {}", context),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for hardyhash operations.
pub type Result<T> = std::result::Result<T, Error>;
