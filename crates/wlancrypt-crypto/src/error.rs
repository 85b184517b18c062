//! Cipher operation errors.

use thiserror::Error;
use wlancrypt_proto::{CipherType, ProtocolError};

/// Errors produced by cipher suites and key objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// No frame cipher implements this type
    #[error("unsupported cipher {cipher:?}")]
    UnsupportedCipher {
        /// Requested cipher
        cipher: CipherType,
    },

    /// Operation not offered by this cipher (e.g. `encap` on a BIP key)
    #[error("{cipher:?} does not support {op}")]
    UnsupportedOperation {
        /// Cipher of the key
        cipher: CipherType,
        /// Operation name
        op: &'static str,
    },

    /// Key material length is wrong for the cipher
    #[error("invalid key length {len} for {cipher:?}")]
    InvalidKeyLength {
        /// Cipher the key was installed for
        cipher: CipherType,
        /// Supplied length in bytes
        len: usize,
    },

    /// Frame is shorter than header + cipher overhead
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum length required
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Cipher header is missing a required bit (e.g. Ext IV)
    #[error("malformed cipher header: {reason}")]
    MalformedHeader {
        /// What was wrong
        reason: &'static str,
    },

    /// WEP/TKIP integrity check value did not match
    #[error("ICV mismatch")]
    IcvMismatch,

    /// Michael MIC, CCM/GCM tag or BIP MIC did not verify
    #[error("MIC mismatch")]
    MicMismatch,

    /// Received packet number is not above the last accepted one
    #[error("replay detected on TID {tid}: pn {pn} <= last {last}")]
    ReplayDetected {
        /// Replay counter index
        tid: u8,
        /// Received counter
        pn: u128,
        /// Highest counter accepted so far
        last: u128,
    },

    /// MAC header could not be parsed
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl CipherError {
    /// Errors that mean "drop this frame" rather than a caller bug.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::IcvMismatch | Self::MicMismatch | Self::ReplayDetected { .. })
    }
}

/// Result alias for cipher operations.
pub type Result<T> = std::result::Result<T, CipherError>;
