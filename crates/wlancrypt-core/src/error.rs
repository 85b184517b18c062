//! Error taxonomy of the crypto engine facade.
//!
//! Lower layers keep their own error types ([`ProtocolError`] for wire
//! formats, [`CipherError`] for transforms). The facade folds both into
//! [`CryptoError`] so callers see a single taxonomy and can classify an
//! error as "drop the frame" or "fail the request".

use thiserror::Error;
use wlancrypt_crypto::CipherError;
use wlancrypt_proto::{CipherType, MacAddr, ProtocolError};

/// Errors returned by [`crate::CryptoEngine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Security element truncated or internally inconsistent
    #[error("malformed {element} element: {reason}")]
    MalformedIe {
        /// Element family
        element: &'static str,
        /// What was wrong
        reason: &'static str,
    },

    /// Cipher not offered by the scope, or not implemented
    #[error("unsupported cipher {cipher:?}")]
    UnsupportedCipher {
        /// The rejected cipher
        cipher: CipherType,
    },

    /// Cipher selector with no known mapping
    #[error("unknown cipher suite selector {selector:02x?}")]
    UnknownCipherSelector {
        /// The 4-byte selector
        selector: [u8; 4],
    },

    /// No acceptable AKM suite
    #[error("unsupported AKM suite {selector:02x?}")]
    UnsupportedAkm {
        /// Last selector seen, if the failure came from parsing
        selector: Option<[u8; 4]>,
    },

    /// Key material length wrong for the cipher
    #[error("invalid key length {len} for {cipher:?}")]
    InvalidKeyLength {
        /// Cipher of the request
        cipher: CipherType,
        /// Supplied length in bytes
        len: usize,
    },

    /// Key index outside both the normal and the IGTK ranges
    #[error("invalid key index {index}")]
    InvalidKeyIndex {
        /// The rejected index
        index: u16,
    },

    /// No valid key in the addressed slot
    #[error("no key installed at index {index:?}")]
    KeyNotFound {
        /// Slot that was consulted, `None` for "default key"
        index: Option<u16>,
    },

    /// No peer with this address on the vdev
    #[error("peer {mac} not found")]
    PeerNotFound {
        /// Address looked up
        mac: MacAddr,
    },

    /// No vdev with this id
    #[error("vdev {id} not found")]
    VdevNotFound {
        /// Id looked up
        id: u8,
    },

    /// Object already exists
    #[error("{what} already exists")]
    AlreadyExists {
        /// What was being created
        what: &'static str,
    },

    /// Capacity exhausted
    #[error("out of memory: {what}")]
    OutOfMemory {
        /// Resource that ran out
        what: &'static str,
    },

    /// WEP/TKIP ICV did not verify
    #[error("ICV mismatch")]
    IcvMismatch,

    /// MIC or AEAD tag did not verify
    #[error("MIC mismatch")]
    MicMismatch,

    /// PN/IPN not above the last accepted value
    #[error("replay detected on TID {tid}: pn {pn} <= last {last}")]
    ReplayDetected {
        /// Replay counter index
        tid: u8,
        /// Received counter
        pn: u128,
        /// Highest accepted counter
        last: u128,
    },

    /// Frame not protected where protection is required, or a peer that
    /// does not meet the vdev policy
    #[error("policy violation: {reason}")]
    PolicyViolation {
        /// Which rule was broken
        reason: &'static str,
    },

    /// Parameter id or value not representable
    #[error("invalid parameter: {reason}")]
    InvalidParam {
        /// What was wrong
        reason: &'static str,
    },

    /// Frame cannot be processed (too short, bad cipher header)
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// What was wrong
        reason: String,
    },

    /// Operation not available for the key's cipher
    #[error("{cipher:?} does not support {op}")]
    UnsupportedOperation {
        /// Cipher of the key
        cipher: CipherType,
        /// Operation name
        op: &'static str,
    },
}

impl CryptoError {
    /// Errors after which the caller drops the frame silently.
    ///
    /// These must not be escalated or reported to the sender.
    pub fn is_frame_drop(&self) -> bool {
        matches!(
            self,
            Self::IcvMismatch
                | Self::MicMismatch
                | Self::ReplayDetected { .. }
                | Self::PolicyViolation { .. }
                | Self::MalformedFrame { .. }
        )
    }
}

impl From<ProtocolError> for CryptoError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedIe { element, reason } => Self::MalformedIe { element, reason },
            ProtocolError::UnsupportedCipher { selector } => Self::UnknownCipherSelector { selector },
            ProtocolError::UnsupportedAkm { selector } => Self::UnsupportedAkm { selector: Some(selector) },
            ProtocolError::InvalidParam(reason) => Self::InvalidParam { reason },
            err @ ProtocolError::FrameTooShort { .. } => Self::MalformedFrame { reason: err.to_string() },
        }
    }
}

impl From<CipherError> for CryptoError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::UnsupportedCipher { cipher } => Self::UnsupportedCipher { cipher },
            CipherError::UnsupportedOperation { cipher, op } => Self::UnsupportedOperation { cipher, op },
            CipherError::InvalidKeyLength { cipher, len } => Self::InvalidKeyLength { cipher, len },
            CipherError::IcvMismatch => Self::IcvMismatch,
            CipherError::MicMismatch => Self::MicMismatch,
            CipherError::ReplayDetected { tid, pn, last } => Self::ReplayDetected { tid, pn, last },
            CipherError::Protocol(err) => err.into(),
            err @ (CipherError::FrameTooShort { .. } | CipherError::MalformedHeader { .. }) => {
                Self::MalformedFrame { reason: err.to_string() }
            },
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
