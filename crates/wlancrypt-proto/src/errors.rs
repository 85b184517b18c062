//! Error types for wire-format parsing.
//!
//! Every parser in this crate validates lengths before reading, so a short or
//! inconsistent buffer always surfaces as a structured error instead of a
//! panic or an out-of-bounds read.

use thiserror::Error;

/// Errors produced while parsing or building 802.11 security structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Element is truncated or its length fields are inconsistent
    #[error("malformed {element} element: {reason}")]
    MalformedIe {
        /// Element family being parsed ("RSN", "WPA", "WAPI", "MMIE")
        element: &'static str,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Cipher suite selector not recognized for this element family
    #[error("unsupported cipher suite selector {selector:02x?}")]
    UnsupportedCipher {
        /// The 4-byte selector (OUI + suite type)
        selector: [u8; 4],
    },

    /// No recognized AKM suite in the element
    #[error("unsupported AKM suite selector {selector:02x?}")]
    UnsupportedAkm {
        /// The last 4-byte selector seen
        selector: [u8; 4],
    },

    /// Frame is shorter than the header it claims to carry
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum length required
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Parameter id or value outside what the field can hold
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::MalformedIe`].
    pub(crate) fn malformed(element: &'static str, reason: &'static str) -> Self {
        Self::MalformedIe { element, reason }
    }
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = ProtocolError::malformed("RSN", "pairwise list truncated");
        assert_eq!(err.to_string(), "malformed RSN element: pairwise list truncated");
    }

    #[test]
    fn selector_display_is_hex() {
        let err = ProtocolError::UnsupportedCipher { selector: [0x00, 0x0f, 0xac, 0x63] };
        assert_eq!(err.to_string(), "unsupported cipher suite selector [00, 0f, ac, 63]");
    }
}
