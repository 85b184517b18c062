//! Operations for model-based testing.
//!
//! Operations are generated by proptest (or `arbitrary` in fuzzing) and
//! applied to both the [`super::ModelEngine`] and a real engine with one
//! vdev and one peer.

use arbitrary::Arbitrary;

/// Data cipher used by a generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelCipher {
    /// CCMP-128
    Ccmp,
    /// CCMP-256
    Ccmp256,
    /// GCMP-128
    Gcmp,
}

/// Operations against one vdev and its single peer.
///
/// `peer` selects the peer's key store, otherwise the vdev's. Slots are
/// taken modulo a range a little wider than the valid one so invalid
/// indices get exercised too.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Install a data key at an explicit slot.
    SetKey {
        /// Slot (mod 4)
        slot: u8,
        /// Peer or vdev store
        peer: bool,
        /// Request the `DEFAULT` flag
        default: bool,
        /// Cipher
        cipher: ModelCipher,
        /// Key material seed
        seed: u8,
    },

    /// Install a data key at `KEYIX_NONE`, i.e. the current default slot.
    SetDefaultSlotKey {
        /// Peer or vdev store
        peer: bool,
        /// Key material seed
        seed: u8,
    },

    /// Remove a key.
    DelKey {
        /// Slot (mod 8, ids 6 and 7 are invalid)
        slot: u8,
        /// Peer or vdev store (IGTK ids always hit the vdev)
        peer: bool,
    },

    /// Select the default transmit key.
    DefaultKey {
        /// Slot (mod 4)
        slot: u8,
        /// Peer or vdev store
        peer: bool,
    },

    /// Install a BIP-CMAC IGTK.
    SetIgtk {
        /// IGTK slot (mod 2, key id 4 or 5)
        slot: u8,
        /// Key material seed
        seed: u8,
    },

    /// Encrypt a frame with the default key and decrypt it again.
    SendRecv {
        /// Peer (unicast) or vdev (group) frame
        peer: bool,
        /// Frame body
        payload: SmallPayload,
    },

    /// Add an MMIE to a group deauth and verify it.
    ProtectMgmt,
}

/// Small frame body.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallPayload {
    /// Content seed
    pub seed: u8,
    /// Length class (0-3 maps to empty/small/medium/large)
    pub size_class: u8,
}

impl SmallPayload {
    /// Expand to body bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = match self.size_class % 4 {
            0 => 0,
            1 => 8,
            2 => 100,
            _ => 1500,
        };
        (0..len).map(|i| self.seed.wrapping_add(i as u8)).collect()
    }
}

/// Result of applying an operation, compared between model and engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,
    /// Operation failed.
    Error(OperationError),
}

/// Failures the model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Key id out of range or naming an empty slot for a default change
    InvalidKeyIndex,
    /// No key where one was needed
    KeyNotFound,
    /// Anything the model does not predict
    Other,
}
