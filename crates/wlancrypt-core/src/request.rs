//! Key install requests.

use wlancrypt_crypto::{KEYIX_NONE, Key, KeyFlags, KeyMaterial};
use wlancrypt_proto::{CipherType, MacAddr};

use crate::error::Result;

/// A key as handed to `setkey` and returned by `getkey`.
///
/// The material is wiped when the request is dropped.
#[derive(Debug, Clone)]
pub struct KeyRequest {
    /// Cipher the key is for
    pub cipher: CipherType,
    /// Slot (0-3, IGTK 4-5) or [`KEYIX_NONE`] for the default slot
    pub key_index: u16,
    /// Peer address; a group address selects the vdev scope
    pub mac: MacAddr,
    /// Requested flags (`XMIT`, `RECV`, `DEFAULT`, software flags)
    pub flags: KeyFlags,
    /// Key bytes
    pub key: KeyMaterial,
    /// Initial transmit counter
    pub tsc: u64,
    /// Initial receive counter
    pub rsc: u64,
}

impl KeyRequest {
    /// Request for `key` at `key_index`, usable in both directions.
    ///
    /// # Errors
    ///
    /// `InvalidKeyLength` if `key` exceeds the largest supported key.
    pub fn new(cipher: CipherType, key_index: u16, mac: MacAddr, key: &[u8]) -> Result<Self> {
        Ok(Self {
            cipher,
            key_index,
            mac,
            flags: KeyFlags::XMIT | KeyFlags::RECV,
            key: KeyMaterial::new(cipher, key)?,
            tsc: 0,
            rsc: 0,
        })
    }

    /// Zero-length request that only makes `key_index` the default.
    pub fn make_default(cipher: CipherType, key_index: u16, mac: MacAddr) -> Self {
        Self {
            cipher,
            key_index,
            mac,
            flags: KeyFlags::DEFAULT,
            key: KeyMaterial::empty(),
            tsc: 0,
            rsc: 0,
        }
    }

    /// Replace the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: KeyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Seed the transmit counter.
    #[must_use]
    pub fn with_tsc(mut self, tsc: u64) -> Self {
        self.tsc = tsc;
        self
    }

    /// Seed the receive counters.
    #[must_use]
    pub fn with_rsc(mut self, rsc: u64) -> Self {
        self.rsc = rsc;
        self
    }

    /// Request addresses the default slot.
    pub fn uses_default_index(&self) -> bool {
        self.key_index == KEYIX_NONE
    }

    /// Copy an installed key back out. `rsc` is the highest receive counter
    /// the key has accepted on any TID (or its IPN for an IGTK).
    pub(crate) fn from_key(key: &Key) -> Self {
        let rsc = if key.cipher().is_mgmt() {
            key.rx_ipn().get()
        } else {
            (0..wlancrypt_proto::mac::NUM_TIDS as u8).map(|tid| key.rx_pn(tid).get()).max().unwrap_or(0)
        };
        Self {
            cipher: key.cipher(),
            key_index: key.key_index(),
            mac: key.mac(),
            flags: key.flags(),
            key: key.material().clone(),
            tsc: key.tx_pn().get(),
            rsc,
        }
    }
}
