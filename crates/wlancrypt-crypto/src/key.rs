//! Key objects and packet-number state.
//!
//! A [`Key`] is one installed slot: cipher, material, flags and the replay
//! counters that travel with it. The key store clones a `Key` out of its
//! lock to run a transform, then commits the counters it produced back
//! under the lock.
//!
//! # Invariants
//!
//! - Packet numbers are 48-bit and wrap within 48 bits.
//! - A received counter is accepted only if it is strictly greater than
//!   the last accepted counter for the same TID (or IPN slot).
//! - Key material is wiped when the last copy is dropped.

use std::fmt;

use bitflags::bitflags;
use wlancrypt_proto::{CipherType, MacAddr, mac::NUM_TIDS};
use zeroize::Zeroize;

use crate::error::{CipherError, Result};

/// Largest key accepted (FILS KEK with SHA-384).
pub const MAX_KEY_LEN: usize = 64;
/// Key index meaning "use the default transmit key".
pub const KEYIX_NONE: u16 = u16::MAX;
/// Number of pairwise/group key slots.
pub const MAX_KEY_IDX: u16 = 4;
/// Number of IGTK slots; their key ids follow the normal slots (4 and 5).
pub const MAX_IGTK_KEY_IDX: u16 = 2;

/// WAPI initial IV on an authenticator.
pub const WAPI_IV_AP: u128 = 0x5c36_5c36_5c36_5c36_5c36_5c36_5c36_5c37;
/// WAPI initial IV on a supplicant.
pub const WAPI_IV_STA: u128 = 0x5c36_5c36_5c36_5c36_5c36_5c36_5c36_5c36;
/// Offset added to both WAPI counters at install. Transmit pre-increments,
/// so the first frame would otherwise carry the base IV.
pub const WAPI_IV_INSTALL_OFFSET: u128 = 2;

bitflags! {
    /// Per-key behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u16 {
        /// Usable for transmit
        const XMIT = 0x0001;
        /// Usable for receive
        const RECV = 0x0002;
        /// Group (broadcast/multicast) key
        const GROUP = 0x0004;
        /// Encrypt in software
        const SW_ENCRYPT = 0x0010;
        /// Decrypt in software
        const SW_DECRYPT = 0x0020;
        /// Add MIC in software
        const SW_ENMIC = 0x0040;
        /// Verify MIC in software
        const SW_DEMIC = 0x0080;
        /// Default transmit key of its scope
        const DEFAULT = 0x0100;

        /// All software transform flags
        const SW_ALL = Self::SW_ENCRYPT.bits()
            | Self::SW_DECRYPT.bits()
            | Self::SW_ENMIC.bits()
            | Self::SW_DEMIC.bits();
    }
}

/// What a key protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Unicast data (PTK)
    Pairwise,
    /// Group data (GTK or static WEP)
    Group,
    /// Group management integrity (IGTK)
    Igtk,
    /// FILS (re)association key encryption key
    FilsKek,
}

/// Secret key bytes. `Debug` never prints them.
#[derive(Clone)]
pub struct KeyMaterial {
    bytes: [u8; MAX_KEY_LEN],
    len: usize,
}

impl KeyMaterial {
    /// Copy key bytes in.
    ///
    /// # Errors
    ///
    /// `InvalidKeyLength` if longer than [`MAX_KEY_LEN`].
    pub fn new(cipher: CipherType, key: &[u8]) -> Result<Self> {
        if key.len() > MAX_KEY_LEN {
            return Err(CipherError::InvalidKeyLength { cipher, len: key.len() });
        }
        let mut bytes = [0u8; MAX_KEY_LEN];
        bytes[..key.len()].copy_from_slice(key);
        Ok(Self { bytes, len: key.len() })
    }

    /// No key bytes.
    pub fn empty() -> Self {
        Self { bytes: [0u8; MAX_KEY_LEN], len: 0 }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Zero-length key.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").field("len", &self.len).finish_non_exhaustive()
    }
}

/// 48-bit packet number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pn48(u64);

impl Pn48 {
    /// Largest representable value.
    pub const MAX: u64 = (1 << 48) - 1;

    /// Build from the low 48 bits of `value`.
    pub const fn new(value: u64) -> Self {
        Self(value & Self::MAX)
    }

    /// Counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Next value, wrapping within 48 bits.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    /// Big-endian octets (CCMP/GCMP nonce order).
    pub fn to_be_bytes(self) -> [u8; 6] {
        let wide = self.0.to_be_bytes();
        let mut out = [0u8; 6];
        out.copy_from_slice(&wide[2..]);
        out
    }

    /// Little-endian octets (MMIE IPN, RSC order).
    pub fn to_le_bytes(self) -> [u8; 6] {
        let wide = self.0.to_le_bytes();
        let mut out = [0u8; 6];
        out.copy_from_slice(&wide[..6]);
        out
    }

    /// Parse little-endian octets.
    pub fn from_le_bytes(bytes: [u8; 6]) -> Self {
        let mut wide = [0u8; 8];
        wide[..6].copy_from_slice(&bytes);
        Self(u64::from_le_bytes(wide))
    }
}

/// Counter reserved for one transmitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSeq {
    /// Cipher has no counter
    None,
    /// PN/TSC/IPN (WEP uses the low 24 bits as IV)
    Pn(Pn48),
    /// WAPI 128-bit packet number
    WapiIv(u128),
}

/// Counter carried by one received frame, to be committed after the
/// frame verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxSeq {
    /// Cipher has no replay protection
    None,
    /// Data PN for a TID
    Pn {
        /// Replay counter index
        tid: u8,
        /// Received counter
        pn: Pn48,
    },
    /// Management IPN
    Ipn(Pn48),
    /// WAPI 128-bit packet number
    WapiIv(u128),
}

/// One installed key.
#[derive(Clone)]
pub struct Key {
    cipher: CipherType,
    role: KeyRole,
    key_index: u16,
    flags: KeyFlags,
    mac: MacAddr,
    authenticator: bool,
    material: KeyMaterial,
    tx_pn: Pn48,
    rx_pn: [Pn48; NUM_TIDS],
    rx_ipn: Pn48,
    wapi_tx_iv: u128,
    wapi_rx_iv: u128,
}

impl Key {
    /// New key with zeroed counters and no flags.
    pub fn new(cipher: CipherType, role: KeyRole, key_index: u16, material: KeyMaterial) -> Self {
        Self {
            cipher,
            role,
            key_index,
            flags: KeyFlags::empty(),
            mac: MacAddr::BROADCAST,
            authenticator: false,
            material,
            tx_pn: Pn48::default(),
            rx_pn: [Pn48::default(); NUM_TIDS],
            rx_ipn: Pn48::default(),
            wapi_tx_iv: 0,
            wapi_rx_iv: 0,
        }
    }

    /// Set flags.
    #[must_use]
    pub fn with_flags(mut self, flags: KeyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the peer address the key belongs to.
    #[must_use]
    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = mac;
        self
    }

    /// Mark the key as installed on the authenticator side.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: bool) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Seed the transmit counter (TSC).
    #[must_use]
    pub fn with_tsc(mut self, tsc: u64) -> Self {
        self.tx_pn = Pn48::new(tsc);
        self
    }

    /// Seed every receive counter (RSC).
    #[must_use]
    pub fn with_rsc(mut self, rsc: u64) -> Self {
        self.rx_pn = [Pn48::new(rsc); NUM_TIDS];
        self.rx_ipn = Pn48::new(rsc);
        self
    }

    /// Cipher.
    pub fn cipher(&self) -> CipherType {
        self.cipher
    }

    /// Role.
    pub fn role(&self) -> KeyRole {
        self.role
    }

    /// Key index as installed (IGTK keys keep their 4/5 key id).
    pub fn key_index(&self) -> u16 {
        self.key_index
    }

    /// Two-bit key id carried in cipher headers.
    pub fn header_key_id(&self) -> u8 {
        (self.key_index & 0x3) as u8
    }

    /// Flags.
    pub fn flags(&self) -> KeyFlags {
        self.flags
    }

    /// Replace flags.
    pub fn set_flags(&mut self, flags: KeyFlags) {
        self.flags = flags;
    }

    /// Peer address (broadcast for group keys).
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Installed on the authenticator side.
    pub fn is_authenticator(&self) -> bool {
        self.authenticator
    }

    /// Group key.
    pub fn is_group(&self) -> bool {
        self.flags.contains(KeyFlags::GROUP) || self.role != KeyRole::Pairwise
    }

    /// Key bytes.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Last transmitted PN/IPN.
    pub fn tx_pn(&self) -> Pn48 {
        self.tx_pn
    }

    /// Last accepted PN for a TID.
    pub fn rx_pn(&self, tid: u8) -> Pn48 {
        self.rx_pn.get(usize::from(tid)).copied().unwrap_or_default()
    }

    /// Last accepted IPN.
    pub fn rx_ipn(&self) -> Pn48 {
        self.rx_ipn
    }

    /// WAPI transmit IV.
    pub fn wapi_tx_iv(&self) -> u128 {
        self.wapi_tx_iv
    }

    /// WAPI receive IV.
    pub fn wapi_rx_iv(&self) -> u128 {
        self.wapi_rx_iv
    }

    /// Set both WAPI counters to the role's initial IV plus the install
    /// offset.
    pub fn init_wapi_iv(&mut self) {
        let base = if self.authenticator { WAPI_IV_AP } else { WAPI_IV_STA };
        let iv = base.wrapping_add(WAPI_IV_INSTALL_OFFSET);
        self.wapi_tx_iv = iv;
        self.wapi_rx_iv = iv;
    }

    /// Advance the transmit counter and return the value for the next frame.
    pub fn reserve_tx(&mut self) -> TxSeq {
        match self.cipher {
            CipherType::WapiSms4 => {
                let step = if self.is_group() { 1 } else { 2 };
                self.wapi_tx_iv = self.wapi_tx_iv.wrapping_add(step);
                TxSeq::WapiIv(self.wapi_tx_iv)
            },
            CipherType::FilsAead | CipherType::None => TxSeq::None,
            _ => {
                self.tx_pn = self.tx_pn.next();
                TxSeq::Pn(self.tx_pn)
            },
        }
    }

    /// Replay check against the stored counters, without updating them.
    pub fn check_rx(&self, seq: RxSeq) -> Result<()> {
        match seq {
            RxSeq::None => Ok(()),
            RxSeq::Pn { tid, pn } => {
                let last = self.rx_pn(tid);
                if pn <= last {
                    return Err(CipherError::ReplayDetected {
                        tid,
                        pn: u128::from(pn.get()),
                        last: u128::from(last.get()),
                    });
                }
                Ok(())
            },
            RxSeq::Ipn(ipn) => {
                if ipn <= self.rx_ipn {
                    return Err(CipherError::ReplayDetected {
                        tid: 0,
                        pn: u128::from(ipn.get()),
                        last: u128::from(self.rx_ipn.get()),
                    });
                }
                Ok(())
            },
            RxSeq::WapiIv(iv) => {
                if iv <= self.wapi_rx_iv {
                    return Err(CipherError::ReplayDetected { tid: 0, pn: iv, last: self.wapi_rx_iv });
                }
                Ok(())
            },
        }
    }

    /// Check and store a received counter.
    pub fn commit_rx(&mut self, seq: RxSeq) -> Result<()> {
        self.check_rx(seq)?;
        match seq {
            RxSeq::None => {},
            RxSeq::Pn { tid, pn } => {
                if let Some(slot) = self.rx_pn.get_mut(usize::from(tid)) {
                    *slot = pn;
                }
            },
            RxSeq::Ipn(ipn) => self.rx_ipn = ipn,
            RxSeq::WapiIv(iv) => self.wapi_rx_iv = iv,
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("cipher", &self.cipher)
            .field("role", &self.role)
            .field("key_index", &self.key_index)
            .field("flags", &self.flags)
            .field("mac", &self.mac)
            .field("material", &self.material)
            .field("tx_pn", &self.tx_pn.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ccmp_key() -> Key {
        let material = KeyMaterial::new(CipherType::AesCcm, &[0x11; 16]).unwrap();
        Key::new(CipherType::AesCcm, KeyRole::Pairwise, 0, material)
    }

    #[test]
    fn pn_wraps_within_48_bits() {
        assert_eq!(Pn48::new(Pn48::MAX).next(), Pn48::new(0));
        assert_eq!(Pn48::new(0x00ff).next().get(), 0x0100);
    }

    #[test]
    fn pn_byte_orders() {
        let pn = Pn48::new(0x0102_0304_0506);
        assert_eq!(pn.to_be_bytes(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(pn.to_le_bytes(), [6, 5, 4, 3, 2, 1]);
        assert_eq!(Pn48::from_le_bytes(pn.to_le_bytes()), pn);
    }

    #[test]
    fn material_debug_is_redacted() {
        let material = KeyMaterial::new(CipherType::AesCcm, &[0xab; 16]).unwrap();
        let shown = format!("{material:?}");
        assert!(!shown.contains("ab"), "{shown}");
        assert!(shown.contains("16"));
    }

    #[test]
    fn oversized_material_rejected() {
        assert!(KeyMaterial::new(CipherType::FilsAead, &[0; 65]).is_err());
    }

    #[test]
    fn tx_reservation_increments() {
        let mut key = ccmp_key();
        assert_eq!(key.reserve_tx(), TxSeq::Pn(Pn48::new(1)));
        assert_eq!(key.reserve_tx(), TxSeq::Pn(Pn48::new(2)));
        assert_eq!(key.tx_pn(), Pn48::new(2));
    }

    #[test]
    fn rx_counters_are_per_tid() {
        let mut key = ccmp_key();
        key.commit_rx(RxSeq::Pn { tid: 0, pn: Pn48::new(5) }).unwrap();
        // Same PN on another TID is fine
        key.commit_rx(RxSeq::Pn { tid: 3, pn: Pn48::new(5) }).unwrap();
        // Replays and stale PNs are not
        assert!(matches!(
            key.commit_rx(RxSeq::Pn { tid: 0, pn: Pn48::new(5) }),
            Err(CipherError::ReplayDetected { tid: 0, .. })
        ));
        assert!(key.check_rx(RxSeq::Pn { tid: 0, pn: Pn48::new(4) }).is_err());
        assert_eq!(key.rx_pn(0), Pn48::new(5));
    }

    #[test]
    fn wapi_ivs_start_past_base() {
        let material = KeyMaterial::new(CipherType::WapiSms4, &[0; 32]).unwrap();
        let mut ap = Key::new(CipherType::WapiSms4, KeyRole::Pairwise, 0, material.clone())
            .with_authenticator(true);
        ap.init_wapi_iv();
        assert_eq!(ap.wapi_tx_iv(), WAPI_IV_AP + 2);
        assert_eq!(ap.reserve_tx(), TxSeq::WapiIv(WAPI_IV_AP + 4));

        let mut sta = Key::new(CipherType::WapiSms4, KeyRole::Group, 1, material)
            .with_flags(KeyFlags::GROUP);
        sta.init_wapi_iv();
        assert_eq!(sta.wapi_rx_iv(), WAPI_IV_STA + 2);
        assert_eq!(sta.reserve_tx(), TxSeq::WapiIv(WAPI_IV_STA + 3));
    }
}
