//! Negotiated security policy for a vdev or a peer.

use bitflags::bitflags;

use crate::{
    errors::{ProtocolError, Result},
    suite::{AkmSet, AuthModeSet, CipherSet, CipherType},
};

/// Length of a PMKID carried in an RSN element.
pub const PMKID_LEN: usize = 16;

bitflags! {
    /// RSN capabilities field.
    ///
    /// Unknown bits are retained so a parsed field re-serializes unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RsnCaps: u16 {
        /// Pre-authentication supported
        const PREAUTH = 0x0001;
        /// No pairwise keys with WEP default keys
        const NO_PAIRWISE = 0x0002;
        /// PTKSA replay counter field (two bits)
        const PTKSA_REPLAY_COUNTER = 0x000c;
        /// GTKSA replay counter field (two bits)
        const GTKSA_REPLAY_COUNTER = 0x0030;
        /// Management frame protection required
        const MFP_REQUIRED = 0x0040;
        /// Management frame protection capable
        const MFP_CAPABLE = 0x0080;
        /// Joint multi-band RSNA
        const JOINT_MULTIBAND = 0x0100;
        /// PeerKey handshake
        const PEERKEY = 0x0200;
        /// SPP A-MSDU capable
        const SPP_AMSDU_CAPABLE = 0x0400;
        /// SPP A-MSDU required
        const SPP_AMSDU_REQUIRED = 0x0800;
        /// Protected block ack agreement capable
        const PBAC = 0x1000;
        /// Extended key id for individually addressed frames
        const EXT_KEY_ID = 0x2000;
        /// Operating channel validation capable
        const OCVC = 0x4000;
    }
}

/// Field of [`CryptoParams`] addressed by a raw parameter write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ParamType {
    /// `auth_modes`
    AuthMode = 0,
    /// `ucast_ciphers`
    UcastCipher = 1,
    /// `mcast_cipher`
    McastCipher = 2,
    /// `mgmt_cipher`
    MgmtCipher = 3,
    /// `cipher_cap`
    CipherCap = 4,
    /// `rsn_caps`
    RsnCap = 5,
    /// `key_mgmt`
    KeyMgmt = 6,
}

impl TryFrom<u32> for ParamType {
    type Error = ProtocolError;

    fn try_from(raw: u32) -> Result<Self> {
        Ok(match raw {
            0 => Self::AuthMode,
            1 => Self::UcastCipher,
            2 => Self::McastCipher,
            3 => Self::MgmtCipher,
            4 => Self::CipherCap,
            5 => Self::RsnCap,
            6 => Self::KeyMgmt,
            _ => return Err(ProtocolError::InvalidParam("unknown parameter id")),
        })
    }
}

/// Security policy: what a vdev offers or what a peer negotiated.
///
/// Created empty with the owning vdev/peer, filled by IE checks or by
/// explicit parameter writes.
///
/// # Invariants
///
/// - Every bit in the cipher and AKM sets names a known suite. Raw writes
///   through [`CryptoParams::set`] reject unknown bits.
/// - `pmkids` is only meaningful for RSN and is empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CryptoParams {
    /// Authentication modes
    pub auth_modes: AuthModeSet,
    /// Pairwise ciphers
    pub ucast_ciphers: CipherSet,
    /// Group data cipher (normally a single bit)
    pub mcast_cipher: CipherSet,
    /// Group management cipher
    pub mgmt_cipher: CipherSet,
    /// Ciphers the local hardware can offload
    pub cipher_cap: CipherSet,
    /// AKM suites
    pub key_mgmt: AkmSet,
    /// RSN capabilities
    pub rsn_caps: RsnCaps,
    /// PMKIDs from an RSN element, in wire order
    pub pmkids: Vec<[u8; PMKID_LEN]>,
}

impl CryptoParams {
    /// Raw read of one field.
    pub fn get(&self, param: ParamType) -> u32 {
        match param {
            ParamType::AuthMode => self.auth_modes.bits(),
            ParamType::UcastCipher => self.ucast_ciphers.bits(),
            ParamType::McastCipher => self.mcast_cipher.bits(),
            ParamType::MgmtCipher => self.mgmt_cipher.bits(),
            ParamType::CipherCap => self.cipher_cap.bits(),
            ParamType::RsnCap => u32::from(self.rsn_caps.bits()),
            ParamType::KeyMgmt => self.key_mgmt.bits(),
        }
    }

    /// Raw write of one field.
    ///
    /// # Errors
    ///
    /// `InvalidParam` if `value` carries bits the field cannot represent.
    pub fn set(&mut self, param: ParamType, value: u32) -> Result<()> {
        match param {
            ParamType::AuthMode => {
                self.auth_modes = AuthModeSet::from_bits(value)
                    .ok_or(ProtocolError::InvalidParam("unknown auth mode bits"))?;
            },
            ParamType::UcastCipher => self.ucast_ciphers = cipher_bits(value)?,
            ParamType::McastCipher => self.mcast_cipher = cipher_bits(value)?,
            ParamType::MgmtCipher => self.mgmt_cipher = cipher_bits(value)?,
            ParamType::CipherCap => self.cipher_cap = cipher_bits(value)?,
            ParamType::RsnCap => {
                let raw = u16::try_from(value)
                    .map_err(|_| ProtocolError::InvalidParam("RSN capabilities exceed 16 bits"))?;
                self.rsn_caps = RsnCaps::from_bits_retain(raw);
            },
            ParamType::KeyMgmt => {
                self.key_mgmt = AkmSet::from_bits(value)
                    .ok_or(ProtocolError::InvalidParam("unknown AKM bits"))?;
            },
        }
        Ok(())
    }

    /// Whether management frame protection is advertised.
    pub fn mfp_capable(&self) -> bool {
        self.rsn_caps.contains(RsnCaps::MFP_CAPABLE)
    }

    /// Whether management frame protection is mandatory.
    pub fn mfp_required(&self) -> bool {
        self.rsn_caps.contains(RsnCaps::MFP_REQUIRED)
    }

    /// The group management cipher, if exactly one is configured.
    pub fn mgmt_cipher_type(&self) -> Option<CipherType> {
        self.mgmt_cipher.preferred()
    }
}

fn cipher_bits(value: u32) -> Result<CipherSet> {
    CipherSet::from_bits(value).ok_or(ProtocolError::InvalidParam("unknown cipher bits"))
}
