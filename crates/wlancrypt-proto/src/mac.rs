//! 802.11 MAC header access.
//!
//! The fixed 24-byte prefix shared by data and management frames is cast
//! directly from the buffer with `zerocopy`. The variable tail (Address 4,
//! QoS Control, HT Control) is located through [`header_len`].

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Frame control bits (little-endian `u16` view of the first two octets).
pub mod fc {
    /// Type field mask (bits 2-3)
    pub const TYPE_MASK: u16 = 0x000c;
    /// Subtype field mask (bits 4-7)
    pub const SUBTYPE_MASK: u16 = 0x00f0;
    /// Management frame type
    pub const TYPE_MGMT: u16 = 0x0000;
    /// Control frame type
    pub const TYPE_CTRL: u16 = 0x0004;
    /// Data frame type
    pub const TYPE_DATA: u16 = 0x0008;
    /// QoS bit inside the data subtype
    pub const STYPE_QOS: u16 = 0x0080;
    /// To DS
    pub const TO_DS: u16 = 0x0100;
    /// From DS
    pub const FROM_DS: u16 = 0x0200;
    /// More fragments
    pub const MORE_FRAG: u16 = 0x0400;
    /// Retry
    pub const RETRY: u16 = 0x0800;
    /// Power management
    pub const PWR_MGT: u16 = 0x1000;
    /// More data
    pub const MORE_DATA: u16 = 0x2000;
    /// Protected frame
    pub const PROTECTED: u16 = 0x4000;
    /// +HTC / order
    pub const ORDER: u16 = 0x8000;

    /// Association request subtype (management)
    pub const STYPE_ASSOC_REQ: u16 = 0x0000;
    /// Association response subtype (management)
    pub const STYPE_ASSOC_RESP: u16 = 0x0010;
    /// Reassociation request subtype (management)
    pub const STYPE_REASSOC_REQ: u16 = 0x0020;
    /// Reassociation response subtype (management)
    pub const STYPE_REASSOC_RESP: u16 = 0x0030;
    /// Disassociation subtype (management)
    pub const STYPE_DISASSOC: u16 = 0x00a0;
    /// Deauthentication subtype (management)
    pub const STYPE_DEAUTH: u16 = 0x00c0;
    /// Action subtype (management)
    pub const STYPE_ACTION: u16 = 0x00d0;
}

/// Length of the fixed header prefix (FC, duration, A1-A3, sequence control).
pub const BASE_HEADER_LEN: usize = 24;

/// TID used for non-QoS data and management frames.
pub const NON_QOS_TID: u8 = 16;

/// Number of receive replay counters kept per key (16 TIDs + non-QoS).
pub const NUM_TIDS: usize = 17;

/// A 48-bit IEEE MAC address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// ff:ff:ff:ff:ff:ff
    pub const BROADCAST: Self = Self([0xff; 6]);

    /// Address with the individual/group bit set (broadcast or multicast).
    pub fn is_group(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// The all-ones broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Raw octets.
    pub fn octets(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", o[0], o[1], o[2], o[3], o[4], o[5])
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Fixed 24-byte 802.11 header prefix.
///
/// All bit patterns are valid, so the struct can be cast from untrusted
/// receive buffers without validation beyond the length check.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MacHeader {
    frame_control: [u8; 2],
    duration: [u8; 2],
    addr1: [u8; 6],
    addr2: [u8; 6],
    addr3: [u8; 6],
    seq_ctrl: [u8; 2],
}

impl MacHeader {
    /// Size of the fixed prefix.
    pub const SIZE: usize = BASE_HEADER_LEN;

    /// Borrow the header prefix of a frame.
    pub fn from_bytes(frame: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(frame)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual: frame.len() })
    }

    /// Mutably borrow the header prefix of a frame.
    pub fn from_bytes_mut(frame: &mut [u8]) -> Result<&mut Self> {
        let actual = frame.len();
        Self::mut_from_prefix(frame)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual })
    }

    /// Frame control as a little-endian `u16`.
    pub fn frame_control(&self) -> u16 {
        u16::from_le_bytes(self.frame_control)
    }

    /// Overwrite the frame control field.
    pub fn set_frame_control(&mut self, value: u16) {
        self.frame_control = value.to_le_bytes();
    }

    /// Receiver address.
    pub fn addr1(&self) -> MacAddr {
        MacAddr(self.addr1)
    }

    /// Transmitter address.
    pub fn addr2(&self) -> MacAddr {
        MacAddr(self.addr2)
    }

    /// Third address (BSSID, DA or SA depending on DS bits).
    pub fn addr3(&self) -> MacAddr {
        MacAddr(self.addr3)
    }

    /// Sequence control, little-endian.
    pub fn seq_ctrl(&self) -> u16 {
        u16::from_le_bytes(self.seq_ctrl)
    }

    /// Frame type bits.
    pub fn frame_type(&self) -> u16 {
        self.frame_control() & fc::TYPE_MASK
    }

    /// Subtype bits, still in their frame-control position.
    pub fn subtype(&self) -> u16 {
        self.frame_control() & fc::SUBTYPE_MASK
    }

    /// Data frame type.
    pub fn is_data(&self) -> bool {
        self.frame_type() == fc::TYPE_DATA
    }

    /// Management frame type.
    pub fn is_mgmt(&self) -> bool {
        self.frame_type() == fc::TYPE_MGMT
    }

    /// QoS data subtype.
    pub fn is_qos_data(&self) -> bool {
        self.is_data() && self.frame_control() & fc::STYPE_QOS != 0
    }

    /// Both To DS and From DS set (four-address frame).
    pub fn has_addr4(&self) -> bool {
        self.frame_control() & (fc::TO_DS | fc::FROM_DS) == fc::TO_DS | fc::FROM_DS
    }

    /// Protected frame bit.
    pub fn is_protected(&self) -> bool {
        self.frame_control() & fc::PROTECTED != 0
    }

    /// (Re)association request or response.
    pub fn is_assoc(&self) -> bool {
        self.is_mgmt()
            && matches!(
                self.subtype(),
                fc::STYPE_ASSOC_REQ
                    | fc::STYPE_ASSOC_RESP
                    | fc::STYPE_REASSOC_REQ
                    | fc::STYPE_REASSOC_RESP
            )
    }
}

impl fmt::Debug for MacHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacHeader")
            .field("frame_control", &format_args!("{:#06x}", self.frame_control()))
            .field("addr1", &self.addr1())
            .field("addr2", &self.addr2())
            .field("addr3", &self.addr3())
            .field("seq_ctrl", &format_args!("{:#06x}", self.seq_ctrl()))
            .finish_non_exhaustive()
    }
}

/// Full MAC header length including Address 4, QoS Control and HT Control.
///
/// HT Control is only present on QoS data and management frames with the
/// order bit set.
pub fn header_len(frame: &[u8]) -> Result<usize> {
    let header = MacHeader::from_bytes(frame)?;
    let bits = header.frame_control();
    let mut len = BASE_HEADER_LEN;

    if header.is_data() {
        if header.has_addr4() {
            len += 6;
        }
        if header.is_qos_data() {
            len += 2;
            if bits & fc::ORDER != 0 {
                len += 4;
            }
        }
    } else if header.is_mgmt() && bits & fc::ORDER != 0 {
        len += 4;
    }

    if frame.len() < len {
        return Err(ProtocolError::FrameTooShort { expected: len, actual: frame.len() });
    }
    Ok(len)
}

/// Byte offset of the QoS Control field, if the frame carries one.
pub fn qos_offset(frame: &[u8]) -> Option<usize> {
    let header = MacHeader::from_bytes(frame).ok()?;
    if !header.is_qos_data() {
        return None;
    }
    let offset = if header.has_addr4() { BASE_HEADER_LEN + 6 } else { BASE_HEADER_LEN };
    (frame.len() >= offset + 2).then_some(offset)
}

/// Traffic identifier of a frame; [`NON_QOS_TID`] when there is no QoS field.
pub fn tid(frame: &[u8]) -> u8 {
    qos_offset(frame).map_or(NON_QOS_TID, |offset| frame[offset] & 0x0f)
}

/// Fourth address of a four-address frame.
pub fn addr4(frame: &[u8]) -> Option<MacAddr> {
    let header = MacHeader::from_bytes(frame).ok()?;
    if !header.has_addr4() || frame.len() < BASE_HEADER_LEN + 6 {
        return None;
    }
    let mut addr = [0u8; 6];
    addr.copy_from_slice(&frame[BASE_HEADER_LEN..BASE_HEADER_LEN + 6]);
    Some(MacAddr(addr))
}

/// Destination and source addresses as seen by the MSDU (Michael pseudo
/// header ordering).
pub fn da_sa(frame: &[u8]) -> Result<(MacAddr, MacAddr)> {
    let header = MacHeader::from_bytes(frame)?;
    let pair = match header.frame_control() & (fc::TO_DS | fc::FROM_DS) {
        fc::TO_DS => (header.addr3(), header.addr2()),
        fc::FROM_DS => (header.addr1(), header.addr3()),
        ds if ds == fc::TO_DS | fc::FROM_DS => {
            let sa = addr4(frame).ok_or(ProtocolError::FrameTooShort {
                expected: BASE_HEADER_LEN + 6,
                actual: frame.len(),
            })?;
            (header.addr3(), sa)
        },
        _ => (header.addr1(), header.addr2()),
    };
    Ok(pair)
}
