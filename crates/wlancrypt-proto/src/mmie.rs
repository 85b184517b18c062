//! Management MIC element (MMIE, id 76).
//!
//! ```text
//! [0x4C][len][key-id: u16 LE][IPN: 6 bytes LE][MIC: 8 or 16 bytes]
//! ```
//!
//! The element is always the last one in a protected group-addressed
//! management frame, so it is located from the end of the frame using the
//! MIC length of the configured BIP cipher.

use std::fmt;

use bytes::BufMut;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// MMIE element id.
pub const MMIE_ID: u8 = 76;
/// Key id plus IPN.
pub const MMIE_PREFIX_LEN: usize = 10;
/// MIC length of BIP-CMAC-128.
pub const MIC_LEN_SHORT: usize = 8;
/// MIC length of BIP-CMAC-256 and BIP-GMAC.
pub const MIC_LEN_LONG: usize = 16;
/// IPN size.
pub const IPN_LEN: usize = 6;

/// Fixed part of the MMIE: element header, key id and IPN.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MmiePrefix {
    id: u8,
    len: u8,
    key_id: [u8; 2],
    ipn: [u8; IPN_LEN],
}

impl MmiePrefix {
    /// Key id (IGTK index 4 or 5).
    pub fn key_id(&self) -> u16 {
        u16::from_le_bytes(self.key_id)
    }

    /// IPN in wire (little-endian) byte order.
    pub fn ipn_bytes(&self) -> [u8; IPN_LEN] {
        self.ipn
    }

    /// IPN as an integer.
    pub fn ipn(&self) -> u64 {
        ipn_to_u64(self.ipn)
    }
}

impl fmt::Debug for MmiePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmiePrefix")
            .field("id", &self.id)
            .field("len", &self.len)
            .field("key_id", &self.key_id())
            .field("ipn", &self.ipn())
            .finish()
    }
}

/// Element length byte for a MIC of `mic_len` bytes.
pub fn element_len(mic_len: usize) -> usize {
    MMIE_PREFIX_LEN - 2 + mic_len
}

/// Total on-air size of the MMIE, header included.
pub fn total_len(mic_len: usize) -> usize {
    MMIE_PREFIX_LEN + mic_len
}

/// Borrowed view of the trailing MMIE of a frame.
#[derive(Debug, Clone, Copy)]
pub struct MmieView<'a> {
    /// Fixed prefix
    pub prefix: &'a MmiePrefix,
    /// MIC bytes as received
    pub mic: &'a [u8],
    /// Offset of the element id within the frame
    pub offset: usize,
}

/// Locate and validate the MMIE at the end of `frame`.
///
/// `body_start` is the first byte after the MAC header; an MMIE overlapping
/// the header is malformed.
pub fn parse_trailing(frame: &[u8], body_start: usize, mic_len: usize) -> Result<MmieView<'_>> {
    let total = total_len(mic_len);
    if frame.len() < body_start + total {
        return Err(ProtocolError::FrameTooShort { expected: body_start + total, actual: frame.len() });
    }
    let offset = frame.len() - total;
    let (prefix, mic) = MmiePrefix::ref_from_prefix(&frame[offset..])
        .map_err(|_| ProtocolError::FrameTooShort { expected: body_start + total, actual: frame.len() })?;
    if prefix.id != MMIE_ID {
        return Err(ProtocolError::malformed("MMIE", "wrong element id"));
    }
    if usize::from(prefix.len) != element_len(mic_len) {
        return Err(ProtocolError::malformed("MMIE", "length does not match MIC size"));
    }
    Ok(MmieView { prefix, mic, offset })
}

/// Append an MMIE with a zeroed MIC; returns the offset of the MIC field.
pub fn append(frame: &mut Vec<u8>, key_id: u16, ipn: u64, mic_len: usize) -> usize {
    frame.reserve(total_len(mic_len));
    frame.put_u8(MMIE_ID);
    frame.put_u8(element_len(mic_len) as u8);
    frame.put_u16_le(key_id);
    frame.put_slice(&u64_to_ipn(ipn));
    let mic_at = frame.len();
    frame.put_bytes(0, mic_len);
    mic_at
}

/// Decode a 6-byte little-endian IPN.
pub fn ipn_to_u64(ipn: [u8; IPN_LEN]) -> u64 {
    let mut wide = [0u8; 8];
    wide[..IPN_LEN].copy_from_slice(&ipn);
    u64::from_le_bytes(wide)
}

/// Encode the low 48 bits of `value` as a little-endian IPN.
pub fn u64_to_ipn(value: u64) -> [u8; IPN_LEN] {
    let wide = value.to_le_bytes();
    let mut ipn = [0u8; IPN_LEN];
    ipn.copy_from_slice(&wide[..IPN_LEN]);
    ipn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_size() {
        assert_eq!(std::mem::size_of::<MmiePrefix>(), MMIE_PREFIX_LEN);
    }

    #[test]
    fn element_lengths() {
        assert_eq!(element_len(MIC_LEN_SHORT), 16);
        assert_eq!(element_len(MIC_LEN_LONG), 24);
        assert_eq!(total_len(MIC_LEN_SHORT), 18);
    }

    #[test]
    fn append_then_parse() {
        let mut frame = vec![0u8; 24];
        let mic_at = append(&mut frame, 4, 0x0000_0102_0304_0506, MIC_LEN_SHORT);
        assert_eq!(mic_at, 24 + MMIE_PREFIX_LEN);
        assert_eq!(&frame[24..34], &[0x4c, 0x10, 0x04, 0x00, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);

        let view = parse_trailing(&frame, 24, MIC_LEN_SHORT).unwrap();
        assert_eq!(view.prefix.key_id(), 4);
        assert_eq!(view.prefix.ipn(), 0x0102_0304_0506);
        assert_eq!(view.offset, 24);
        assert_eq!(view.mic, &[0u8; 8]);
    }

    #[test]
    fn wrong_mic_size_is_rejected() {
        let mut frame = vec![0u8; 40];
        append(&mut frame, 4, 1, MIC_LEN_SHORT);
        assert!(parse_trailing(&frame, 24, MIC_LEN_LONG).is_err());
    }

    #[test]
    fn short_frame_is_rejected() {
        let frame = vec![0u8; 30];
        assert!(matches!(
            parse_trailing(&frame, 24, MIC_LEN_SHORT),
            Err(ProtocolError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn ipn_truncates_to_48_bits() {
        assert_eq!(ipn_to_u64(u64_to_ipn(u64::MAX)), 0xffff_ffff_ffff);
    }
}
