//! Cipher header insertion/removal and the shared PN header layout.
//!
//! TKIP, CCMP and GCMP all carry an 8-byte header with the Ext IV bit set
//! in octet 3; they differ only in how octets 0-2 encode the low PN bytes.

use crate::{
    error::{CipherError, Result},
    key::Pn48,
};

/// Ext IV bit in the key id octet.
pub const EXT_IV: u8 = 0x20;
/// Length of the TKIP/CCMP/GCMP header.
pub const PN_HEADER_LEN: usize = 8;

pub(crate) fn require_len(frame: &[u8], expected: usize) -> Result<()> {
    if frame.len() < expected {
        return Err(CipherError::FrameTooShort { expected, actual: frame.len() });
    }
    Ok(())
}

/// Insert `header` between the MAC header and the body.
pub(crate) fn insert_header(frame: &mut Vec<u8>, hdr_len: usize, header: &[u8]) -> Result<()> {
    require_len(frame, hdr_len)?;
    frame.splice(hdr_len..hdr_len, header.iter().copied());
    Ok(())
}

/// Remove the cipher header after the MAC header and `trailer` bytes at
/// the end. The caller has checked the frame holds both.
pub(crate) fn strip(frame: &mut Vec<u8>, hdr_len: usize, header: usize, trailer: usize) {
    frame.truncate(frame.len() - trailer);
    frame.drain(hdr_len..hdr_len + header);
}

/// CCMP/GCMP header: `PN0 PN1 0 ExtIV|keyid PN2 PN3 PN4 PN5`.
pub fn ccmp_header(pn: Pn48, key_id: u8) -> [u8; PN_HEADER_LEN] {
    let b = pn.to_le_bytes();
    [b[0], b[1], 0, EXT_IV | (key_id << 6), b[2], b[3], b[4], b[5]]
}

/// TKIP header: `TSC1 WEPSeed1 TSC0 ExtIV|keyid TSC2 TSC3 TSC4 TSC5`.
pub fn tkip_header(pn: Pn48, key_id: u8) -> [u8; PN_HEADER_LEN] {
    let b = pn.to_le_bytes();
    [b[1], (b[1] | 0x20) & 0x7f, b[0], EXT_IV | (key_id << 6), b[2], b[3], b[4], b[5]]
}

/// PN and key id from a CCMP/GCMP header.
pub fn parse_ccmp_header(header: &[u8]) -> Result<(Pn48, u8)> {
    let h = pn_header(header)?;
    Ok((Pn48::from_le_bytes([h[0], h[1], h[4], h[5], h[6], h[7]]), h[3] >> 6))
}

/// TSC and key id from a TKIP header.
pub fn parse_tkip_header(header: &[u8]) -> Result<(Pn48, u8)> {
    let h = pn_header(header)?;
    Ok((Pn48::from_le_bytes([h[2], h[0], h[4], h[5], h[6], h[7]]), h[3] >> 6))
}

fn pn_header(header: &[u8]) -> Result<[u8; PN_HEADER_LEN]> {
    let Some(h) = header.first_chunk::<PN_HEADER_LEN>() else {
        return Err(CipherError::FrameTooShort { expected: PN_HEADER_LEN, actual: header.len() });
    };
    if h[3] & EXT_IV == 0 {
        return Err(CipherError::MalformedHeader { reason: "Ext IV bit not set" });
    }
    Ok(*h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccmp_header_layout() {
        let header = ccmp_header(Pn48::new(0xB503_9776_E70C), 0);
        assert_eq!(header, [0x0c, 0xe7, 0x00, 0x20, 0x76, 0x97, 0x03, 0xb5]);
        assert_eq!(parse_ccmp_header(&header).unwrap(), (Pn48::new(0xB503_9776_E70C), 0));
    }

    #[test]
    fn tkip_header_layout() {
        let header = tkip_header(Pn48::new(0x0000_0000_0102), 1);
        assert_eq!(header, [0x01, 0x21, 0x02, 0x60, 0, 0, 0, 0]);
        assert_eq!(parse_tkip_header(&header).unwrap(), (Pn48::new(0x0102), 1));
    }

    #[test]
    fn missing_ext_iv_is_rejected() {
        assert!(matches!(
            parse_ccmp_header(&[0, 0, 0, 0, 0, 0, 0, 0]),
            Err(CipherError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn insert_and_strip() {
        let mut frame = vec![1, 2, 3, 9, 9];
        insert_header(&mut frame, 3, &[7, 7]).unwrap();
        assert_eq!(frame, [1, 2, 3, 7, 7, 9, 9]);
        strip(&mut frame, 3, 2, 1);
        assert_eq!(frame, [1, 2, 3, 9]);
    }
}
