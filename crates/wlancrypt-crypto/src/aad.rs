//! Additional authenticated data and nonces for CCMP/GCMP and BIP.
//!
//! The AAD is the MAC header with every field that may change on
//! retransmission masked out, so a retried frame still verifies.

use wlancrypt_proto::{
    MacHeader,
    mac::{self, BASE_HEADER_LEN, fc},
};

use crate::{error::Result, key::Pn48};

/// Longest AAD: FC, A1-A3, SC, A4, QC.
pub const MAX_AAD_LEN: usize = 30;

/// Nonce flag for management frames.
const NONCE_MGMT: u8 = 0x10;

/// CCMP/GCMP AAD for a frame whose MAC header starts at offset 0.
pub fn data_aad(frame: &[u8]) -> Result<Vec<u8>> {
    let header = MacHeader::from_bytes(frame)?;
    mac::header_len(frame)?;

    let mut bits = header.frame_control();
    if header.is_data() {
        bits &= !(fc::SUBTYPE_MASK & !fc::STYPE_QOS);
        if header.is_qos_data() {
            bits &= !fc::ORDER;
        }
    }
    bits &= !(fc::RETRY | fc::PWR_MGT | fc::MORE_DATA);
    bits |= fc::PROTECTED;

    let mut aad = Vec::with_capacity(MAX_AAD_LEN);
    aad.extend_from_slice(&bits.to_le_bytes());
    aad.extend_from_slice(&frame[4..22]);
    // Fragment number only
    aad.extend_from_slice(&(header.seq_ctrl() & 0x000f).to_le_bytes());
    if let Some(a4) = mac::addr4(frame) {
        aad.extend_from_slice(a4.octets());
    }
    if let Some(offset) = mac::qos_offset(frame) {
        aad.push(frame[offset] & 0x0f);
        aad.push(0);
    }
    Ok(aad)
}

/// 13-byte CCMP nonce: priority/management flags, A2, PN big-endian.
pub fn ccmp_nonce(frame: &[u8], pn: Pn48) -> Result<[u8; 13]> {
    let header = MacHeader::from_bytes(frame)?;
    let mut flags = match mac::qos_offset(frame) {
        Some(offset) => frame[offset] & 0x0f,
        None => 0,
    };
    if header.is_mgmt() {
        flags |= NONCE_MGMT;
    }
    let mut nonce = [0u8; 13];
    nonce[0] = flags;
    nonce[1..7].copy_from_slice(header.addr2().octets());
    nonce[7..].copy_from_slice(&pn.to_be_bytes());
    Ok(nonce)
}

/// 12-byte GCMP/BIP-GMAC nonce: A2, PN big-endian.
pub fn gcm_nonce(frame: &[u8], pn: Pn48) -> Result<[u8; 12]> {
    let header = MacHeader::from_bytes(frame)?;
    let mut nonce = [0u8; 12];
    nonce[..6].copy_from_slice(header.addr2().octets());
    nonce[6..].copy_from_slice(&pn.to_be_bytes());
    Ok(nonce)
}

/// BIP AAD: masked frame control and A1-A3.
pub fn bip_aad(frame: &[u8]) -> Result<[u8; 20]> {
    let header = MacHeader::from_bytes(frame)?;
    let bits = header.frame_control() & !(fc::RETRY | fc::PWR_MGT | fc::MORE_DATA);
    let mut aad = [0u8; 20];
    aad[..2].copy_from_slice(&bits.to_le_bytes());
    aad[2..].copy_from_slice(&frame[4..BASE_HEADER_LEN - 2]);
    Ok(aad)
}
