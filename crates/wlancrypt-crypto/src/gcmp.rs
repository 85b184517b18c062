//! GCMP-128 and GCMP-256 (AES-GCM, 12-byte nonce, 16-byte tag).
//!
//! Same header and AAD as CCMP; the nonce is `A2 || PN` big-endian.

use aes_gcm::{Aes128Gcm, Aes256Gcm};
use wlancrypt_proto::CipherType;

use crate::{
    aad,
    ccmp::{aead_open, aead_seal},
    error::{CipherError, Result},
    framing::{self, PN_HEADER_LEN},
    key::{Key, KeyFlags, RxSeq, TxSeq},
    registry::CipherOps,
};

/// GCMP tag length.
pub const GCMP_MIC_LEN: usize = 16;

/// A GCMP variant.
#[derive(Debug)]
pub struct Gcmp {
    cipher: CipherType,
    key_len: usize,
}

impl Gcmp {
    /// GCMP-128.
    pub const GCMP_128: Self = Self { cipher: CipherType::AesGcm, key_len: 16 };
    /// GCMP-256.
    pub const GCMP_256: Self = Self { cipher: CipherType::AesGcm256, key_len: 32 };
}

impl CipherOps for Gcmp {
    fn cipher(&self) -> CipherType {
        self.cipher
    }

    fn key_lens(&self) -> &'static [usize] {
        if self.key_len == 32 { &[32] } else { &[16] }
    }

    fn header_len(&self) -> usize {
        PN_HEADER_LEN
    }

    fn trailer_len(&self) -> usize {
        GCMP_MIC_LEN
    }

    fn encap(
        &self,
        key: &Key,
        seq: TxSeq,
        frame: &mut Vec<u8>,
        hdr_len: usize,
        already_encapped: bool,
    ) -> Result<()> {
        if !already_encapped {
            let TxSeq::Pn(pn) = seq else {
                return Err(CipherError::MalformedHeader { reason: "GCMP needs a PN" });
            };
            framing::insert_header(frame, hdr_len, &framing::ccmp_header(pn, key.header_key_id()))?;
        }
        framing::require_len(frame, hdr_len + PN_HEADER_LEN)?;
        if !key.flags().contains(KeyFlags::SW_ENCRYPT) {
            return Ok(());
        }

        let (pn, _) = framing::parse_ccmp_header(&frame[hdr_len..])?;
        let aad = aad::data_aad(frame)?;
        let nonce = aad::gcm_nonce(frame, pn)?;
        let body_at = hdr_len + PN_HEADER_LEN;
        let material = key.material().as_bytes();
        let body = &mut frame[body_at..];
        let tag = if self.key_len == 32 {
            aead_seal::<Aes256Gcm>(self.cipher, material, &nonce, &aad, body)?
        } else {
            aead_seal::<Aes128Gcm>(self.cipher, material, &nonce, &aad, body)?
        };
        frame.extend_from_slice(&tag);
        Ok(())
    }

    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, tid: u8) -> Result<RxSeq> {
        framing::require_len(frame, hdr_len + PN_HEADER_LEN + GCMP_MIC_LEN)?;
        let (pn, _) = framing::parse_ccmp_header(&frame[hdr_len..])?;
        let seq = RxSeq::Pn { tid, pn };
        key.check_rx(seq)?;

        if key.flags().contains(KeyFlags::SW_DECRYPT) {
            let aad = aad::data_aad(frame)?;
            let nonce = aad::gcm_nonce(frame, pn)?;
            let mic_at = frame.len() - GCMP_MIC_LEN;
            let tag = frame[mic_at..].to_vec();
            let material = key.material().as_bytes();
            let body = &mut frame[hdr_len + PN_HEADER_LEN..mic_at];
            if self.key_len == 32 {
                aead_open::<Aes256Gcm>(self.cipher, material, &nonce, &aad, body, &tag)?;
            } else {
                aead_open::<Aes128Gcm>(self.cipher, material, &nonce, &aad, body, &tag)?;
            }
        }
        framing::strip(frame, hdr_len, PN_HEADER_LEN, GCMP_MIC_LEN);
        Ok(seq)
    }
}
