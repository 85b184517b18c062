//! CCMP-128 and CCMP-256 (AES-CCM, 13-byte nonce).
//!
//! Frame layout after the MAC header: `CCMP hdr(8) | ciphertext | MIC`,
//! MIC 8 bytes for CCMP-128 and 16 for CCMP-256. The AAD is the masked MAC
//! header ([`crate::aad::data_aad`]); the nonce binds priority, A2 and PN.

use aes::{Aes128, Aes256};
use ccm::{
    Ccm,
    aead::{
        AeadInPlace, KeyInit,
        consts::{U8, U13, U16},
        generic_array::GenericArray,
    },
};
use wlancrypt_proto::CipherType;

use crate::{
    aad,
    error::{CipherError, Result},
    framing::{self, PN_HEADER_LEN},
    key::{Key, KeyFlags, RxSeq, TxSeq},
    registry::CipherOps,
};

type Ccm128 = Ccm<Aes128, U8, U13>;
type Ccm256 = Ccm<Aes256, U16, U13>;

/// Encrypt `data` in place and return the detached tag.
pub(crate) fn aead_seal<C: AeadInPlace + KeyInit>(
    cipher: CipherType,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    data: &mut [u8],
) -> Result<Vec<u8>> {
    let aead = C::new_from_slice(key)
        .map_err(|_| CipherError::InvalidKeyLength { cipher, len: key.len() })?;
    let tag = aead
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, data)
        .map_err(|_| CipherError::MalformedHeader { reason: "AEAD input too long" })?;
    Ok(tag.to_vec())
}

/// Verify `tag` and decrypt `data` in place. `data` is left untouched on
/// failure.
pub(crate) fn aead_open<C: AeadInPlace + KeyInit>(
    cipher: CipherType,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    data: &mut [u8],
    tag: &[u8],
) -> Result<()> {
    let aead = C::new_from_slice(key)
        .map_err(|_| CipherError::InvalidKeyLength { cipher, len: key.len() })?;
    aead.decrypt_in_place_detached(GenericArray::from_slice(nonce), aad, data, GenericArray::from_slice(tag))
        .map_err(|_| CipherError::MicMismatch)
}

/// A CCMP variant.
#[derive(Debug)]
pub struct Ccmp {
    cipher: CipherType,
    key_len: usize,
    mic_len: usize,
}

impl Ccmp {
    /// CCMP-128.
    pub const CCMP_128: Self = Self { cipher: CipherType::AesCcm, key_len: 16, mic_len: 8 };
    /// CCMP-256.
    pub const CCMP_256: Self = Self { cipher: CipherType::AesCcm256, key_len: 32, mic_len: 16 };

    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], data: &mut [u8]) -> Result<Vec<u8>> {
        if self.key_len == 32 {
            aead_seal::<Ccm256>(self.cipher, key, nonce, aad, data)
        } else {
            aead_seal::<Ccm128>(self.cipher, key, nonce, aad, data)
        }
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], data: &mut [u8], tag: &[u8]) -> Result<()> {
        if self.key_len == 32 {
            aead_open::<Ccm256>(self.cipher, key, nonce, aad, data, tag)
        } else {
            aead_open::<Ccm128>(self.cipher, key, nonce, aad, data, tag)
        }
    }
}

impl CipherOps for Ccmp {
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
        self.mic_len
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
                return Err(CipherError::MalformedHeader { reason: "CCMP needs a PN" });
            };
            framing::insert_header(frame, hdr_len, &framing::ccmp_header(pn, key.header_key_id()))?;
        }
        framing::require_len(frame, hdr_len + PN_HEADER_LEN)?;
        if !key.flags().contains(KeyFlags::SW_ENCRYPT) {
            return Ok(());
        }

        let (pn, _) = framing::parse_ccmp_header(&frame[hdr_len..])?;
        let aad = aad::data_aad(frame)?;
        let nonce = aad::ccmp_nonce(frame, pn)?;
        let body_at = hdr_len + PN_HEADER_LEN;
        let tag = self.seal(key.material().as_bytes(), &nonce, &aad, &mut frame[body_at..])?;
        frame.extend_from_slice(&tag);
        Ok(())
    }

    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, tid: u8) -> Result<RxSeq> {
        framing::require_len(frame, hdr_len + PN_HEADER_LEN + self.mic_len)?;
        let (pn, _) = framing::parse_ccmp_header(&frame[hdr_len..])?;
        let seq = RxSeq::Pn { tid, pn };
        key.check_rx(seq)?;

        if key.flags().contains(KeyFlags::SW_DECRYPT) {
            let aad = aad::data_aad(frame)?;
            let nonce = aad::ccmp_nonce(frame, pn)?;
            let mic_at = frame.len() - self.mic_len;
            let tag = frame[mic_at..].to_vec();
            let body_at = hdr_len + PN_HEADER_LEN;
            self.open(key.material().as_bytes(), &nonce, &aad, &mut frame[body_at..mic_at], &tag)?;
        }
        framing::strip(frame, hdr_len, PN_HEADER_LEN, self.mic_len);
        Ok(seq)
    }
}
