//! Broadcast/multicast integrity protocol (BIP) for robust management
//! frames.
//!
//! The MIC covers `BIP AAD || frame body || MMIE` with the MMIE MIC field
//! zeroed. BIP-CMAC-128 truncates the CMAC to 8 bytes; BIP-CMAC-256 and
//! both GMAC variants carry 16. GMAC is AES-GCM over an empty plaintext
//! with the message as AAD and nonce `A2 || IPN` big-endian.
//!
//! BIP never encrypts, so [`CipherOps::encap`] and [`CipherOps::decap`]
//! are not offered. The IPN replay check is left to the caller, which must
//! compare-and-set it atomically.

use aes::{Aes128, Aes256};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use cmac::{Cmac, Mac, digest::KeyInit};
use wlancrypt_proto::{
    CipherType,
    mmie::{self, MIC_LEN_LONG, MIC_LEN_SHORT},
};

use crate::{
    aad,
    ccmp::aead_seal,
    error::{CipherError, Result},
    key::{Key, Pn48},
    registry::CipherOps,
};

/// MIC length for a BIP cipher.
pub fn mic_len(cipher: CipherType) -> Result<usize> {
    match cipher {
        CipherType::AesCmac => Ok(MIC_LEN_SHORT),
        CipherType::AesCmac256 | CipherType::AesGmac | CipherType::AesGmac256 => Ok(MIC_LEN_LONG),
        cipher => Err(CipherError::UnsupportedCipher { cipher }),
    }
}

fn cmac_tag<M: Mac + KeyInit>(cipher: CipherType, key: &[u8], parts: [&[u8]; 2]) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|_| CipherError::InvalidKeyLength { cipher, len: key.len() })?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compute the BIP MIC of a management frame whose trailing MMIE has its
/// MIC field zeroed.
///
/// `hdr_len` is the MAC header length; the body (including the MMIE)
/// starts there.
pub fn compute_mic(cipher: CipherType, key: &[u8], frame: &[u8], hdr_len: usize, ipn: Pn48) -> Result<Vec<u8>> {
    let aad = aad::bip_aad(frame)?;
    let body = frame.get(hdr_len..).ok_or(CipherError::FrameTooShort {
        expected: hdr_len,
        actual: frame.len(),
    })?;

    let mut mic = match cipher {
        CipherType::AesCmac => cmac_tag::<Cmac<Aes128>>(cipher, key, [&aad, body])?,
        CipherType::AesCmac256 => cmac_tag::<Cmac<Aes256>>(cipher, key, [&aad, body])?,
        CipherType::AesGmac | CipherType::AesGmac256 => {
            let nonce = aad::gcm_nonce(frame, ipn)?;
            let mut message = Vec::with_capacity(aad.len() + body.len());
            message.extend_from_slice(&aad);
            message.extend_from_slice(body);
            if cipher == CipherType::AesGmac {
                aead_seal::<Aes128Gcm>(cipher, key, &nonce, &message, &mut [])?
            } else {
                aead_seal::<Aes256Gcm>(cipher, key, &nonce, &message, &mut [])?
            }
        },
        cipher => return Err(CipherError::UnsupportedCipher { cipher }),
    };
    mic.truncate(mic_len(cipher)?);
    Ok(mic)
}

/// Append an MMIE carrying `ipn` and fill in its MIC.
pub fn protect(key: &Key, frame: &mut Vec<u8>, hdr_len: usize, ipn: Pn48) -> Result<()> {
    let cipher = key.cipher();
    let len = mic_len(cipher)?;
    let mic_at = mmie::append(frame, key.key_index(), ipn.get(), len);
    let mic = compute_mic(cipher, key.material().as_bytes(), frame, hdr_len, ipn)?;
    frame[mic_at..].copy_from_slice(&mic);
    Ok(())
}

/// Verify the trailing MMIE of `frame` and return its IPN.
///
/// Does not consult or update any replay counter.
pub fn verify(key: &Key, frame: &[u8], hdr_len: usize) -> Result<Pn48> {
    let cipher = key.cipher();
    let len = mic_len(cipher)?;
    let view = mmie::parse_trailing(frame, hdr_len, len)?;
    let ipn = Pn48::new(view.prefix.ipn());
    let received = view.mic.to_vec();

    let mut zeroed = frame.to_vec();
    let mic_at = zeroed.len() - len;
    zeroed[mic_at..].fill(0);
    let expected = compute_mic(cipher, key.material().as_bytes(), &zeroed, hdr_len, ipn)?;
    if expected != received {
        return Err(CipherError::MicMismatch);
    }
    Ok(ipn)
}

/// A BIP variant.
#[derive(Debug)]
pub struct Bip {
    cipher: CipherType,
}

impl Bip {
    /// BIP-CMAC-128.
    pub const CMAC_128: Self = Self { cipher: CipherType::AesCmac };
    /// BIP-CMAC-256.
    pub const CMAC_256: Self = Self { cipher: CipherType::AesCmac256 };
    /// BIP-GMAC-128.
    pub const GMAC_128: Self = Self { cipher: CipherType::AesGmac };
    /// BIP-GMAC-256.
    pub const GMAC_256: Self = Self { cipher: CipherType::AesGmac256 };
}

impl CipherOps for Bip {
    fn cipher(&self) -> CipherType {
        self.cipher
    }

    fn key_lens(&self) -> &'static [usize] {
        match self.cipher {
            CipherType::AesCmac | CipherType::AesGmac => &[16],
            _ => &[32],
        }
    }

    fn header_len(&self) -> usize {
        0
    }

    fn trailer_len(&self) -> usize {
        mmie::total_len(self.mic_len())
    }

    fn mic_len(&self) -> usize {
        if self.cipher == CipherType::AesCmac { MIC_LEN_SHORT } else { MIC_LEN_LONG }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyMaterial, KeyRole};

    const IGTK: &str = "4ca4c37e930e4b1e65bf7ff13b433bf1";

    /// Broadcast deauth from 02::02, reason 7.
    fn deauth() -> Vec<u8> {
        hex::decode("c0000000ffffffffffff0200000000020200000000021000".to_string() + "0700").unwrap()
    }

    fn igtk(cipher: CipherType, bytes: &[u8]) -> Key {
        let material = KeyMaterial::new(cipher, bytes).unwrap();
        Key::new(cipher, KeyRole::Igtk, 4, material)
    }

    #[test]
    fn cmac_128_known_answer() {
        let key = igtk(CipherType::AesCmac, &hex::decode(IGTK).unwrap());
        let mut frame = deauth();
        protect(&key, &mut frame, 24, Pn48::new(1)).unwrap();
        assert_eq!(
            hex::encode(&frame),
            "c0000000ffffffffffff020000000002020000000002100007004c10040001000000000054d67ae7c43e0749"
        );
        assert_eq!(verify(&key, &frame, 24), Ok(Pn48::new(1)));
    }

    #[test]
    fn gmac_128_known_answer() {
        let key = igtk(CipherType::AesGmac, &hex::decode(IGTK).unwrap());
        let mut frame = deauth();
        protect(&key, &mut frame, 24, Pn48::new(1)).unwrap();
        assert_eq!(
            hex::encode(&frame),
            "c0000000ffffffffffff020000000002020000000002100007004c180400010000000000\
             4c2abddd5552dd241d03a348c6ffd1de"
        );
        assert_eq!(verify(&key, &frame, 24), Ok(Pn48::new(1)));
    }

    #[test]
    fn modified_body_fails() {
        for (cipher, len) in [
            (CipherType::AesCmac, 16),
            (CipherType::AesCmac256, 32),
            (CipherType::AesGmac, 16),
            (CipherType::AesGmac256, 32),
        ] {
            let key = igtk(cipher, &vec![0x33; len]);
            let mut frame = deauth();
            protect(&key, &mut frame, 24, Pn48::new(40)).unwrap();
            assert_eq!(frame.len(), 26 + Bip { cipher }.trailer_len());
            frame[24] ^= 1;
            assert_eq!(verify(&key, &frame, 24), Err(CipherError::MicMismatch), "{cipher:?}");
        }
    }

    #[test]
    fn missing_mmie_is_malformed() {
        let key = igtk(CipherType::AesCmac, &hex::decode(IGTK).unwrap());
        let mut frame = deauth();
        frame.extend_from_slice(&[0u8; 18]);
        assert!(matches!(verify(&key, &frame, 24), Err(CipherError::Protocol(_))));
    }

    #[test]
    fn data_ciphers_are_not_bip() {
        assert_eq!(mic_len(CipherType::AesCcm), Err(CipherError::UnsupportedCipher { cipher: CipherType::AesCcm }));
    }
}
