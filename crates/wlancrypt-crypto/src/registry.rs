//! Cipher suite registry.
//!
//! Every supported [`CipherType`] maps to one static [`CipherOps`]
//! implementation. The facade looks the suite up from the key's cipher and
//! dispatches through the trait object; suites hold no state of their own.

use wlancrypt_proto::CipherType;

use crate::{
    bip::Bip,
    ccmp::Ccmp,
    error::{CipherError, Result},
    gcmp::Gcmp,
    key::{Key, RxSeq, TxSeq},
    tkip::Tkip,
    wapi::Wapi,
    wep::Wep,
};

/// Per-cipher frame transforms.
///
/// Frames are whole 802.11 MPDUs with the MAC header at offset 0;
/// `hdr_len` is the MAC header length. Transforms operate on a snapshot
/// of the key and never mutate it: `decap` returns the counter it saw so
/// the caller can commit it under its own lock.
pub trait CipherOps: Send + Sync {
    /// Cipher implemented.
    fn cipher(&self) -> CipherType;

    /// Accepted key lengths in bytes.
    fn key_lens(&self) -> &'static [usize];

    /// Bytes inserted after the MAC header.
    fn header_len(&self) -> usize;

    /// Bytes appended after the payload (ICV, MIC or MMIE).
    fn trailer_len(&self) -> usize;

    /// Separately added MIC (Michael for TKIP, BIP MIC length).
    fn mic_len(&self) -> usize {
        0
    }

    /// Whether the payload transform can run in software.
    fn has_software_transform(&self) -> bool {
        true
    }

    /// Check the key length.
    ///
    /// # Errors
    ///
    /// `InvalidKeyLength` if the material length is not accepted.
    fn check_key_len(&self, key: &Key) -> Result<()> {
        let len = key.material().len();
        if !self.key_lens().contains(&len) {
            return Err(CipherError::InvalidKeyLength { cipher: key.cipher(), len });
        }
        Ok(())
    }

    /// Cipher-specific key setup, run once at install.
    fn setkey(&self, key: &mut Key) -> Result<()> {
        self.check_key_len(key)
    }

    /// Insert the cipher header carrying `seq` and, with `SW_ENCRYPT`,
    /// encrypt the payload. With `already_encapped` the header is already
    /// in place.
    fn encap(
        &self,
        key: &Key,
        seq: TxSeq,
        frame: &mut Vec<u8>,
        hdr_len: usize,
        already_encapped: bool,
    ) -> Result<()> {
        let _ = (seq, frame, hdr_len, already_encapped);
        Err(CipherError::UnsupportedOperation { cipher: key.cipher(), op: "encap" })
    }

    /// Replay-check against `key`, decrypt with `SW_DECRYPT`, and strip the
    /// cipher header and trailer.
    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, tid: u8) -> Result<RxSeq> {
        let _ = (frame, hdr_len, tid);
        Err(CipherError::UnsupportedOperation { cipher: key.cipher(), op: "decap" })
    }

    /// Append a software MIC to the plaintext MSDU.
    fn enmic(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize) -> Result<()> {
        let _ = (key, frame, hdr_len);
        Ok(())
    }

    /// Verify and strip a software MIC.
    fn demic(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize) -> Result<()> {
        let _ = (key, frame, hdr_len);
        Ok(())
    }
}

static WEP: Wep = Wep;
static TKIP: Tkip = Tkip;
static CCMP_128: Ccmp = Ccmp::CCMP_128;
static CCMP_256: Ccmp = Ccmp::CCMP_256;
static GCMP_128: Gcmp = Gcmp::GCMP_128;
static GCMP_256: Gcmp = Gcmp::GCMP_256;
static BIP_CMAC_128: Bip = Bip::CMAC_128;
static BIP_CMAC_256: Bip = Bip::CMAC_256;
static BIP_GMAC_128: Bip = Bip::GMAC_128;
static BIP_GMAC_256: Bip = Bip::GMAC_256;
static WAPI: Wapi = Wapi;

/// Suite for `cipher`.
///
/// # Errors
///
/// `UnsupportedCipher` for ciphers with no frame transform (FILS AEAD,
/// `None`).
pub fn lookup(cipher: CipherType) -> Result<&'static dyn CipherOps> {
    let ops: &'static dyn CipherOps = match cipher {
        CipherType::Wep | CipherType::Wep40 | CipherType::Wep104 => &WEP,
        CipherType::Tkip => &TKIP,
        CipherType::AesCcm => &CCMP_128,
        CipherType::AesCcm256 => &CCMP_256,
        CipherType::AesGcm => &GCMP_128,
        CipherType::AesGcm256 => &GCMP_256,
        CipherType::AesCmac => &BIP_CMAC_128,
        CipherType::AesCmac256 => &BIP_CMAC_256,
        CipherType::AesGmac => &BIP_GMAC_128,
        CipherType::AesGmac256 => &BIP_GMAC_256,
        CipherType::WapiSms4 => &WAPI,
        CipherType::FilsAead | CipherType::None => {
            return Err(CipherError::UnsupportedCipher { cipher });
        },
    };
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyMaterial, KeyRole};

    #[test]
    fn every_frame_cipher_is_registered() {
        for cipher in CipherType::ALL {
            match lookup(cipher) {
                Ok(ops) if cipher.is_wep() => assert_eq!(ops.cipher(), CipherType::Wep),
                Ok(ops) => assert_eq!(ops.cipher(), cipher),
                Err(_) => assert!(matches!(cipher, CipherType::FilsAead | CipherType::None)),
            }
        }
    }

    #[test]
    fn overheads() {
        let ccmp = lookup(CipherType::AesCcm).unwrap();
        assert_eq!((ccmp.header_len(), ccmp.trailer_len()), (8, 8));
        let gcmp = lookup(CipherType::AesGcm256).unwrap();
        assert_eq!((gcmp.header_len(), gcmp.trailer_len()), (8, 16));
        let tkip = lookup(CipherType::Tkip).unwrap();
        assert_eq!((tkip.header_len(), tkip.trailer_len(), tkip.mic_len()), (8, 4, 8));
        let cmac = lookup(CipherType::AesCmac).unwrap();
        assert_eq!((cmac.trailer_len(), cmac.mic_len()), (18, 8));
        assert!(!lookup(CipherType::WapiSms4).unwrap().has_software_transform());
    }

    #[test]
    fn setkey_checks_length() {
        let material = KeyMaterial::new(CipherType::AesCcm, &[0; 15]).unwrap();
        let mut key = Key::new(CipherType::AesCcm, KeyRole::Pairwise, 0, material);
        assert_eq!(
            lookup(CipherType::AesCcm).unwrap().setkey(&mut key),
            Err(CipherError::InvalidKeyLength { cipher: CipherType::AesCcm, len: 15 })
        );
    }

    #[test]
    fn bip_has_no_data_path() {
        let material = KeyMaterial::new(CipherType::AesCmac, &[0; 16]).unwrap();
        let key = Key::new(CipherType::AesCmac, KeyRole::Igtk, 4, material);
        let mut frame = vec![0u8; 24];
        assert!(matches!(
            lookup(CipherType::AesCmac).unwrap().encap(&key, TxSeq::None, &mut frame, 24, false),
            Err(CipherError::UnsupportedOperation { op: "encap", .. })
        ));
    }
}
