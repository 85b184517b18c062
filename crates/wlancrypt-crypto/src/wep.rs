//! WEP (40/104/128-bit) and the RC4/CRC-32 helpers shared with TKIP.
//!
//! Frame layout after the MAC header: `IV(3) | keyid<<6 | data | ICV(4)`.
//! The RC4 seed is `IV || key`. There is no replay protection.

use crc::{CRC_32_ISO_HDLC, Crc};
use rc4::{
    KeyInit, Rc4, StreamCipher,
    consts::{U8, U16, U19},
};
use wlancrypt_proto::CipherType;

use crate::{
    error::{CipherError, Result},
    framing,
    key::{Key, KeyFlags, RxSeq, TxSeq},
    registry::CipherOps,
};

/// WEP IV + key id octet.
pub const WEP_HEADER_LEN: usize = 4;
/// CRC-32 ICV.
pub const ICV_LEN: usize = 4;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-32 ICV over `data`, little-endian.
pub fn icv(data: &[u8]) -> [u8; ICV_LEN] {
    CRC32.checksum(data).to_le_bytes()
}

/// Apply the RC4 keystream for `seed` to `data`.
///
/// Seeds are 8, 16 or 19 bytes (WEP-40, TKIP/WEP-104, WEP-128).
pub(crate) fn rc4_apply(seed: &[u8], data: &mut [u8]) -> Result<()> {
    match seed.len() {
        8 => rc4_with::<Rc4<U8>>(seed, data),
        16 => rc4_with::<Rc4<U16>>(seed, data),
        19 => rc4_with::<Rc4<U19>>(seed, data),
        len => Err(CipherError::InvalidKeyLength { cipher: CipherType::Wep, len: len.saturating_sub(3) }),
    }
}

fn rc4_with<C: KeyInit + StreamCipher>(seed: &[u8], data: &mut [u8]) -> Result<()> {
    let mut rc4 = C::new_from_slice(seed)
        .map_err(|_| CipherError::InvalidKeyLength { cipher: CipherType::Wep, len: seed.len().saturating_sub(3) })?;
    rc4.apply_keystream(data);
    Ok(())
}

/// WEP cipher suite.
#[derive(Debug)]
pub struct Wep;

impl Wep {
    /// Key lengths accepted for one WEP type. Generic WEP takes any size.
    pub fn key_lens_for(cipher: CipherType) -> &'static [usize] {
        match cipher {
            CipherType::Wep40 => &[5],
            CipherType::Wep104 => &[13],
            _ => &[5, 13, 16],
        }
    }

    fn seed(iv: &[u8], key: &Key) -> Vec<u8> {
        let mut seed = Vec::with_capacity(3 + key.material().len());
        seed.extend_from_slice(&iv[..3]);
        seed.extend_from_slice(key.material().as_bytes());
        seed
    }
}

impl CipherOps for Wep {
    fn cipher(&self) -> CipherType {
        CipherType::Wep
    }

    fn key_lens(&self) -> &'static [usize] {
        Self::key_lens_for(CipherType::Wep)
    }

    fn check_key_len(&self, key: &Key) -> Result<()> {
        let len = key.material().len();
        if !Self::key_lens_for(key.cipher()).contains(&len) {
            return Err(CipherError::InvalidKeyLength { cipher: key.cipher(), len });
        }
        Ok(())
    }

    fn header_len(&self) -> usize {
        WEP_HEADER_LEN
    }

    fn trailer_len(&self) -> usize {
        ICV_LEN
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
            let iv = match seq {
                TxSeq::Pn(pn) => pn.get(),
                _ => 0,
            };
            let header = [iv as u8, (iv >> 8) as u8, (iv >> 16) as u8, key.header_key_id() << 6];
            framing::insert_header(frame, hdr_len, &header)?;
        }
        framing::require_len(frame, hdr_len + WEP_HEADER_LEN)?;
        if !key.flags().contains(KeyFlags::SW_ENCRYPT) {
            return Ok(());
        }

        let seed = Self::seed(&frame[hdr_len..], key);
        let body_at = hdr_len + WEP_HEADER_LEN;
        let check = icv(&frame[body_at..]);
        frame.extend_from_slice(&check);
        rc4_apply(&seed, &mut frame[body_at..])
    }

    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, _tid: u8) -> Result<RxSeq> {
        framing::require_len(frame, hdr_len + WEP_HEADER_LEN + ICV_LEN)?;
        if key.flags().contains(KeyFlags::SW_DECRYPT) {
            let seed = Self::seed(&frame[hdr_len..], key);
            let body_at = hdr_len + WEP_HEADER_LEN;
            rc4_apply(&seed, &mut frame[body_at..])?;
            let icv_at = frame.len() - ICV_LEN;
            if icv(&frame[body_at..icv_at]) != frame[icv_at..] {
                return Err(CipherError::IcvMismatch);
            }
        }
        framing::strip(frame, hdr_len, WEP_HEADER_LEN, ICV_LEN);
        Ok(RxSeq::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyMaterial, KeyRole};

    fn key(len: usize) -> Key {
        let material = KeyMaterial::new(CipherType::Wep, &vec![0x42; len]).unwrap();
        Key::new(CipherType::Wep, KeyRole::Group, 1, material).with_flags(KeyFlags::SW_ALL)
    }

    #[test]
    fn crc32_reference() {
        assert_eq!(u32::from_le_bytes(icv(b"123456789")), 0xcbf4_3926);
    }

    #[test]
    fn rc4_rfc6229_keystream() {
        let mut data = [0u8; 16];
        rc4_apply(&[1, 2, 3, 4, 5, 6, 7, 8], &mut data).unwrap();
        assert_eq!(hex::encode(data), "97ab8a1bf0afb96132f2f67258da15a8");

        let mut data = [0u8; 16];
        let seed: Vec<u8> = (1..=16).collect();
        rc4_apply(&seed, &mut data).unwrap();
        assert_eq!(hex::encode(data), "9ac7cc9a609d1ef7b2932899cde41b97");
    }

    #[test]
    fn round_trip_all_key_sizes() {
        for len in [5, 13, 16] {
            let key = key(len);
            let mut frame = vec![0u8; 24];
            frame.extend_from_slice(b"wep payload");
            Wep.encap(&key, TxSeq::Pn(crate::key::Pn48::new(0x0a0b0c)), &mut frame, 24, false)
                .unwrap();
            assert_eq!(&frame[24..28], &[0x0c, 0x0b, 0x0a, 0x40]);
            assert_ne!(&frame[28..39], b"wep payload");

            Wep.decap(&key, &mut frame, 24, 16).unwrap();
            assert_eq!(&frame[24..], b"wep payload");
        }
    }

    #[test]
    fn sized_wep_types_take_one_length() {
        let sized = |cipher, len| {
            let material = KeyMaterial::new(cipher, &vec![0x42; len]).unwrap();
            let mut key = Key::new(cipher, KeyRole::Group, 0, material);
            Wep.setkey(&mut key)
        };
        assert_eq!(sized(CipherType::Wep40, 5), Ok(()));
        assert_eq!(
            sized(CipherType::Wep40, 13),
            Err(CipherError::InvalidKeyLength { cipher: CipherType::Wep40, len: 13 })
        );
        assert_eq!(
            sized(CipherType::Wep40, 16),
            Err(CipherError::InvalidKeyLength { cipher: CipherType::Wep40, len: 16 })
        );
        assert_eq!(sized(CipherType::Wep104, 13), Ok(()));
        assert_eq!(
            sized(CipherType::Wep104, 5),
            Err(CipherError::InvalidKeyLength { cipher: CipherType::Wep104, len: 5 })
        );
        for len in [5, 13, 16] {
            assert_eq!(sized(CipherType::Wep, len), Ok(()));
        }
    }

    #[test]
    fn corrupted_frame_fails_icv() {
        let key = key(13);
        let mut frame = vec![0u8; 24];
        frame.extend_from_slice(b"wep payload");
        Wep.encap(&key, TxSeq::Pn(crate::key::Pn48::new(1)), &mut frame, 24, false).unwrap();
        frame[30] ^= 0x01;
        assert_eq!(Wep.decap(&key, &mut frame, 24, 16), Err(CipherError::IcvMismatch));
    }
}
