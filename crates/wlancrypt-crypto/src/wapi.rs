//! WAPI (SMS4) framing.
//!
//! Only the header/trailer framing and the 128-bit packet number live here;
//! the SMS4 transform itself runs in hardware. Keys asking for a software
//! transform are refused.
//!
//! Header layout: `keyid | reserved | PN(16, little-endian)`, trailer is
//! the 16-byte MIC.

use wlancrypt_proto::CipherType;

use crate::{
    error::{CipherError, Result},
    framing,
    key::{Key, KeyFlags, RxSeq, TxSeq},
    registry::CipherOps,
};

/// WAPI header length.
pub const WAPI_HEADER_LEN: usize = 18;
/// WAPI MIC length.
pub const WAPI_MIC_LEN: usize = 16;

/// WAPI-SMS4 cipher suite.
#[derive(Debug)]
pub struct Wapi;

fn refuse_software(key: &Key, flags: KeyFlags, op: &'static str) -> Result<()> {
    if key.flags().intersects(flags) {
        return Err(CipherError::UnsupportedOperation { cipher: CipherType::WapiSms4, op });
    }
    Ok(())
}

impl CipherOps for Wapi {
    fn cipher(&self) -> CipherType {
        CipherType::WapiSms4
    }

    fn key_lens(&self) -> &'static [usize] {
        &[32]
    }

    fn header_len(&self) -> usize {
        WAPI_HEADER_LEN
    }

    fn trailer_len(&self) -> usize {
        WAPI_MIC_LEN
    }

    fn has_software_transform(&self) -> bool {
        false
    }

    fn setkey(&self, key: &mut Key) -> Result<()> {
        self.check_key_len(key)?;
        key.init_wapi_iv();
        Ok(())
    }

    fn encap(
        &self,
        key: &Key,
        seq: TxSeq,
        frame: &mut Vec<u8>,
        hdr_len: usize,
        already_encapped: bool,
    ) -> Result<()> {
        refuse_software(key, KeyFlags::SW_ENCRYPT | KeyFlags::SW_ENMIC, "software encrypt")?;
        if already_encapped {
            return framing::require_len(frame, hdr_len + WAPI_HEADER_LEN);
        }
        let TxSeq::WapiIv(iv) = seq else {
            return Err(CipherError::MalformedHeader { reason: "WAPI needs a 128-bit PN" });
        };
        let mut header = [0u8; WAPI_HEADER_LEN];
        header[0] = key.header_key_id();
        header[2..].copy_from_slice(&iv.to_le_bytes());
        framing::insert_header(frame, hdr_len, &header)
    }

    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, _tid: u8) -> Result<RxSeq> {
        refuse_software(key, KeyFlags::SW_DECRYPT | KeyFlags::SW_DEMIC, "software decrypt")?;
        framing::require_len(frame, hdr_len + WAPI_HEADER_LEN + WAPI_MIC_LEN)?;
        let mut pn = [0u8; 16];
        pn.copy_from_slice(&frame[hdr_len + 2..hdr_len + WAPI_HEADER_LEN]);
        let seq = RxSeq::WapiIv(u128::from_le_bytes(pn));
        key.check_rx(seq)?;
        framing::strip(frame, hdr_len, WAPI_HEADER_LEN, WAPI_MIC_LEN);
        Ok(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyMaterial, KeyRole, WAPI_IV_STA};

    fn sta_key() -> Key {
        let material = KeyMaterial::new(CipherType::WapiSms4, &[9; 32]).unwrap();
        let mut key = Key::new(CipherType::WapiSms4, KeyRole::Pairwise, 0, material);
        Wapi.setkey(&mut key).unwrap();
        key
    }

    #[test]
    fn setkey_offsets_ivs() {
        let key = sta_key();
        assert_eq!(key.wapi_tx_iv(), WAPI_IV_STA + 2);
        assert_eq!(key.wapi_rx_iv(), WAPI_IV_STA + 2);
    }

    #[test]
    fn header_carries_pn_and_is_replay_checked() {
        let mut key = sta_key();
        let seq = key.reserve_tx();
        let mut frame = vec![0u8; 24];
        frame.extend_from_slice(b"sms4");
        Wapi.encap(&key, seq, &mut frame, 24, false).unwrap();
        assert_eq!(frame.len(), 24 + WAPI_HEADER_LEN + 4);
        assert_eq!(&frame[26..42], &(WAPI_IV_STA + 4).to_le_bytes());

        frame.extend_from_slice(&[0; WAPI_MIC_LEN]);
        let mut replay = frame.clone();
        let rx = Wapi.decap(&key, &mut frame, 24, 0).unwrap();
        assert_eq!(&frame[24..], b"sms4");
        key.commit_rx(rx).unwrap();
        assert!(matches!(
            Wapi.decap(&key, &mut replay, 24, 0),
            Err(CipherError::ReplayDetected { .. })
        ));
    }

    #[test]
    fn software_transform_is_refused() {
        let key = sta_key().with_flags(KeyFlags::SW_ALL);
        let mut frame = vec![0u8; 24];
        assert_eq!(
            Wapi.encap(&key, TxSeq::WapiIv(1), &mut frame, 24, false),
            Err(CipherError::UnsupportedOperation { cipher: CipherType::WapiSms4, op: "software encrypt" })
        );
    }
}
