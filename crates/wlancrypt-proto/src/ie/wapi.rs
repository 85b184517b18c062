//! WAPI element (id 0x44).
//!
//! Field order differs from RSN: AKM list first, then the unicast list,
//! then a single multicast cipher and the capability field. The BKID list
//! that may follow is not used.

use bytes::BufMut;

use super::{
    IE_VERSION, WAPI_ELEMENT_ID, begin_element, element_body, finish_element, known_selectors,
    reader::IeReader,
};
use crate::{
    errors::{ProtocolError, Result},
    params::{CryptoParams, RsnCaps},
    suite::{
        AkmSuite, AuthModeSet, CipherSet, CipherType, cipher_from_wapi_selector,
        wapi_cipher_selector,
    },
};

const ELEMENT: &str = "WAPI";

/// Smallest body holding one AKM, one unicast cipher, the group cipher and
/// capabilities.
pub const WAPI_MIN_BODY_LEN: usize = 20;

/// Parse a WAPI element into policy parameters.
pub fn wapiie_check(ie: &[u8]) -> Result<CryptoParams> {
    let body = element_body(ie, WAPI_ELEMENT_ID, ELEMENT)?;
    if body.len() < WAPI_MIN_BODY_LEN {
        return Err(ProtocolError::malformed(ELEMENT, "shorter than minimum length"));
    }
    let mut r = IeReader::new(body, ELEMENT);

    if r.u16_le("missing version")? != IE_VERSION {
        return Err(ProtocolError::malformed(ELEMENT, "unsupported version"));
    }

    let list = r.selector_list("AKM list truncated")?;
    let (akms, last) = known_selectors(&list, AkmSuite::from_wapi_selector);
    if akms.is_empty() {
        return Err(ProtocolError::UnsupportedAkm { selector: last });
    }

    let list = r.selector_list("unicast list truncated")?;
    let (ciphers, last) = known_selectors(&list, cipher_from_wapi_selector);
    if ciphers.is_empty() {
        return Err(ProtocolError::UnsupportedCipher { selector: last });
    }

    let group = r.selector("multicast cipher truncated")?;
    let Some(group_cipher) = cipher_from_wapi_selector(group) else {
        return Err(ProtocolError::UnsupportedCipher { selector: group });
    };
    let caps = r.u16_le("capabilities truncated")?;

    Ok(CryptoParams {
        auth_modes: AuthModeSet::WAPI,
        key_mgmt: akms.into_iter().map(AkmSuite::bit).collect(),
        ucast_ciphers: ciphers.into_iter().map(CipherType::bit).collect(),
        mcast_cipher: group_cipher.bit(),
        rsn_caps: RsnCaps::from_bits_retain(caps),
        ..CryptoParams::default()
    })
}

/// Serialize policy parameters as a WAPI element.
pub fn build_wapiie(params: &CryptoParams) -> Result<Vec<u8>> {
    let akms: Vec<_> = params.key_mgmt.suites().filter_map(AkmSuite::wapi_selector).collect();
    if akms.is_empty() {
        return Err(ProtocolError::InvalidParam("no WAPI AKM suite"));
    }
    let unicast: Vec<_> = params.ucast_ciphers.ciphers().filter_map(wapi_cipher_selector).collect();
    if unicast.is_empty() {
        return Err(ProtocolError::InvalidParam("no WAPI unicast cipher"));
    }
    let group = params
        .mcast_cipher
        .ciphers()
        .find_map(wapi_cipher_selector)
        .ok_or(ProtocolError::InvalidParam("no WAPI multicast cipher"))?;

    let mut out = Vec::with_capacity(2 + WAPI_MIN_BODY_LEN);
    let len_at = begin_element(&mut out, WAPI_ELEMENT_ID);
    out.put_u16_le(IE_VERSION);
    out.put_u16_le(akms.len() as u16);
    akms.iter().for_each(|sel| out.put_slice(sel));
    out.put_u16_le(unicast.len() as u16);
    unicast.iter().for_each(|sel| out.put_slice(sel));
    out.put_slice(&group);
    out.put_u16_le(params.rsn_caps.bits());

    finish_element(&mut out, len_at)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::AkmSet;

    const WAPI_PSK: &str = "44 14 01 00 01 00 00 14 72 02 01 00 00 14 72 01 00 14 72 01 00 00";

    fn ie(hex: &str) -> Vec<u8> {
        hex::decode(hex.replace(' ', "")).unwrap()
    }

    #[test]
    fn wapi_psk() {
        let params = wapiie_check(&ie(WAPI_PSK)).unwrap();
        assert_eq!(params.auth_modes, AuthModeSet::WAPI);
        assert_eq!(params.key_mgmt, AkmSet::WAPI_PSK);
        assert_eq!(params.ucast_ciphers, CipherSet::WAPI_SMS4);
        assert_eq!(params.mcast_cipher, CipherSet::WAPI_SMS4);
    }

    #[test]
    fn short_body_is_rejected_up_front() {
        assert!(matches!(
            wapiie_check(&ie("44 04 01 00 01 00")),
            Err(ProtocolError::MalformedIe { reason: "shorter than minimum length", .. })
        ));
    }

    #[test]
    fn unknown_group_is_unsupported() {
        let bytes = ie("44 14 01 00 01 00 00 14 72 02 01 00 00 14 72 01 00 14 72 09 00 00");
        assert_eq!(
            wapiie_check(&bytes),
            Err(ProtocolError::UnsupportedCipher { selector: [0x00, 0x14, 0x72, 0x09] })
        );
    }

    #[test]
    fn build_reproduces_canonical_bytes() {
        let params = wapiie_check(&ie(WAPI_PSK)).unwrap();
        assert_eq!(build_wapiie(&params).unwrap(), ie(WAPI_PSK));
    }
}
