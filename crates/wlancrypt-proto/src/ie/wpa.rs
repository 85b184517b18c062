//! WPA vendor element (id 0xDD, OUI 00-50-F2 type 1).
//!
//! Same field order as RSN minus the PMKID and management-cipher tail. An
//! element carrying only the version defaults to TKIP/TKIP/802.1X.

use bytes::BufMut;

use super::{
    IE_VERSION, VENDOR_ELEMENT_ID, WPA_OUI_TYPE, begin_element, element_body, finish_element,
    group_data_cipher, known_selectors, reader::IeReader,
};
use crate::{
    errors::{ProtocolError, Result},
    params::{CryptoParams, RsnCaps},
    suite::{
        AkmSet, AkmSuite, AuthModeSet, CipherSet, CipherType, WPA_OUI, cipher_from_wpa_selector,
        wpa_cipher_selector,
    },
};

const ELEMENT: &str = "WPA";

/// Parse a WPA vendor element into policy parameters.
pub fn wpaie_check(ie: &[u8]) -> Result<CryptoParams> {
    let body = element_body(ie, VENDOR_ELEMENT_ID, ELEMENT)?;
    let mut r = IeReader::new(body, ELEMENT);

    let oui: [u8; 4] = r.array("missing OUI")?;
    if oui[..3] != WPA_OUI || oui[3] != WPA_OUI_TYPE {
        return Err(ProtocolError::malformed(ELEMENT, "not a WPA element"));
    }
    if r.u16_le("missing version")? != IE_VERSION {
        return Err(ProtocolError::malformed(ELEMENT, "unsupported version"));
    }

    let mut params = CryptoParams {
        auth_modes: AuthModeSet::WPA,
        mcast_cipher: CipherSet::TKIP,
        ucast_ciphers: CipherSet::TKIP,
        key_mgmt: AkmSet::IEEE8021X,
        ..CryptoParams::default()
    };
    if r.is_empty() {
        return Ok(params);
    }

    let group = r.selector("group cipher truncated")?;
    params.mcast_cipher = match cipher_from_wpa_selector(group) {
        Some(cipher) if cipher != CipherType::None => cipher.bit(),
        _ => return Err(ProtocolError::UnsupportedCipher { selector: group }),
    };
    if r.is_empty() {
        return Ok(params);
    }

    let list = r.selector_list("pairwise list truncated")?;
    let (ciphers, last) = known_selectors(&list, cipher_from_wpa_selector);
    if ciphers.is_empty() {
        return Err(ProtocolError::UnsupportedCipher { selector: last });
    }
    params.ucast_ciphers = ciphers.into_iter().map(CipherType::bit).collect();
    if r.is_empty() {
        return Ok(params);
    }

    let list = r.selector_list("AKM list truncated")?;
    let (akms, last) = known_selectors(&list, AkmSuite::from_wpa_selector);
    if akms.is_empty() {
        return Err(ProtocolError::UnsupportedAkm { selector: last });
    }
    params.key_mgmt = akms.into_iter().map(AkmSuite::bit).collect();

    if !r.is_empty() {
        params.rsn_caps = RsnCaps::from_bits_retain(r.u16_le("capabilities truncated")?);
    }
    Ok(params)
}

/// Serialize policy parameters as a WPA vendor element.
///
/// Capabilities are only emitted when non-zero. Generic WEP shares the
/// WEP-40 suite and parses back as WEP-40.
pub fn build_wpaie(params: &CryptoParams) -> Result<Vec<u8>> {
    let group = group_data_cipher(params.mcast_cipher)
        .and_then(wpa_cipher_selector)
        .ok_or(ProtocolError::InvalidParam("no WPA group cipher"))?;
    let mut pairwise: Vec<_> = params.ucast_ciphers.ciphers().filter_map(wpa_cipher_selector).collect();
    // WEP and WEP-40 are adjacent in set order and share a selector
    pairwise.dedup();
    if pairwise.is_empty() {
        return Err(ProtocolError::InvalidParam("no WPA pairwise cipher"));
    }
    let akms: Vec<_> = params.key_mgmt.suites().filter_map(AkmSuite::wpa_selector).collect();
    if akms.is_empty() {
        return Err(ProtocolError::InvalidParam("no WPA AKM suite"));
    }

    let mut out = Vec::with_capacity(32);
    let len_at = begin_element(&mut out, VENDOR_ELEMENT_ID);
    out.put_slice(&WPA_OUI);
    out.put_u8(WPA_OUI_TYPE);
    out.put_u16_le(IE_VERSION);
    out.put_slice(&group);
    out.put_u16_le(pairwise.len() as u16);
    pairwise.iter().for_each(|sel| out.put_slice(sel));
    out.put_u16_le(akms.len() as u16);
    akms.iter().for_each(|sel| out.put_slice(sel));
    if !params.rsn_caps.is_empty() {
        out.put_u16_le(params.rsn_caps.bits());
    }

    finish_element(&mut out, len_at)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ie(hex: &str) -> Vec<u8> {
        hex::decode(hex.replace(' ', "")).unwrap()
    }

    #[test]
    fn wpa_psk_tkip() {
        let params = wpaie_check(&ie(
            "DD 16 00 50 F2 01 01 00 00 50 F2 02 01 00 00 50 F2 02 01 00 00 50 F2 02",
        ))
        .unwrap();
        assert_eq!(params.auth_modes, AuthModeSet::WPA);
        assert_eq!(params.mcast_cipher, CipherSet::TKIP);
        assert_eq!(params.ucast_ciphers, CipherSet::TKIP);
        assert_eq!(params.key_mgmt, AkmSet::PSK);
    }

    #[test]
    fn blank_element_defaults_to_tkip() {
        let params = wpaie_check(&ie("DD 06 00 50 F2 01 01 00")).unwrap();
        assert_eq!(params.mcast_cipher, CipherSet::TKIP);
        assert_eq!(params.ucast_ciphers, CipherSet::TKIP);
        assert_eq!(params.key_mgmt, AkmSet::IEEE8021X);
    }

    #[test]
    fn wrong_oui_type_is_malformed() {
        assert!(matches!(
            wpaie_check(&ie("DD 06 00 50 F2 04 01 00")),
            Err(ProtocolError::MalformedIe { .. })
        ));
    }

    #[test]
    fn mixed_pairwise_keeps_both() {
        let params = wpaie_check(&ie(
            "DD 1A 00 50 F2 01 01 00 00 50 F2 02 02 00 00 50 F2 04 00 50 F2 02 01 00 00 50 F2 02",
        ))
        .unwrap();
        assert_eq!(params.ucast_ciphers, CipherSet::TKIP | CipherSet::AES_CCM);
    }

    #[test]
    fn generic_wep_is_advertised_as_wep40() {
        let params = CryptoParams {
            mcast_cipher: CipherSet::WEP,
            ucast_ciphers: CipherSet::WEP | CipherSet::WEP_40,
            key_mgmt: AkmSet::PSK,
            ..CryptoParams::default()
        };
        let built = build_wpaie(&params).unwrap();
        assert_eq!(
            built,
            ie("DD 16 00 50 F2 01 01 00 00 50 F2 01 01 00 00 50 F2 01 01 00 00 50 F2 02")
        );
        let parsed = wpaie_check(&built).unwrap();
        assert_eq!(parsed.mcast_cipher, CipherSet::WEP_40);
        assert_eq!(parsed.ucast_ciphers, CipherSet::WEP_40);
    }

    #[test]
    fn build_omits_zero_caps() {
        let params = CryptoParams {
            mcast_cipher: CipherSet::TKIP,
            ucast_ciphers: CipherSet::TKIP,
            key_mgmt: AkmSet::PSK,
            ..CryptoParams::default()
        };
        assert_eq!(
            build_wpaie(&params).unwrap(),
            ie("DD 16 00 50 F2 01 01 00 00 50 F2 02 01 00 00 50 F2 02 01 00 00 50 F2 02")
        );
    }
}
