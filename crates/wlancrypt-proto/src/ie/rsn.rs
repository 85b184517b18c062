//! RSN element (id 0x30).
//!
//! ```text
//! version(2) group(4) [pcount(2) pairwise(4*n) [acount(2) akm(4*n)
//!   [caps(2) [pmkid-count(2) pmkid(16*n) [mgmt-group(4)]]]]]
//! ```
//!
//! An element that stops right after the version (or after the group
//! cipher) takes the WPA2 defaults for everything missing: CCMP-128 and
//! IEEE 802.1X.

use bytes::BufMut;

use super::{
    IE_VERSION, RSN_ELEMENT_ID, begin_element, element_body, finish_element, group_data_cipher,
    known_selectors, reader::IeReader,
};
use crate::{
    errors::{ProtocolError, Result},
    params::{CryptoParams, PMKID_LEN, RsnCaps},
    suite::{
        AkmSet, AkmSuite, AuthModeSet, CipherSet, CipherType, cipher_from_rsn_selector,
        rsn_cipher_selector,
    },
};

const ELEMENT: &str = "RSN";

/// Parse an RSN element into policy parameters.
///
/// # Errors
///
/// - `MalformedIe` on truncation, a bad version or an empty suite list
/// - `UnsupportedCipher` if the group cipher or every pairwise cipher is
///   unknown, or the management cipher is not a BIP suite
/// - `UnsupportedAkm` if every AKM is unknown
pub fn rsnie_check(ie: &[u8]) -> Result<CryptoParams> {
    let body = element_body(ie, RSN_ELEMENT_ID, ELEMENT)?;
    let mut r = IeReader::new(body, ELEMENT);

    let version = r.u16_le("missing version")?;
    if version != IE_VERSION {
        return Err(ProtocolError::malformed(ELEMENT, "unsupported version"));
    }

    let mut params = CryptoParams {
        auth_modes: AuthModeSet::RSNA,
        mcast_cipher: CipherSet::AES_CCM,
        ucast_ciphers: CipherSet::AES_CCM,
        key_mgmt: AkmSet::IEEE8021X,
        ..CryptoParams::default()
    };
    if r.is_empty() {
        return Ok(params);
    }

    let group = r.selector("group cipher truncated")?;
    params.mcast_cipher = match cipher_from_rsn_selector(group) {
        Some(cipher) if !cipher.is_mgmt() && cipher != CipherType::None => cipher.bit(),
        _ => return Err(ProtocolError::UnsupportedCipher { selector: group }),
    };
    if r.is_empty() {
        return Ok(params);
    }

    let list = r.selector_list("pairwise list truncated")?;
    let (ciphers, last) = known_selectors(&list, |sel| {
        cipher_from_rsn_selector(sel).filter(|c| !c.is_mgmt())
    });
    if ciphers.is_empty() {
        return Err(ProtocolError::UnsupportedCipher { selector: last });
    }
    params.ucast_ciphers = ciphers.into_iter().map(CipherType::bit).collect();
    if r.is_empty() {
        return Ok(params);
    }

    let list = r.selector_list("AKM list truncated")?;
    let (akms, last) = known_selectors(&list, AkmSuite::from_rsn_selector);
    if akms.is_empty() {
        return Err(ProtocolError::UnsupportedAkm { selector: last });
    }
    params.key_mgmt = akms.into_iter().map(AkmSuite::bit).collect();
    if r.is_empty() {
        return Ok(params);
    }

    params.rsn_caps = RsnCaps::from_bits_retain(r.u16_le("capabilities truncated")?);

    if r.remaining() >= 2 {
        let count = usize::from(r.u16_le("PMKID count truncated")?);
        if r.remaining() < count * PMKID_LEN {
            return Err(ProtocolError::malformed(ELEMENT, "PMKID list truncated"));
        }
        params.pmkids = (0..count)
            .map(|_| r.array::<PMKID_LEN>("PMKID list truncated"))
            .collect::<Result<_>>()?;
    }

    if params.mfp_capable() {
        params.mgmt_cipher = if r.remaining() >= 4 {
            let sel = r.selector("management cipher truncated")?;
            match cipher_from_rsn_selector(sel) {
                Some(cipher) if cipher.is_mgmt() => cipher.bit(),
                _ => return Err(ProtocolError::UnsupportedCipher { selector: sel }),
            }
        } else {
            CipherSet::AES_CMAC
        };
    }

    Ok(params)
}

/// Serialize policy parameters as an RSN element.
///
/// Capabilities are always emitted. The PMKID list is emitted when
/// non-empty or when a management cipher follows it.
///
/// Generic WEP has no suite of its own and is written as WEP-40 (suite 1),
/// so it parses back as WEP-40. A set holding both yields one selector.
///
/// # Errors
///
/// `InvalidParam` if no group cipher, pairwise cipher or AKM can be
/// expressed, or the body would exceed 255 bytes.
pub fn build_rsnie(params: &CryptoParams) -> Result<Vec<u8>> {
    let group = group_data_cipher(params.mcast_cipher)
        .and_then(rsn_cipher_selector)
        .ok_or(ProtocolError::InvalidParam("no RSN group cipher"))?;
    let mut pairwise: Vec<_> = params
        .ucast_ciphers
        .ciphers()
        .filter(|c| !c.is_mgmt())
        .filter_map(rsn_cipher_selector)
        .collect();
    pairwise.dedup();
    if pairwise.is_empty() {
        return Err(ProtocolError::InvalidParam("no RSN pairwise cipher"));
    }
    let akms: Vec<_> = params.key_mgmt.suites().filter_map(AkmSuite::rsn_selector).collect();
    if akms.is_empty() {
        return Err(ProtocolError::InvalidParam("no RSN AKM suite"));
    }
    let mgmt = params
        .mgmt_cipher
        .ciphers()
        .find(|c| c.is_mgmt())
        .and_then(rsn_cipher_selector)
        .filter(|_| params.mfp_capable());

    let mut out = Vec::with_capacity(64);
    let len_at = begin_element(&mut out, RSN_ELEMENT_ID);
    out.put_u16_le(IE_VERSION);
    out.put_slice(&group);
    out.put_u16_le(pairwise.len() as u16);
    pairwise.iter().for_each(|sel| out.put_slice(sel));
    out.put_u16_le(akms.len() as u16);
    akms.iter().for_each(|sel| out.put_slice(sel));
    out.put_u16_le(params.rsn_caps.bits());

    if mgmt.is_some() || !params.pmkids.is_empty() {
        out.put_u16_le(params.pmkids.len() as u16);
        params.pmkids.iter().for_each(|id| out.put_slice(id));
    }
    if let Some(sel) = mgmt {
        out.put_slice(&sel);
    }

    finish_element(&mut out, len_at)?;
    Ok(out)
}
