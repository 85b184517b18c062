//! Security information element codec (RSN, WPA vendor, WAPI).
//!
//! Each family has a `*ie_check` parser that turns a complete element
//! (`[id][len][body]`) into [`CryptoParams`], and a `build_*ie` serializer
//! that goes the other way.
//!
//! # Invariants
//!
//! - A buffer shorter than `2 + len` is `MalformedIe`. Every prefix of a
//!   valid element is therefore rejected before any field is read.
//! - Each field is length-checked before it is read.
//! - Unknown pairwise/AKM selectors are skipped; a list with no known entry
//!   is `UnsupportedCipher`/`UnsupportedAkm`.
//! - Bytes after the last recognised field are ignored.
//!
//! # Security
//!
//! Elements come straight off the air from unauthenticated stations, so the
//! parsers never index without a prior length check and never allocate more
//! than the element length allows.

mod reader;
mod rsn;
mod wapi;
mod wpa;

pub use reader::SELECTOR_LEN;
pub use rsn::{build_rsnie, rsnie_check};
pub use wapi::{build_wapiie, wapiie_check};
pub use wpa::{build_wpaie, wpaie_check};

use bytes::BufMut;

use crate::{
    errors::{ProtocolError, Result},
    params::CryptoParams,
    suite::{CipherSet, CipherType, WPA_OUI},
};

/// RSN element id.
pub const RSN_ELEMENT_ID: u8 = 0x30;
/// Vendor-specific element id (carries WPA).
pub const VENDOR_ELEMENT_ID: u8 = 0xdd;
/// WAPI element id.
pub const WAPI_ELEMENT_ID: u8 = 0x44;
/// Element version accepted by all three families.
pub const IE_VERSION: u16 = 1;
/// WPA vendor OUI type.
pub const WPA_OUI_TYPE: u8 = 1;

/// Largest element body representable by the one-byte length field.
const MAX_BODY_LEN: usize = 255;

/// Security element family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IeKind {
    /// RSN (WPA2/WPA3)
    Rsn,
    /// WPA vendor element
    Wpa,
    /// WAPI
    Wapi,
}

impl IeKind {
    /// Classify an element by its id (and OUI for vendor elements).
    pub fn classify(ie: &[u8]) -> Option<Self> {
        match ie {
            [RSN_ELEMENT_ID, ..] => Some(Self::Rsn),
            [WAPI_ELEMENT_ID, ..] => Some(Self::Wapi),
            [VENDOR_ELEMENT_ID, _, a, b, c, WPA_OUI_TYPE, ..] if [*a, *b, *c] == WPA_OUI => {
                Some(Self::Wpa)
            },
            _ => None,
        }
    }

    /// Name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rsn => "RSN",
            Self::Wpa => "WPA",
            Self::Wapi => "WAPI",
        }
    }
}

/// Parse any supported security element.
pub fn check_ie(ie: &[u8]) -> Result<(IeKind, CryptoParams)> {
    let kind = IeKind::classify(ie)
        .ok_or(ProtocolError::malformed("security", "unrecognized element id"))?;
    let parsed = match kind {
        IeKind::Rsn => rsnie_check(ie),
        IeKind::Wpa => wpaie_check(ie),
        IeKind::Wapi => wapiie_check(ie),
    };
    match parsed {
        Ok(params) => Ok((kind, params)),
        Err(err) => {
            tracing::debug!(element = kind.name(), error = %err, "security element rejected");
            Err(err)
        },
    }
}

/// Serialize `params` as an element of the given family.
pub fn build_ie(kind: IeKind, params: &CryptoParams) -> Result<Vec<u8>> {
    match kind {
        IeKind::Rsn => build_rsnie(params),
        IeKind::Wpa => build_wpaie(params),
        IeKind::Wapi => build_wapiie(params),
    }
}

/// Validate the `[id][len]` header and return the declared body.
fn element_body<'a>(ie: &'a [u8], id: u8, element: &'static str) -> Result<&'a [u8]> {
    let [found, len, rest @ ..] = ie else {
        return Err(ProtocolError::malformed(element, "missing element header"));
    };
    if *found != id {
        return Err(ProtocolError::malformed(element, "wrong element id"));
    }
    rest.get(..usize::from(*len))
        .ok_or(ProtocolError::malformed(element, "declared length exceeds buffer"))
}

/// Start an element; returns the offset of the length byte.
fn begin_element(out: &mut Vec<u8>, id: u8) -> usize {
    out.put_u8(id);
    out.put_u8(0);
    out.len() - 1
}

/// Patch the length byte written by [`begin_element`].
fn finish_element(out: &mut [u8], len_at: usize) -> Result<()> {
    let body_len = out.len() - len_at - 1;
    if body_len > MAX_BODY_LEN {
        return Err(ProtocolError::InvalidParam("element body exceeds 255 bytes"));
    }
    out[len_at] = body_len as u8;
    Ok(())
}

/// Group data cipher to advertise, strongest first.
fn group_data_cipher(set: CipherSet) -> Option<CipherType> {
    const ORDER: [CipherType; 8] = [
        CipherType::AesGcm256,
        CipherType::AesCcm256,
        CipherType::AesGcm,
        CipherType::AesCcm,
        CipherType::Tkip,
        CipherType::Wep104,
        CipherType::Wep40,
        CipherType::Wep,
    ];
    ORDER.into_iter().find(|c| set.contains(c.bit()))
}

/// Parse a selector list, keeping known entries. Returns the last selector
/// seen so the caller can report it when nothing was recognised.
fn known_selectors<T>(
    list: &[[u8; SELECTOR_LEN]],
    lookup: impl Fn([u8; SELECTOR_LEN]) -> Option<T>,
) -> (Vec<T>, [u8; SELECTOR_LEN]) {
    let known = list.iter().filter_map(|sel| lookup(*sel)).collect();
    let last = list.last().copied().unwrap_or_default();
    (known, last)
}
