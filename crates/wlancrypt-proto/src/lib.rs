//! 802.11 Security Wire Formats
//!
//! Parsing and building of everything the link-layer crypto engine reads
//! off the air or hands to the MAC: the MAC header prefix, suite selectors,
//! RSN/WPA/WAPI information elements and the management MIC element.
//!
//! Nothing here touches key material. The policy type [`CryptoParams`] is
//! what the element parsers produce and the builders consume.
//!
//! # Security
//!
//! All parsers accept attacker-controlled bytes. They check every length
//! before reading and return [`ProtocolError`] instead of panicking.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod ie;
pub mod mac;
pub mod mmie;
pub mod params;
pub mod suite;

pub use errors::{ProtocolError, Result};
pub use ie::{
    IeKind, build_ie, build_rsnie, build_wapiie, build_wpaie, check_ie, rsnie_check,
    wapiie_check, wpaie_check,
};
pub use mac::{MacAddr, MacHeader};
pub use params::{CryptoParams, ParamType, RsnCaps};
pub use suite::{AkmSet, AkmSuite, AuthModeSet, CipherSet, CipherType};
