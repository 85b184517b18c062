//! 802.11 Link-Layer Cipher Suites
//!
//! Key objects and the per-cipher frame transforms used by the crypto
//! engine. Every transform takes a whole MPDU (`MAC header | body`) and
//! a snapshot of the key; none of them mutate shared state.
//!
//! ```text
//! registry::lookup(cipher) ──► &dyn CipherOps
//!                                 │
//!        ┌──────────┬─────────────┼─────────────┬──────────┐
//!       WEP       TKIP      CCMP-128/256   GCMP-128/256   WAPI
//!                                 │
//!                      BIP-CMAC/GMAC (MMIE only)
//! ```
//!
//! # Security
//!
//! Replay protection:
//! - `decap` checks the received PN against the key snapshot and returns it
//! - The caller commits the PN under its lock only after the frame verified
//! - Forged frames therefore never advance a counter
//!
//! Integrity:
//! - CCMP/GCMP/BIP tags and the TKIP ICV + Michael MIC are verified before
//!   any plaintext is returned
//! - The AAD masks retry-variable header bits so retransmissions verify
//!
//! Key hygiene:
//! - [`KeyMaterial`] is zeroized on drop and never printed by `Debug`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aad;
pub mod bip;
pub mod ccmp;
pub mod error;
pub mod framing;
pub mod gcmp;
pub mod key;
pub mod registry;
pub mod tkip;
pub mod wapi;
pub mod wep;

pub use error::{CipherError, Result};
pub use key::{
    KEYIX_NONE, Key, KeyFlags, KeyMaterial, KeyRole, MAX_IGTK_KEY_IDX, MAX_KEY_IDX, MAX_KEY_LEN,
    Pn48, RxSeq, TxSeq,
};
pub use registry::{CipherOps, lookup};
pub use tkip::{michael, tkip_decrypt, tkip_encrypt};
