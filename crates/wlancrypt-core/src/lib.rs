//! 802.11 Link-Layer Crypto Engine
//!
//! The facade the rest of a WLAN stack talks to: it owns vdevs, peers and
//! their keys, installs keys on request, protects and verifies data frames,
//! adds and checks MMIEs, and negotiates security elements.
//!
//! # Architecture
//!
//! ```text
//!            ┌─────────────────── CryptoEngine ───────────────────┐
//!  setkey ──►│ Directory ─► Vdev { CryptoState } ─► Peer { .. }    │──► KeyInstallPort
//!  encap  ──►│      snapshot key under lock, transform outside     │
//!  decap  ──►│      commit PN under lock after verification        │
//!            └────────────────────────┬────────────────────────────┘
//!                                     ▼
//!                     wlancrypt_crypto::lookup(cipher)
//! ```
//!
//! # Security
//!
//! - Per-vdev and per-peer mutexes; no cipher transform runs under a lock.
//! - Replay counters move only after a frame verified.
//! - Hardware programming is best-effort and never rolls software state
//!   back.
//! - Errors for which [`CryptoError::is_frame_drop`] holds must lead to a
//!   silent drop.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
mod datapath;
mod engine;
pub mod error;
pub mod keystore;
mod mmie;
pub mod negotiate;
pub mod objmgr;
pub mod port;
pub mod request;

pub use config::EngineConfig;
pub use engine::CryptoEngine;
pub use error::{CryptoError, Result};
pub use keystore::KeyStore;
pub use objmgr::{OpMode, PeerRef, VdevId, VdevRef};
pub use port::{KeyInstallPort, KeyScope, NoopPort, PortError};
pub use request::KeyRequest;
