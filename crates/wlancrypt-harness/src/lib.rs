//! Test harness for the wlancrypt engine.
//!
//! - [`port`]: key install ports that record or reject every call.
//! - [`frames`]: 802.11 frame builders, canned security elements and seeded
//!   key bytes.
//!
//! # Model-Based Testing
//!
//! The `model` module is a reference implementation of the key slots of a
//! vdev and one peer. [`EngineDriver`] applies the same operations to a real
//! engine, and tests compare results and observable slot state.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! operation. Use [`InvariantRegistry::standard()`] for the key store and
//! reference count invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod frames;
pub mod invariants;
pub mod model;
pub mod port;

pub use driver::{BSSID, EngineDriver, PEER, VDEV};
pub use frames::{FrameBuilder, WPA2_PSK_RSN_IE, WPA3_SAE_RSN_IE, WPA_PSK_TKIP_IE, key_bytes, payload};
pub use invariants::{
    DefaultNamesInstalledSlot, EngineSnapshot, Invariant, InvariantRegistry, InvariantResult,
    KeyStoreSnapshot, ReferencesReleased, SingleDefaultKey, Violation,
};
pub use model::{ModelCipher, ModelEngine, ModelKeyStore, Operation, OperationError, OperationResult, SmallPayload};
pub use port::{FailingPort, PortCall, RecordingPort};
