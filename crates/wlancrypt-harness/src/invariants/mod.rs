//! Invariant checking for engine state.
//!
//! Invariants are properties of the key stores and the object directory
//! that must hold after every operation, whatever sequence of operations
//! led there. They run against an [`EngineSnapshot`] rather than the live
//! engine so a check never takes a key store lock or a guard of its own.
//!
//! ```text
//!   CryptoEngine ──capture──► EngineSnapshot ──► SingleDefaultKey
//!                                             ├─► DefaultNamesInstalledSlot
//!                                             └─► ReferencesReleased
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = EngineSnapshot::capture(&engine.vdev(0)?);
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

use wlancrypt_proto::MacAddr;

pub use checks::{DefaultNamesInstalledSlot, ReferencesReleased, SingleDefaultKey};
pub use snapshot::{EngineSnapshot, KeyStoreSnapshot, PeerSnapshot, SlotSnapshot};

/// Outcome of one invariant against one snapshot.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant, with the store it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Peer whose state broke it, or `None` for the vdev itself
    pub owner: Option<MacAddr>,
    /// What was observed
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(mac) => write!(f, "{} on peer {mac}: {}", self.invariant, self.message),
            None => write!(f, "{} on vdev: {}", self.invariant, self.message),
        }
    }
}

impl std::error::Error for Violation {}

/// A property checked against an [`EngineSnapshot`].
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a captured state.
    fn check(&self, state: &EngineSnapshot) -> InvariantResult;

    /// Violation of this invariant attributed to `owner`.
    fn violation(&self, owner: Option<MacAddr>, message: String) -> Violation {
        Violation { invariant: self.name(), owner, message }
    }
}

/// Ordered set of invariants run together after each step.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with nothing to check.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`SingleDefaultKey`], [`DefaultNamesInstalledSlot`] and
    /// [`ReferencesReleased`].
    pub fn standard() -> Self {
        Self::new().with(SingleDefaultKey).with(DefaultNamesInstalledSlot).with(ReferencesReleased)
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with<I: Invariant + 'static>(mut self, invariant: I) -> Self {
        self.add(invariant);
        self
    }

    /// Register another invariant.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every invariant; all violations are reported, not just the first.
    pub fn check_all(&self, state: &EngineSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.invariants.iter().filter_map(|invariant| invariant.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Like [`check_all`](Self::check_all), but panics with `context` and
    /// every violation.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, state: &EngineSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
            panic!("invariant violation {context}:\n  {}", lines.join("\n  "));
        }
    }

    /// Names of the registered invariants, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|invariant| invariant.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_runs_in_order() {
        assert_eq!(
            InvariantRegistry::standard().names(),
            ["single_default_key", "default_names_installed_slot", "references_released"]
        );
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        assert!(InvariantRegistry::standard().check_all(&EngineSnapshot::empty()).is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let state = EngineSnapshot {
            extra_vdev_refs: 2,
            vdev_keys: KeyStoreSnapshot { slots: Vec::new(), def_tx_keyid: Some(1) },
            peers: Vec::new(),
        };
        let violations = InvariantRegistry::standard().check_all(&state).unwrap_err();
        let names: Vec<_> = violations.iter().map(|v| v.invariant).collect();
        assert_eq!(names, ["single_default_key", "default_names_installed_slot", "references_released"]);
        assert_eq!(
            violations[1].to_string(),
            "default_names_installed_slot on vdev: def_tx_keyid Some(1) with filled slots []"
        );
    }
}
