//! Key store invariants.

use super::{EngineSnapshot, Invariant, InvariantResult};

/// At most one key per store carries `DEFAULT`, and it is the key
/// `def_tx_keyid` names.
pub struct SingleDefaultKey;

impl Invariant for SingleDefaultKey {
    fn name(&self) -> &'static str {
        "single_default_key"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        for (owner, store) in state.stores() {
            let flagged: Vec<u16> =
                store.slots.iter().filter(|slot| slot.default_flag).map(|slot| slot.key_index).collect();
            let expected: Vec<u16> = store.def_tx_keyid.into_iter().collect();
            if flagged != expected {
                return Err(self.violation(
                    owner,
                    format!("DEFAULT on {flagged:?}, def_tx_keyid {:?}", store.def_tx_keyid),
                ));
            }
        }
        Ok(())
    }
}

/// `def_tx_keyid` is unset exactly when no slot is filled, and otherwise
/// names a filled slot.
pub struct DefaultNamesInstalledSlot;

impl Invariant for DefaultNamesInstalledSlot {
    fn name(&self) -> &'static str {
        "default_names_installed_slot"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        for (owner, store) in state.stores() {
            let ok = match store.def_tx_keyid {
                None => store.slots.is_empty(),
                Some(id) => store.slots.iter().any(|slot| slot.key_index == id),
            };
            if !ok {
                let filled: Vec<u16> = store.slots.iter().map(|slot| slot.key_index).collect();
                return Err(self.violation(
                    owner,
                    format!("def_tx_keyid {:?} with filled slots {filled:?}", store.def_tx_keyid),
                ));
            }
        }
        Ok(())
    }
}

/// No vdev or peer guard outlives the operation that took it.
pub struct ReferencesReleased;

impl Invariant for ReferencesReleased {
    fn name(&self) -> &'static str {
        "references_released"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        if state.extra_vdev_refs != 0 {
            return Err(self.violation(None, format!("{} guards outstanding", state.extra_vdev_refs)));
        }
        if let Some(peer) = state.peers.iter().find(|peer| peer.extra_refs != 0) {
            return Err(self.violation(Some(peer.mac), format!("{} guards outstanding", peer.extra_refs)));
        }
        Ok(())
    }
}
