//! Reference model of the key stores of one vdev and one peer.
//!
//! The model only tracks which slots are filled and which one is the
//! default. It knows nothing about ciphers or counters, which keeps it small
//! enough to be obviously right.

mod operation;

pub use operation::{ModelCipher, Operation, OperationError, OperationResult, SmallPayload};

use crate::invariants::{KeyStoreSnapshot, SlotSnapshot};

const NORMAL_SLOTS: usize = 4;
const IGTK_BASE: u16 = 4;

/// Slots of one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelKeyStore {
    filled: [bool; NORMAL_SLOTS],
    default: Option<u16>,
}

impl ModelKeyStore {
    fn install(&mut self, idx: u16, wants_default: bool) {
        self.filled[usize::from(idx)] = true;
        if wants_default || self.default.is_none() || self.default == Some(idx) {
            self.default = Some(idx);
        }
    }

    fn delete(&mut self, idx: u16) -> OperationResult {
        if !self.filled[usize::from(idx)] {
            return OperationResult::Error(OperationError::KeyNotFound);
        }
        self.filled[usize::from(idx)] = false;
        if self.default == Some(idx) {
            self.default = self.filled.iter().position(|f| *f).map(|i| i as u16);
        }
        OperationResult::Ok
    }

    fn set_default(&mut self, idx: u16) -> OperationResult {
        if !self.filled[usize::from(idx)] {
            return OperationResult::Error(OperationError::InvalidKeyIndex);
        }
        self.default = Some(idx);
        OperationResult::Ok
    }

    /// Expected snapshot of the real store.
    pub fn snapshot(&self) -> KeyStoreSnapshot {
        let slots = (0..NORMAL_SLOTS as u16)
            .filter(|&i| self.filled[usize::from(i)])
            .map(|key_index| SlotSnapshot { key_index, default_flag: self.default == Some(key_index) })
            .collect();
        KeyStoreSnapshot { slots, def_tx_keyid: self.default }
    }
}

/// Model of a vdev with one peer.
#[derive(Debug, Clone, Default)]
pub struct ModelEngine {
    vdev: ModelKeyStore,
    peer: ModelKeyStore,
    igtk: [bool; 2],
    igtk_default: Option<u16>,
}

impl ModelEngine {
    /// Empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vdev store.
    pub fn vdev(&self) -> &ModelKeyStore {
        &self.vdev
    }

    /// Peer store.
    pub fn peer(&self) -> &ModelKeyStore {
        &self.peer
    }

    fn store(&mut self, peer: bool) -> &mut ModelKeyStore {
        if peer { &mut self.peer } else { &mut self.vdev }
    }

    /// Apply an operation and return the expected result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::SetKey { slot, peer, default, .. } => {
                self.store(*peer).install(u16::from(slot % 4), *default);
                OperationResult::Ok
            },
            Operation::SetDefaultSlotKey { peer, .. } => {
                let store = self.store(*peer);
                let idx = store.default.unwrap_or(0);
                store.install(idx, false);
                OperationResult::Ok
            },
            Operation::DelKey { slot, peer } => {
                let idx = u16::from(slot % 8);
                match idx {
                    0..=3 => self.store(*peer).delete(idx),
                    4 | 5 => self.delete_igtk(idx),
                    _ => OperationResult::Error(OperationError::InvalidKeyIndex),
                }
            },
            Operation::DefaultKey { slot, peer } => self.store(*peer).set_default(u16::from(slot % 4)),
            Operation::SetIgtk { slot, .. } => {
                let idx = IGTK_BASE + u16::from(slot % 2);
                self.igtk[usize::from(idx - IGTK_BASE)] = true;
                self.igtk_default.get_or_insert(idx);
                OperationResult::Ok
            },
            Operation::SendRecv { peer, .. } => {
                let store = if *peer { &self.peer } else { &self.vdev };
                if store.default.is_some() {
                    OperationResult::Ok
                } else {
                    OperationResult::Error(OperationError::KeyNotFound)
                }
            },
            Operation::ProtectMgmt => {
                if self.igtk_default.is_some() {
                    OperationResult::Ok
                } else {
                    OperationResult::Error(OperationError::KeyNotFound)
                }
            },
        }
    }

    fn delete_igtk(&mut self, idx: u16) -> OperationResult {
        let slot = usize::from(idx - IGTK_BASE);
        if !self.igtk[slot] {
            return OperationResult::Error(OperationError::KeyNotFound);
        }
        self.igtk[slot] = false;
        if self.igtk_default == Some(idx) {
            self.igtk_default = self.igtk.iter().position(|f| *f).map(|i| IGTK_BASE + i as u16);
        }
        OperationResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_key_becomes_default_and_delete_repoints() {
        let mut model = ModelEngine::new();
        let set = |slot| Operation::SetKey { slot, peer: true, default: false, cipher: ModelCipher::Ccmp, seed: 0 };
        assert_eq!(model.apply(&set(2)), OperationResult::Ok);
        assert_eq!(model.apply(&set(1)), OperationResult::Ok);
        assert_eq!(model.peer().snapshot().def_tx_keyid, Some(2));

        assert_eq!(model.apply(&Operation::DelKey { slot: 2, peer: true }), OperationResult::Ok);
        assert_eq!(model.peer().snapshot().def_tx_keyid, Some(1));
        assert_eq!(model.vdev().snapshot(), KeyStoreSnapshot::default());
    }

    #[test]
    fn invalid_and_empty_slots() {
        let mut model = ModelEngine::new();
        assert_eq!(
            model.apply(&Operation::DelKey { slot: 7, peer: false }),
            OperationResult::Error(OperationError::InvalidKeyIndex)
        );
        assert_eq!(
            model.apply(&Operation::DefaultKey { slot: 0, peer: false }),
            OperationResult::Error(OperationError::InvalidKeyIndex)
        );
        assert_eq!(
            model.apply(&Operation::DelKey { slot: 4, peer: true }),
            OperationResult::Error(OperationError::KeyNotFound)
        );
    }
}
