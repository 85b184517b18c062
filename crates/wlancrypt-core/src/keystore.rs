//! Per-scope key slots.
//!
//! A [`KeyStore`] lives inside every vdev and every peer. It holds four
//! pairwise/group slots (key ids 0-3), two IGTK slots (key ids 4 and 5) and
//! an optional FILS KEK.
//!
//! # Invariants
//!
//! - `def_tx_keyid` is `None` exactly when no normal slot is filled, and
//!   otherwise names a filled slot.
//! - The `DEFAULT` flag is set on exactly the slot named by `def_tx_keyid`
//!   and on no other key in the store (IGTKs never carry it).
//! - `def_igtk_tx_keyid` follows the same rule for the IGTK slots.
//! - Every install stamps its slot with a fresh generation, so a key that
//!   was replaced since it was read can be told apart from its successor.

use wlancrypt_crypto::{Key, KeyFlags, MAX_IGTK_KEY_IDX, MAX_KEY_IDX};

use crate::error::{CryptoError, Result};

/// Key id of the first IGTK slot.
pub const IGTK_BASE: u16 = MAX_KEY_IDX;

const NORMAL_SLOTS: usize = MAX_KEY_IDX as usize;
const IGTK_SLOTS: usize = MAX_IGTK_KEY_IDX as usize;

/// Which array a key id addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Pairwise/group slot 0-3
    Normal(usize),
    /// IGTK slot; key id 4 is `Igtk(0)`
    Igtk(usize),
}

impl Slot {
    /// Route a key id to its array.
    ///
    /// # Errors
    ///
    /// `InvalidKeyIndex` for ids outside both ranges.
    pub fn of(key_index: u16) -> Result<Self> {
        if key_index < MAX_KEY_IDX {
            Ok(Self::Normal(usize::from(key_index)))
        } else if key_index < IGTK_BASE + MAX_IGTK_KEY_IDX {
            Ok(Self::Igtk(usize::from(key_index - IGTK_BASE)))
        } else {
            Err(CryptoError::InvalidKeyIndex { index: key_index })
        }
    }

    fn key_index(self) -> u16 {
        match self {
            Self::Normal(i) => i as u16,
            Self::Igtk(i) => IGTK_BASE + i as u16,
        }
    }

    fn position(self) -> usize {
        match self {
            Self::Normal(i) => i,
            Self::Igtk(i) => NORMAL_SLOTS + i,
        }
    }
}

/// Key slots of one vdev or peer.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: [Option<Key>; NORMAL_SLOTS],
    igtk_keys: [Option<Key>; IGTK_SLOTS],
    def_tx_keyid: Option<u16>,
    def_igtk_tx_keyid: Option<u16>,
    fils_kek: Option<Key>,
    generations: [u64; NORMAL_SLOTS + IGTK_SLOTS],
    next_generation: u64,
}

impl KeyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_ref(&self, slot: Slot) -> Option<&Key> {
        match slot {
            Slot::Normal(i) => self.keys[i].as_ref(),
            Slot::Igtk(i) => self.igtk_keys[i].as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Key> {
        match slot {
            Slot::Normal(i) => &mut self.keys[i],
            Slot::Igtk(i) => &mut self.igtk_keys[i],
        }
    }

    /// Key at `key_index`.
    ///
    /// # Errors
    ///
    /// `InvalidKeyIndex` out of range, `KeyNotFound` for an empty slot.
    pub fn get(&self, key_index: u16) -> Result<&Key> {
        self.slot_ref(Slot::of(key_index)?)
            .ok_or(CryptoError::KeyNotFound { index: Some(key_index) })
    }

    /// Mutable key at `key_index`.
    pub fn get_mut(&mut self, key_index: u16) -> Result<&mut Key> {
        self.slot_mut(Slot::of(key_index)?)
            .as_mut()
            .ok_or(CryptoError::KeyNotFound { index: Some(key_index) })
    }

    /// Generation stamped on the key at `key_index` when it was installed.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn generation(&self, key_index: u16) -> Result<u64> {
        let slot = Slot::of(key_index)?;
        self.slot_ref(slot).ok_or(CryptoError::KeyNotFound { index: Some(key_index) })?;
        Ok(self.generations[slot.position()])
    }

    /// Mutable key at `key_index`, provided it is still the key installed
    /// at `generation`.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if the slot was emptied or re-keyed since.
    pub fn get_current_mut(&mut self, key_index: u16, generation: u64) -> Result<&mut Key> {
        let slot = Slot::of(key_index)?;
        if self.generations[slot.position()] != generation {
            return Err(CryptoError::KeyNotFound { index: Some(key_index) });
        }
        self.get_mut(key_index)
    }

    /// Map `KEYIX_NONE` to the default id of the matching array (slot 0 or
    /// the first IGTK slot when nothing is installed yet).
    pub fn resolve_index(&self, key_index: u16, igtk: bool) -> u16 {
        if key_index != wlancrypt_crypto::KEYIX_NONE {
            return key_index;
        }
        if igtk {
            self.def_igtk_tx_keyid.unwrap_or(IGTK_BASE)
        } else {
            self.def_tx_keyid.unwrap_or(0)
        }
    }

    /// Install `key` in the slot named by its key index, replacing any
    /// previous key. Returns the replaced key.
    ///
    /// The first key of an array, a key carrying `DEFAULT`, or a key
    /// replacing the current default becomes the default.
    pub fn install(&mut self, mut key: Key) -> Result<Option<Key>> {
        let slot = Slot::of(key.key_index())?;
        let wants_default = key.flags().contains(KeyFlags::DEFAULT);
        key.set_flags(key.flags() - KeyFlags::DEFAULT);
        self.next_generation += 1;
        self.generations[slot.position()] = self.next_generation;

        match slot {
            Slot::Normal(_) => {
                let idx = slot.key_index();
                let take_default =
                    wants_default || self.def_tx_keyid.is_none() || self.def_tx_keyid == Some(idx);
                let old = self.slot_mut(slot).replace(key);
                if take_default {
                    self.mark_default(idx);
                }
                Ok(old)
            },
            Slot::Igtk(_) => {
                let idx = slot.key_index();
                let old = self.slot_mut(slot).replace(key);
                if wants_default || self.def_igtk_tx_keyid.is_none() {
                    self.def_igtk_tx_keyid = Some(idx);
                }
                Ok(old)
            },
        }
    }

    /// Remove and return the key at `key_index`, re-pointing the default to
    /// the lowest remaining slot.
    pub fn delete(&mut self, key_index: u16) -> Result<Key> {
        let slot = Slot::of(key_index)?;
        let key = self
            .slot_mut(slot)
            .take()
            .ok_or(CryptoError::KeyNotFound { index: Some(key_index) })?;

        match slot {
            Slot::Normal(_) => {
                if self.def_tx_keyid == Some(key_index) {
                    self.def_tx_keyid = None;
                    if let Some(next) = self.keys.iter().position(Option::is_some) {
                        self.mark_default(next as u16);
                    }
                }
            },
            Slot::Igtk(_) => {
                if self.def_igtk_tx_keyid == Some(key_index) {
                    self.def_igtk_tx_keyid = self
                        .igtk_keys
                        .iter()
                        .position(Option::is_some)
                        .map(|i| IGTK_BASE + i as u16);
                }
            },
        }
        Ok(key)
    }

    /// Make the filled slot `key_index` the default transmit key.
    ///
    /// # Errors
    ///
    /// `InvalidKeyIndex` if the index is out of range or the slot is empty.
    pub fn set_default(&mut self, key_index: u16) -> Result<()> {
        let slot = Slot::of(key_index)?;
        if self.slot_ref(slot).is_none() {
            return Err(CryptoError::InvalidKeyIndex { index: key_index });
        }
        match slot {
            Slot::Normal(_) => self.mark_default(key_index),
            Slot::Igtk(_) => self.def_igtk_tx_keyid = Some(key_index),
        }
        Ok(())
    }

    fn mark_default(&mut self, key_index: u16) {
        for (i, key) in self.keys.iter_mut().enumerate() {
            if let Some(key) = key {
                let mut flags = key.flags();
                flags.set(KeyFlags::DEFAULT, i as u16 == key_index);
                key.set_flags(flags);
            }
        }
        self.def_tx_keyid = Some(key_index);
    }

    /// Default pairwise/group transmit key id.
    pub fn def_tx_keyid(&self) -> Option<u16> {
        self.def_tx_keyid
    }

    /// Default IGTK key id (4 or 5).
    pub fn def_igtk_tx_keyid(&self) -> Option<u16> {
        self.def_igtk_tx_keyid
    }

    /// Installed IGTKs in key id order. Each slot keeps its own cipher.
    pub fn igtks(&self) -> impl Iterator<Item = &Key> {
        self.igtk_keys.iter().flatten()
    }

    /// Default transmit key.
    pub fn default_tx_key_mut(&mut self) -> Option<&mut Key> {
        let idx = usize::from(self.def_tx_keyid?);
        self.keys[idx].as_mut()
    }

    /// Default transmit key.
    pub fn default_tx_key(&self) -> Option<&Key> {
        let idx = usize::from(self.def_tx_keyid?);
        self.keys[idx].as_ref()
    }

    /// Default IGTK.
    pub fn default_igtk_mut(&mut self) -> Option<&mut Key> {
        let idx = self.def_igtk_tx_keyid?;
        self.get_mut(idx).ok()
    }

    /// Pairwise/group slots in key id order.
    pub fn slots(&self) -> impl Iterator<Item = (u16, Option<&Key>)> {
        self.keys.iter().enumerate().map(|(i, key)| (i as u16, key.as_ref()))
    }

    /// Every installed key, IGTKs and FILS KEK included.
    pub fn installed(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().chain(&self.igtk_keys).chain(std::iter::once(&self.fils_kek)).flatten()
    }

    /// Install the FILS KEK, enabling FILS AEAD for the scope.
    pub fn set_fils_kek(&mut self, key: Key) -> Option<Key> {
        self.fils_kek.replace(key)
    }

    /// Whether FILS AEAD is active.
    pub fn fils_aead_enabled(&self) -> bool {
        self.fils_kek.is_some()
    }

    /// Remove every key (owner teardown).
    pub fn clear(&mut self) -> Vec<Key> {
        let drained = self
            .keys
            .iter_mut()
            .chain(&mut self.igtk_keys)
            .chain(std::iter::once(&mut self.fils_kek))
            .filter_map(Option::take)
            .collect();
        self.def_tx_keyid = None;
        self.def_igtk_tx_keyid = None;
        drained
    }
}

#[cfg(test)]
mod tests {
    use wlancrypt_crypto::{KeyMaterial, KeyRole};
    use wlancrypt_proto::CipherType;

    use super::*;

    fn key(index: u16, flags: KeyFlags) -> Key {
        let material = KeyMaterial::new(CipherType::AesCcm, &[index as u8; 16]).unwrap();
        Key::new(CipherType::AesCcm, KeyRole::Group, index, material).with_flags(flags)
    }

    fn igtk(index: u16) -> Key {
        let material = KeyMaterial::new(CipherType::AesCmac, &[0xaa; 16]).unwrap();
        Key::new(CipherType::AesCmac, KeyRole::Igtk, index, material)
    }

    fn defaults(store: &KeyStore) -> Vec<u16> {
        store
            .slots()
            .filter_map(|(i, k)| k.filter(|k| k.flags().contains(KeyFlags::DEFAULT)).map(|_| i))
            .collect()
    }

    #[test]
    fn slot_routing() {
        assert_eq!(Slot::of(3).unwrap(), Slot::Normal(3));
        assert_eq!(Slot::of(4).unwrap(), Slot::Igtk(0));
        assert_eq!(Slot::of(5).unwrap(), Slot::Igtk(1));
        assert_eq!(Slot::of(6), Err(CryptoError::InvalidKeyIndex { index: 6 }));
        assert_eq!(Slot::of(9), Err(CryptoError::InvalidKeyIndex { index: 9 }));
    }

    #[test]
    fn first_key_becomes_default() {
        let mut store = KeyStore::new();
        assert_eq!(store.def_tx_keyid(), None);
        store.install(key(2, KeyFlags::empty())).unwrap();
        assert_eq!(store.def_tx_keyid(), Some(2));
        store.install(key(1, KeyFlags::empty())).unwrap();
        assert_eq!(store.def_tx_keyid(), Some(2));
        assert_eq!(defaults(&store), [2]);
    }

    #[test]
    fn default_flag_takes_over() {
        let mut store = KeyStore::new();
        store.install(key(0, KeyFlags::empty())).unwrap();
        store.install(key(3, KeyFlags::DEFAULT)).unwrap();
        assert_eq!(store.def_tx_keyid(), Some(3));
        assert_eq!(defaults(&store), [3]);
    }

    #[test]
    fn deleting_default_repoints_to_lowest() {
        let mut store = KeyStore::new();
        store.install(key(1, KeyFlags::empty())).unwrap();
        store.install(key(3, KeyFlags::empty())).unwrap();
        store.install(key(2, KeyFlags::DEFAULT)).unwrap();
        store.delete(2).unwrap();
        assert_eq!(store.def_tx_keyid(), Some(1));
        assert_eq!(defaults(&store), [1]);
        store.delete(1).unwrap();
        store.delete(3).unwrap();
        assert_eq!(store.def_tx_keyid(), None);
        assert!(defaults(&store).is_empty());
    }

    #[test]
    fn set_default_requires_filled_slot() {
        let mut store = KeyStore::new();
        store.install(key(0, KeyFlags::empty())).unwrap();
        assert_eq!(store.set_default(1), Err(CryptoError::InvalidKeyIndex { index: 1 }));
        assert_eq!(store.set_default(8), Err(CryptoError::InvalidKeyIndex { index: 8 }));
        assert_eq!(store.def_tx_keyid(), Some(0));
    }

    #[test]
    fn igtk_slots_are_separate() {
        let mut store = KeyStore::new();
        store.install(key(0, KeyFlags::empty())).unwrap();
        store.install(igtk(5)).unwrap();
        assert_eq!(store.def_igtk_tx_keyid(), Some(5));
        assert_eq!(store.igtks().map(Key::cipher).collect::<Vec<_>>(), [CipherType::AesCmac]);
        assert_eq!(store.def_tx_keyid(), Some(0));
        assert_eq!(store.default_igtk_mut().unwrap().key_index(), 5);

        store.delete(5).unwrap();
        assert_eq!(store.def_igtk_tx_keyid(), None);
        assert_eq!(store.igtks().count(), 0);
    }

    #[test]
    fn igtk_slots_keep_their_own_cipher() {
        let mut store = KeyStore::new();
        store.install(igtk(4)).unwrap();
        let material = KeyMaterial::new(CipherType::AesGmac256, &[0xbb; 32]).unwrap();
        store.install(Key::new(CipherType::AesGmac256, KeyRole::Igtk, 5, material)).unwrap();

        let ciphers: Vec<_> = store.igtks().map(|k| (k.key_index(), k.cipher())).collect();
        assert_eq!(ciphers, [(4, CipherType::AesCmac), (5, CipherType::AesGmac256)]);
        // the later install did not take the default
        assert_eq!(store.def_igtk_tx_keyid(), Some(4));
        store.delete(4).unwrap();
        assert_eq!(store.def_igtk_tx_keyid(), Some(5));
        assert_eq!(store.get(5).unwrap().cipher(), CipherType::AesGmac256);
    }

    #[test]
    fn rekey_invalidates_the_old_generation() {
        let mut store = KeyStore::new();
        store.install(key(1, KeyFlags::empty())).unwrap();
        let old = store.generation(1).unwrap();
        assert!(store.get_current_mut(1, old).is_ok());

        store.install(key(1, KeyFlags::empty())).unwrap();
        let new = store.generation(1).unwrap();
        assert_ne!(old, new);
        assert_eq!(
            store.get_current_mut(1, old).unwrap_err(),
            CryptoError::KeyNotFound { index: Some(1) }
        );
        assert!(store.get_current_mut(1, new).is_ok());

        store.delete(1).unwrap();
        assert_eq!(store.generation(1), Err(CryptoError::KeyNotFound { index: Some(1) }));
        assert!(store.get_current_mut(1, new).is_err());
    }

    #[test]
    fn none_index_resolves_to_default() {
        let mut store = KeyStore::new();
        assert_eq!(store.resolve_index(wlancrypt_crypto::KEYIX_NONE, false), 0);
        assert_eq!(store.resolve_index(wlancrypt_crypto::KEYIX_NONE, true), IGTK_BASE);
        store.install(key(2, KeyFlags::empty())).unwrap();
        assert_eq!(store.resolve_index(wlancrypt_crypto::KEYIX_NONE, false), 2);
        assert_eq!(store.resolve_index(1, false), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = KeyStore::new();
        store.install(key(0, KeyFlags::empty())).unwrap();
        store.install(igtk(4)).unwrap();
        assert_eq!(store.clear().len(), 2);
        assert_eq!(store.installed().count(), 0);
        assert_eq!(store.def_tx_keyid(), None);
    }
}
