//! Observable engine state for invariant checks.

use wlancrypt_core::{KeyStore, VdevRef};
use wlancrypt_crypto::KeyFlags;
use wlancrypt_proto::MacAddr;

/// One filled key slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Key id
    pub key_index: u16,
    /// Whether the key carries the `DEFAULT` flag
    pub default_flag: bool,
}

/// Key slots of one vdev or peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStoreSnapshot {
    /// Filled pairwise/group slots in key id order
    pub slots: Vec<SlotSnapshot>,
    /// Default transmit key id
    pub def_tx_keyid: Option<u16>,
}

impl KeyStoreSnapshot {
    /// Capture a key store.
    pub fn from_store(store: &KeyStore) -> Self {
        let slots = store
            .slots()
            .filter_map(|(key_index, key)| {
                key.map(|key| SlotSnapshot {
                    key_index,
                    default_flag: key.flags().contains(KeyFlags::DEFAULT),
                })
            })
            .collect();
        Self { slots, def_tx_keyid: store.def_tx_keyid() }
    }
}

/// A peer as seen from its vdev.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    /// Peer address
    pub mac: MacAddr,
    /// Outstanding guards, excluding the one the snapshot held
    pub extra_refs: usize,
    /// Keys
    pub keys: KeyStoreSnapshot,
}

/// A vdev with all of its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Outstanding vdev guards, excluding the one the snapshot held
    pub extra_vdev_refs: usize,
    /// Vdev keys
    pub vdev_keys: KeyStoreSnapshot,
    /// Peers, sorted by address
    pub peers: Vec<PeerSnapshot>,
}

impl EngineSnapshot {
    /// Snapshot with no keys and no peers.
    pub fn empty() -> Self {
        Self { extra_vdev_refs: 0, vdev_keys: KeyStoreSnapshot::default(), peers: Vec::new() }
    }

    /// Capture a vdev. `vdev` must be the caller's only guard.
    pub fn capture(vdev: &VdevRef) -> Self {
        let vdev_keys = KeyStoreSnapshot::from_store(&vdev.crypto().keys);
        let mut peers = Vec::new();
        vdev.iterate_peers(|peer| {
            peers.push(PeerSnapshot {
                mac: peer.mac(),
                extra_refs: peer.ref_count().saturating_sub(1),
                keys: KeyStoreSnapshot::from_store(&peer.crypto().keys),
            });
        });
        peers.sort_by_key(|peer| peer.mac);
        Self { extra_vdev_refs: vdev.ref_count().saturating_sub(1), vdev_keys, peers }
    }

    /// Every key store in the snapshot.
    pub fn stores(&self) -> impl Iterator<Item = (Option<MacAddr>, &KeyStoreSnapshot)> {
        std::iter::once((None, &self.vdev_keys)).chain(self.peers.iter().map(|p| (Some(p.mac), &p.keys)))
    }
}
