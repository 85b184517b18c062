//! Vdev/peer directory.
//!
//! Every vdev and peer owns one [`CryptoState`] behind its own mutex. Lookups
//! hand out [`VdevRef`]/[`PeerRef`] guards: each guard counts as one
//! outstanding reference and gives it back when dropped, so early returns
//! cannot leak a reference.
//!
//! ```text
//! Directory ──► Vdev { crypto: Mutex<CryptoState>, peers }
//!                            └──► Peer { crypto: Mutex<CryptoState> }
//! ```
//!
//! # Invariants
//!
//! - `ref_count()` equals the number of live guards for that object.
//! - A vdev never holds more than `max_peers` peers.
//! - Lock order is vdev peers map, then vdev crypto, then peer crypto. No
//!   path holds two crypto locks at once.

use std::{
    collections::HashMap,
    ops::Deref,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use wlancrypt_proto::{CryptoParams, MacAddr};

use crate::{
    error::{CryptoError, Result},
    keystore::KeyStore,
};

/// Vdev identifier.
pub type VdevId = u8;

/// Operating mode of a vdev.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpMode {
    /// Station (supplicant)
    Sta,
    /// Access point (authenticator)
    Ap,
}

/// Policy and keys of one vdev or peer.
#[derive(Debug, Default)]
pub struct CryptoState {
    /// Offered (vdev) or negotiated (peer) policy
    pub params: CryptoParams,
    /// Installed keys
    pub keys: KeyStore,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// One associated station (or the AP, seen from a station).
#[derive(Debug)]
pub struct Peer {
    mac: MacAddr,
    vdev: VdevId,
    crypto: Mutex<CryptoState>,
    refs: AtomicUsize,
}

impl Peer {
    /// Peer address.
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Owning vdev.
    pub fn vdev_id(&self) -> VdevId {
        self.vdev
    }

    /// Lock the peer's crypto state.
    pub fn crypto(&self) -> MutexGuard<'_, CryptoState> {
        lock(&self.crypto)
    }

    /// Outstanding guards.
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }
}

/// One virtual interface.
#[derive(Debug)]
pub struct Vdev {
    id: VdevId,
    mac: MacAddr,
    opmode: OpMode,
    max_peers: usize,
    crypto: Mutex<CryptoState>,
    peers: RwLock<HashMap<MacAddr, Arc<Peer>>>,
    refs: AtomicUsize,
}

impl Vdev {
    /// Vdev id.
    pub fn id(&self) -> VdevId {
        self.id
    }

    /// Own address (BSSID on an AP).
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Operating mode.
    pub fn opmode(&self) -> OpMode {
        self.opmode
    }

    /// Lock the vdev's crypto state.
    pub fn crypto(&self) -> MutexGuard<'_, CryptoState> {
        lock(&self.crypto)
    }

    /// Outstanding guards.
    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Number of peers.
    pub fn peer_count(&self) -> usize {
        read(&self.peers).len()
    }

    /// Look up a peer by address.
    ///
    /// # Errors
    ///
    /// `PeerNotFound` if no peer with that address exists.
    pub fn resolve_peer(&self, mac: MacAddr) -> Result<PeerRef> {
        read(&self.peers).get(&mac).cloned().map(PeerRef::new).ok_or(CryptoError::PeerNotFound { mac })
    }

    /// Call `f` with a guard for every peer. The peer map is snapshotted
    /// first, so `f` may add or remove peers.
    pub fn iterate_peers(&self, mut f: impl FnMut(&PeerRef)) {
        let peers: Vec<PeerRef> = read(&self.peers).values().cloned().map(PeerRef::new).collect();
        for peer in &peers {
            f(peer);
        }
    }

    pub(crate) fn add_peer(&self, mac: MacAddr) -> Result<PeerRef> {
        let mut peers = write(&self.peers);
        if peers.contains_key(&mac) {
            return Err(CryptoError::AlreadyExists { what: "peer" });
        }
        if peers.len() >= self.max_peers {
            return Err(CryptoError::OutOfMemory { what: "peer table" });
        }
        let peer = Arc::new(Peer {
            mac,
            vdev: self.id,
            crypto: Mutex::new(CryptoState::default()),
            refs: AtomicUsize::new(0),
        });
        peers.insert(mac, Arc::clone(&peer));
        Ok(PeerRef::new(peer))
    }

    pub(crate) fn remove_peer(&self, mac: MacAddr) -> Result<PeerRef> {
        write(&self.peers).remove(&mac).map(PeerRef::new).ok_or(CryptoError::PeerNotFound { mac })
    }

    pub(crate) fn drain_peers(&self) -> Vec<PeerRef> {
        write(&self.peers).drain().map(|(_, peer)| PeerRef::new(peer)).collect()
    }
}

/// Counted reference to a [`Vdev`].
#[derive(Debug)]
pub struct VdevRef {
    inner: Arc<Vdev>,
}

impl VdevRef {
    fn new(inner: Arc<Vdev>) -> Self {
        inner.refs.fetch_add(1, Ordering::AcqRel);
        Self { inner }
    }
}

impl Clone for VdevRef {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.inner))
    }
}

impl Drop for VdevRef {
    fn drop(&mut self) {
        self.inner.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Deref for VdevRef {
    type Target = Vdev;

    fn deref(&self) -> &Vdev {
        &self.inner
    }
}

/// Counted reference to a [`Peer`].
#[derive(Debug)]
pub struct PeerRef {
    inner: Arc<Peer>,
}

impl PeerRef {
    fn new(inner: Arc<Peer>) -> Self {
        inner.refs.fetch_add(1, Ordering::AcqRel);
        Self { inner }
    }
}

impl Clone for PeerRef {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.inner))
    }
}

impl Drop for PeerRef {
    fn drop(&mut self) {
        self.inner.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Deref for PeerRef {
    type Target = Peer;

    fn deref(&self) -> &Peer {
        &self.inner
    }
}

/// All vdevs of the engine.
#[derive(Debug)]
pub struct Directory {
    vdevs: RwLock<HashMap<VdevId, Arc<Vdev>>>,
    max_vdevs: usize,
    max_peers: usize,
}

impl Directory {
    /// Empty directory with the given capacity limits.
    pub fn new(max_vdevs: usize, max_peers: usize) -> Self {
        Self { vdevs: RwLock::new(HashMap::new()), max_vdevs, max_peers }
    }

    /// Register a vdev.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` for a duplicate id, `OutOfMemory` past `max_vdevs`.
    pub(crate) fn create_vdev(&self, id: VdevId, mac: MacAddr, opmode: OpMode) -> Result<VdevRef> {
        let mut vdevs = write(&self.vdevs);
        if vdevs.contains_key(&id) {
            return Err(CryptoError::AlreadyExists { what: "vdev" });
        }
        if vdevs.len() >= self.max_vdevs {
            return Err(CryptoError::OutOfMemory { what: "vdev table" });
        }
        let vdev = Arc::new(Vdev {
            id,
            mac,
            opmode,
            max_peers: self.max_peers,
            crypto: Mutex::new(CryptoState::default()),
            peers: RwLock::new(HashMap::new()),
            refs: AtomicUsize::new(0),
        });
        vdevs.insert(id, Arc::clone(&vdev));
        Ok(VdevRef::new(vdev))
    }

    /// Look up a vdev.
    ///
    /// # Errors
    ///
    /// `VdevNotFound` for an unknown id.
    pub fn resolve_vdev(&self, id: VdevId) -> Result<VdevRef> {
        read(&self.vdevs).get(&id).cloned().map(VdevRef::new).ok_or(CryptoError::VdevNotFound { id })
    }

    pub(crate) fn remove_vdev(&self, id: VdevId) -> Result<VdevRef> {
        write(&self.vdevs).remove(&id).map(VdevRef::new).ok_or(CryptoError::VdevNotFound { id })
    }

    /// Number of vdevs.
    pub fn vdev_count(&self) -> usize {
        read(&self.vdevs).len()
    }
}
