//! Crypto engine facade: object lifecycle, policy parameters and key
//! management.
//!
//! Data-path, MMIE and element negotiation entry points live in their own
//! modules as further `impl CryptoEngine` blocks.
//!
//! # Scope selection
//!
//! A request addressed to a group MAC (broadcast or multicast) targets the
//! vdev's key store; any other MAC targets the store of the peer with that
//! address. IGTKs always live in the vdev store. FILS KEKs always live in a
//! peer store.
//!
//! # Port notifications
//!
//! Every successful key mutation is mirrored to the [`KeyInstallPort`] after
//! the scope lock has been released. Port failures are logged and ignored.

use std::sync::{Arc, MutexGuard};

use wlancrypt_crypto::{KEYIX_NONE, Key, KeyFlags, KeyRole, lookup};
use wlancrypt_proto::{CipherSet, CipherType, CryptoParams, MacAddr, ParamType};

use crate::{
    config::EngineConfig,
    error::{CryptoError, Result},
    keystore::Slot,
    objmgr::{CryptoState, Directory, OpMode, PeerRef, VdevId, VdevRef},
    port::{KeyInstallPort, KeyScope, NoopPort, log_failure},
    request::KeyRequest,
};

/// FILS KEK lengths (SHA-256 and SHA-384 AKMs).
const FILS_KEK_LENS: [usize; 2] = [32, 64];

/// Key store a request resolved to. Holds the guards for as long as the
/// request runs.
#[derive(Debug)]
pub(crate) enum Scope {
    Vdev(VdevRef),
    Peer { vdev: VdevRef, peer: PeerRef },
}

impl Scope {
    /// Group MACs select the vdev, anything else the peer with that address.
    pub(crate) fn resolve(vdev: &VdevRef, mac: MacAddr) -> Result<Self> {
        if mac.is_group() {
            return Ok(Self::Vdev(vdev.clone()));
        }
        Ok(Self::Peer { vdev: vdev.clone(), peer: vdev.resolve_peer(mac)? })
    }

    pub(crate) fn crypto(&self) -> MutexGuard<'_, CryptoState> {
        match self {
            Self::Vdev(vdev) => vdev.crypto(),
            Self::Peer { peer, .. } => peer.crypto(),
        }
    }

    pub(crate) fn vdev(&self) -> &VdevRef {
        match self {
            Self::Vdev(vdev) | Self::Peer { vdev, .. } => vdev,
        }
    }

    pub(crate) fn is_peer(&self) -> bool {
        matches!(self, Self::Peer { .. })
    }

    /// Vdev-wide scope of the same vdev.
    pub(crate) fn widen(&self) -> Self {
        Self::Vdev(self.vdev().clone())
    }

    pub(crate) fn port_scope(&self) -> KeyScope {
        match self {
            Self::Vdev(vdev) => KeyScope::Vdev(vdev.id()),
            Self::Peer { vdev, peer } => KeyScope::Peer { vdev: vdev.id(), mac: peer.mac() },
        }
    }

    /// Address reported to the port.
    pub(crate) fn mac(&self) -> MacAddr {
        match self {
            Self::Vdev(_) => MacAddr::BROADCAST,
            Self::Peer { peer, .. } => peer.mac(),
        }
    }
}

/// Link-layer crypto engine.
///
/// Owns every vdev, peer and key. All methods take `&self`; per-object
/// mutexes serialize state changes, and cipher transforms run outside them.
pub struct CryptoEngine {
    config: EngineConfig,
    directory: Directory,
    port: Arc<dyn KeyInstallPort>,
}

impl std::fmt::Debug for CryptoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoEngine")
            .field("config", &self.config)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl Default for CryptoEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CryptoEngine {
    /// Engine with no hardware behind it.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_port(config, Arc::new(NoopPort))
    }

    /// Engine mirroring key changes into `port`.
    pub fn with_port(config: EngineConfig, port: Arc<dyn KeyInstallPort>) -> Self {
        let directory = Directory::new(config.max_vdevs, config.max_peers_per_vdev);
        Self { config, directory, port }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Object lifecycle

    /// Create a vdev with empty policy and no keys.
    pub fn create_vdev(&self, id: VdevId, mac: MacAddr, opmode: OpMode) -> Result<VdevRef> {
        let vdev = self.directory.create_vdev(id, mac, opmode)?;
        tracing::debug!(vdev = id, %mac, ?opmode, "vdev created");
        Ok(vdev)
    }

    /// Look up a vdev.
    pub fn vdev(&self, id: VdevId) -> Result<VdevRef> {
        self.directory.resolve_vdev(id)
    }

    /// Look up a peer of a vdev.
    pub fn peer(&self, vdev: VdevId, mac: MacAddr) -> Result<PeerRef> {
        self.directory.resolve_vdev(vdev)?.resolve_peer(mac)
    }

    /// Tear a vdev down: every peer is destroyed and every key removed.
    pub fn destroy_vdev(&self, id: VdevId) -> Result<()> {
        let vdev = self.directory.remove_vdev(id)?;
        for peer in vdev.drain_peers() {
            self.purge(&Scope::Peer { vdev: vdev.clone(), peer });
        }
        self.purge(&Scope::Vdev(vdev));
        tracing::debug!(vdev = id, "vdev destroyed");
        Ok(())
    }

    /// Add a peer to a vdev.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` once the vdev holds `max_peers_per_vdev` peers.
    pub fn create_peer(&self, vdev: VdevId, mac: MacAddr) -> Result<PeerRef> {
        if mac.is_group() {
            return Err(CryptoError::InvalidParam { reason: "peer address is a group address" });
        }
        let peer = self.directory.resolve_vdev(vdev)?.add_peer(mac)?;
        tracing::debug!(vdev, %mac, "peer created");
        Ok(peer)
    }

    /// Remove a peer and every key it holds.
    pub fn destroy_peer(&self, vdev: VdevId, mac: MacAddr) -> Result<()> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        let peer = vdev.remove_peer(mac)?;
        self.purge(&Scope::Peer { vdev, peer });
        tracing::debug!(%mac, "peer destroyed");
        Ok(())
    }

    fn purge(&self, scope: &Scope) {
        let removed = scope.crypto().keys.clear();
        for key in &removed {
            log_failure(
                "delete_key",
                scope.port_scope(),
                self.port.delete_key(scope.port_scope(), key, scope.mac(), key.cipher()),
            );
        }
    }

    // Policy parameters

    /// Write one field of a vdev's policy.
    pub fn set_vdev_param(&self, vdev: VdevId, param: ParamType, value: u32) -> Result<()> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        vdev.crypto().params.set(param, value)?;
        Ok(())
    }

    /// Read one field of a vdev's policy.
    pub fn get_vdev_param(&self, vdev: VdevId, param: ParamType) -> Result<u32> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        let value = vdev.crypto().params.get(param);
        Ok(value)
    }

    /// Write one field of a peer's policy.
    pub fn set_peer_param(&self, vdev: VdevId, mac: MacAddr, param: ParamType, value: u32) -> Result<()> {
        let peer = self.peer(vdev, mac)?;
        peer.crypto().params.set(param, value)?;
        Ok(())
    }

    /// Read one field of a peer's policy.
    pub fn get_peer_param(&self, vdev: VdevId, mac: MacAddr, param: ParamType) -> Result<u32> {
        let peer = self.peer(vdev, mac)?;
        let value = peer.crypto().params.get(param);
        Ok(value)
    }

    /// Replace a vdev's whole policy.
    pub fn set_vdev_params(&self, vdev: VdevId, params: CryptoParams) -> Result<()> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        vdev.crypto().params = params;
        Ok(())
    }

    /// Copy of a vdev's policy.
    pub fn vdev_params(&self, vdev: VdevId) -> Result<CryptoParams> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        let params = vdev.crypto().params.clone();
        Ok(params)
    }

    /// Copy of a peer's negotiated policy.
    pub fn peer_params(&self, vdev: VdevId, mac: MacAddr) -> Result<CryptoParams> {
        let peer = self.peer(vdev, mac)?;
        let params = peer.crypto().params.clone();
        Ok(params)
    }

    /// Management frame protection is in use between the vdev and a peer.
    ///
    /// True when both sides advertise MFP, or the vdev requires it. Unknown
    /// vdevs and peers count as not protected.
    pub fn is_pmf_enabled(&self, vdev: VdevId, mac: MacAddr) -> bool {
        let Ok(vdev) = self.directory.resolve_vdev(vdev) else {
            return false;
        };
        let (vdev_capable, vdev_required) = {
            let state = vdev.crypto();
            (state.params.mfp_capable(), state.params.mfp_required())
        };
        if vdev_required {
            return true;
        }
        let peer_capable = vdev.resolve_peer(mac).is_ok_and(|peer| peer.crypto().params.mfp_capable());
        vdev_capable && peer_capable
    }

    // Key management

    /// Install a key.
    ///
    /// A group MAC installs into the vdev; any other MAC into that peer.
    /// BIP ciphers install as IGTKs (key ids 4 and 5) in the vdev. A
    /// zero-length key carrying `DEFAULT` with an explicit index only makes
    /// that slot the default.
    ///
    /// # Errors
    ///
    /// `InvalidKeyLength`, `InvalidKeyIndex`, `PeerNotFound`,
    /// `UnsupportedCipher` (unknown cipher, or one the scope's negotiated
    /// policy excludes).
    pub fn setkey(&self, vdev: VdevId, req: &KeyRequest) -> Result<()> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        if req.cipher == CipherType::FilsAead {
            return self.install_fils_kek(&vdev, req);
        }
        let ops = lookup(req.cipher)?;
        let igtk = req.cipher.is_mgmt();
        let scope = if igtk { Scope::Vdev(vdev.clone()) } else { Scope::resolve(&vdev, req.mac)? };

        if req.key.is_empty() && req.flags.contains(KeyFlags::DEFAULT) && !req.uses_default_index() {
            return self.set_default_in(&scope, req.key_index);
        }

        let key_index = scope.crypto().keys.resolve_index(req.key_index, igtk);
        match (Slot::of(key_index)?, igtk) {
            (Slot::Normal(_), false) | (Slot::Igtk(_), true) => {},
            _ => return Err(CryptoError::InvalidKeyIndex { index: key_index }),
        }

        let group = !scope.is_peer();
        {
            let state = scope.crypto();
            let allowed = if igtk {
                state.params.mgmt_cipher
            } else if group {
                state.params.mcast_cipher
            } else {
                state.params.ucast_ciphers
            };
            if !policy_allows(allowed, req.cipher) {
                return Err(CryptoError::UnsupportedCipher { cipher: req.cipher });
            }
        }

        let role = match (igtk, group) {
            (true, _) => KeyRole::Igtk,
            (false, true) => KeyRole::Group,
            (false, false) => KeyRole::Pairwise,
        };
        let mut flags = req.flags;
        if group {
            flags |= KeyFlags::GROUP;
        }
        if self.config.software_crypto {
            flags |= KeyFlags::SW_ALL;
        }
        if !ops.has_software_transform() {
            flags -= KeyFlags::SW_ALL;
        }

        let mut key = Key::new(req.cipher, role, key_index, req.key.clone())
            .with_flags(flags)
            .with_mac(scope.mac())
            .with_authenticator(vdev.opmode() == OpMode::Ap)
            .with_tsc(req.tsc)
            .with_rsc(req.rsc);
        ops.setkey(&mut key)?;

        let (installed, default_changed) = {
            let mut state = scope.crypto();
            let before = state.keys.def_tx_keyid();
            state.keys.install(key)?;
            let after = state.keys.def_tx_keyid();
            (state.keys.get(key_index)?.clone(), (before != after).then_some(after).flatten())
        };

        tracing::debug!(
            vdev = vdev.id(),
            mac = %scope.mac(),
            key_index,
            cipher = req.cipher.name(),
            ?role,
            "key installed"
        );
        self.notify_set(&scope, &installed);
        if let Some(index) = default_changed {
            self.notify_default(&scope, index);
        }
        Ok(())
    }

    fn install_fils_kek(&self, vdev: &VdevRef, req: &KeyRequest) -> Result<()> {
        if req.mac.is_group() {
            return Err(CryptoError::InvalidParam { reason: "FILS keys are per peer" });
        }
        if !FILS_KEK_LENS.contains(&req.key.len()) {
            return Err(CryptoError::InvalidKeyLength { cipher: req.cipher, len: req.key.len() });
        }
        let scope = Scope::resolve(vdev, req.mac)?;
        let kek = Key::new(CipherType::FilsAead, KeyRole::FilsKek, 0, req.key.clone()).with_mac(req.mac);
        scope.crypto().keys.set_fils_kek(kek.clone());
        tracing::debug!(vdev = vdev.id(), mac = %req.mac, "FILS AEAD enabled");
        self.notify_set(&scope, &kek);
        Ok(())
    }

    /// Copy an installed key out (driver resync). `KEYIX_NONE` reads the
    /// default key.
    pub fn getkey(&self, vdev: VdevId, mac: MacAddr, key_index: u16) -> Result<KeyRequest> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        let scope = self.scope_for_index(&vdev, mac, key_index)?;
        let state = scope.crypto();
        let key_index = state.keys.resolve_index(key_index, false);
        state.keys.get(key_index).map(KeyRequest::from_key)
    }

    /// Remove a key.
    ///
    /// # Errors
    ///
    /// `InvalidKeyIndex` if `key_index` is outside both the normal and the
    /// IGTK ranges; nothing is touched in that case.
    pub fn delkey(&self, vdev: VdevId, mac: MacAddr, key_index: u16) -> Result<()> {
        Slot::of(key_index)?;
        let vdev = self.directory.resolve_vdev(vdev)?;
        let scope = self.scope_for_index(&vdev, mac, key_index)?;

        let (removed, default_changed) = {
            let mut state = scope.crypto();
            let before = state.keys.def_tx_keyid();
            let removed = state.keys.delete(key_index)?;
            let after = state.keys.def_tx_keyid();
            (removed, (before != after).then_some(after).flatten())
        };

        tracing::debug!(vdev = vdev.id(), mac = %scope.mac(), key_index, "key deleted");
        log_failure(
            "delete_key",
            scope.port_scope(),
            self.port.delete_key(scope.port_scope(), &removed, scope.mac(), removed.cipher()),
        );
        if let Some(index) = default_changed {
            self.notify_default(&scope, index);
        }
        Ok(())
    }

    /// Make `key_index` the default transmit key of the peer (`unicast`) or
    /// of the vdev.
    pub fn default_key(&self, vdev: VdevId, mac: MacAddr, key_index: u16, unicast: bool) -> Result<()> {
        let vdev = self.directory.resolve_vdev(vdev)?;
        let scope = if unicast {
            Scope::Peer { vdev: vdev.clone(), peer: vdev.resolve_peer(mac)? }
        } else {
            Scope::Vdev(vdev.clone())
        };
        self.set_default_in(&scope, key_index)
    }

    fn set_default_in(&self, scope: &Scope, key_index: u16) -> Result<()> {
        scope.crypto().keys.set_default(key_index)?;
        tracing::debug!(vdev = scope.vdev().id(), mac = %scope.mac(), key_index, "default key set");
        self.notify_default(scope, key_index);
        Ok(())
    }

    /// IGTK ids always resolve to the vdev store.
    fn scope_for_index(&self, vdev: &VdevRef, mac: MacAddr, key_index: u16) -> Result<Scope> {
        if key_index != KEYIX_NONE && matches!(Slot::of(key_index)?, Slot::Igtk(_)) {
            return Ok(Scope::Vdev(vdev.clone()));
        }
        Scope::resolve(vdev, mac)
    }

    fn notify_set(&self, scope: &Scope, key: &Key) {
        log_failure(
            "set_key",
            scope.port_scope(),
            self.port.set_key(scope.port_scope(), key, scope.mac(), key.cipher()),
        );
    }

    fn notify_default(&self, scope: &Scope, key_index: u16) {
        log_failure(
            "set_default_key",
            scope.port_scope(),
            self.port.set_default_key(scope.port_scope(), key_index, scope.mac()),
        );
    }
}

/// An empty class set means nothing was negotiated and anything goes.
fn policy_allows(allowed: CipherSet, cipher: CipherType) -> bool {
    allowed.is_empty() || allowed.allows(cipher)
}

#[cfg(test)]
mod tests {
    use wlancrypt_crypto::Pn48;
    use wlancrypt_proto::AkmSet;

    use super::*;

    const BSSID: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x01]);
    const STA: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x02]);

    fn engine() -> CryptoEngine {
        let engine = CryptoEngine::default();
        engine.create_vdev(0, BSSID, OpMode::Ap).unwrap();
        engine.create_peer(0, STA).unwrap();
        engine
    }

    fn ccmp(index: u16, mac: MacAddr) -> KeyRequest {
        KeyRequest::new(CipherType::AesCcm, index, mac, &[0x5a; 16]).unwrap()
    }

    #[test]
    fn group_mac_selects_vdev_scope() {
        let engine = engine();
        engine.setkey(0, &ccmp(1, MacAddr::BROADCAST)).unwrap();
        engine.setkey(0, &ccmp(0, STA)).unwrap();

        let group = engine.getkey(0, MacAddr::BROADCAST, 1).unwrap();
        assert!(group.flags.contains(KeyFlags::GROUP));
        let pairwise = engine.getkey(0, STA, 0).unwrap();
        assert!(!pairwise.flags.contains(KeyFlags::GROUP));
        assert_eq!(engine.getkey(0, STA, 1).unwrap_err(), CryptoError::KeyNotFound { index: Some(1) });
    }

    #[test]
    fn software_flags_follow_config() {
        let engine = engine();
        engine.setkey(0, &ccmp(0, STA)).unwrap();
        assert!(engine.getkey(0, STA, 0).unwrap().flags.contains(KeyFlags::SW_ALL));

        let offload = CryptoEngine::new(EngineConfig::offload());
        offload.create_vdev(0, BSSID, OpMode::Sta).unwrap();
        offload.setkey(0, &ccmp(0, MacAddr::BROADCAST)).unwrap();
        let key = offload.getkey(0, MacAddr::BROADCAST, 0).unwrap();
        assert!(!key.flags.intersects(KeyFlags::SW_ALL));
    }

    #[test]
    fn key_length_is_checked() {
        let engine = engine();
        let req = KeyRequest::new(CipherType::AesCcm, 0, STA, &[0; 15]).unwrap();
        assert_eq!(
            engine.setkey(0, &req),
            Err(CryptoError::InvalidKeyLength { cipher: CipherType::AesCcm, len: 15 })
        );
    }

    #[test]
    fn sized_wep_key_length_is_checked() {
        let engine = engine();
        let req = KeyRequest::new(CipherType::Wep40, 0, MacAddr::BROADCAST, &[0x11; 13]).unwrap();
        assert_eq!(
            engine.setkey(0, &req),
            Err(CryptoError::InvalidKeyLength { cipher: CipherType::Wep40, len: 13 })
        );
        let req = KeyRequest::new(CipherType::Wep40, 0, MacAddr::BROADCAST, &[0x11; 5]).unwrap();
        engine.setkey(0, &req).unwrap();
    }

    #[test]
    fn unknown_peer() {
        let engine = engine();
        let stranger = MacAddr([0x02, 9, 9, 9, 9, 9]);
        assert_eq!(engine.setkey(0, &ccmp(0, stranger)), Err(CryptoError::PeerNotFound { mac: stranger }));
        assert_eq!(engine.setkey(7, &ccmp(0, STA)), Err(CryptoError::VdevNotFound { id: 7 }));
    }

    #[test]
    fn none_index_uses_default_slot() {
        let engine = engine();
        engine.setkey(0, &ccmp(KEYIX_NONE, STA)).unwrap();
        assert_eq!(engine.getkey(0, STA, KEYIX_NONE).unwrap().key_index, 0);
    }

    #[test]
    fn tsc_and_rsc_are_seeded() {
        let engine = engine();
        engine.setkey(0, &ccmp(0, STA).with_tsc(0x10).with_rsc(0x20)).unwrap();
        let key = engine.getkey(0, STA, 0).unwrap();
        assert_eq!((key.tsc, key.rsc), (0x10, 0x20));
        assert_eq!(Pn48::new(key.tsc).next().get(), 0x11);
    }

    #[test]
    fn negotiated_policy_gates_ciphers() {
        let engine = engine();
        engine.set_peer_param(0, STA, ParamType::UcastCipher, CipherSet::AES_CCM.bits()).unwrap();
        let tkip = KeyRequest::new(CipherType::Tkip, 0, STA, &[1; 32]).unwrap();
        assert_eq!(engine.setkey(0, &tkip), Err(CryptoError::UnsupportedCipher { cipher: CipherType::Tkip }));
        engine.setkey(0, &ccmp(0, STA)).unwrap();
    }

    #[test]
    fn igtk_lives_in_vdev_scope() {
        let engine = engine();
        let igtk = KeyRequest::new(CipherType::AesCmac, 4, STA, &[3; 16]).unwrap();
        engine.setkey(0, &igtk).unwrap();
        assert_eq!(engine.getkey(0, STA, 4).unwrap().cipher, CipherType::AesCmac);
        assert_eq!(engine.getkey(0, MacAddr::BROADCAST, 4).unwrap().key_index, 4);

        let misplaced = KeyRequest::new(CipherType::AesCmac, 1, MacAddr::BROADCAST, &[3; 16]).unwrap();
        assert_eq!(engine.setkey(0, &misplaced), Err(CryptoError::InvalidKeyIndex { index: 1 }));
        let data_in_igtk_slot = ccmp(5, MacAddr::BROADCAST);
        assert_eq!(engine.setkey(0, &data_in_igtk_slot), Err(CryptoError::InvalidKeyIndex { index: 5 }));
    }

    #[test]
    fn zero_length_default_request_only_repoints() {
        let engine = engine();
        engine.setkey(0, &ccmp(0, MacAddr::BROADCAST)).unwrap();
        engine.setkey(0, &ccmp(2, MacAddr::BROADCAST)).unwrap();
        engine
            .setkey(0, &KeyRequest::make_default(CipherType::AesCcm, 2, MacAddr::BROADCAST))
            .unwrap();
        let vdev = engine.vdev(0).unwrap();
        assert_eq!(vdev.crypto().keys.def_tx_keyid(), Some(2));
        assert_eq!(engine.getkey(0, MacAddr::BROADCAST, 2).unwrap().key.len(), 16);
    }

    #[test]
    fn delkey_out_of_range_touches_nothing() {
        let engine = engine();
        engine.setkey(0, &ccmp(0, STA)).unwrap();
        assert_eq!(engine.delkey(0, STA, 9), Err(CryptoError::InvalidKeyIndex { index: 9 }));
        assert!(engine.getkey(0, STA, 0).is_ok());
        engine.delkey(0, STA, 0).unwrap();
        assert_eq!(engine.delkey(0, STA, 0), Err(CryptoError::KeyNotFound { index: Some(0) }));
    }

    #[test]
    fn fils_kek_is_per_peer() {
        let engine = engine();
        let short = KeyRequest::new(CipherType::FilsAead, 0, STA, &[0; 16]).unwrap();
        assert!(matches!(engine.setkey(0, &short), Err(CryptoError::InvalidKeyLength { .. })));
        let group = KeyRequest::new(CipherType::FilsAead, 0, MacAddr::BROADCAST, &[0; 32]).unwrap();
        assert!(matches!(engine.setkey(0, &group), Err(CryptoError::InvalidParam { .. })));

        engine.setkey(0, &KeyRequest::new(CipherType::FilsAead, 0, STA, &[0; 64]).unwrap()).unwrap();
        assert!(engine.peer(0, STA).unwrap().crypto().keys.fils_aead_enabled());
    }

    #[test]
    fn pmf_rules() {
        let engine = engine();
        assert!(!engine.is_pmf_enabled(0, STA));
        engine.set_vdev_param(0, ParamType::RsnCap, 0x0080).unwrap();
        assert!(!engine.is_pmf_enabled(0, STA));
        engine.set_peer_param(0, STA, ParamType::RsnCap, 0x0080).unwrap();
        assert!(engine.is_pmf_enabled(0, STA));
        engine.set_peer_param(0, STA, ParamType::RsnCap, 0).unwrap();
        engine.set_vdev_param(0, ParamType::RsnCap, 0x00c0).unwrap();
        assert!(engine.is_pmf_enabled(0, STA));
        assert!(!engine.is_pmf_enabled(3, STA));
    }

    #[test]
    fn params_round_trip() {
        let engine = engine();
        engine.set_vdev_param(0, ParamType::KeyMgmt, AkmSet::PSK.bits()).unwrap();
        assert_eq!(engine.get_vdev_param(0, ParamType::KeyMgmt).unwrap(), AkmSet::PSK.bits());
        assert!(matches!(
            engine.set_vdev_param(0, ParamType::RsnCap, 0x1_0000),
            Err(CryptoError::InvalidParam { .. })
        ));
        assert!(matches!(ParamType::try_from(99).map_err(CryptoError::from), Err(CryptoError::InvalidParam { .. })));
    }

    #[test]
    fn destroying_a_peer_drops_its_keys() {
        let engine = engine();
        engine.setkey(0, &ccmp(0, STA)).unwrap();
        engine.destroy_peer(0, STA).unwrap();
        assert_eq!(engine.peer(0, STA).unwrap_err(), CryptoError::PeerNotFound { mac: STA });
        engine.destroy_vdev(0).unwrap();
        assert!(engine.vdev(0).is_err());
    }
}
