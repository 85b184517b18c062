//! Applies model [`Operation`]s to a real [`CryptoEngine`].

use std::sync::Arc;

use wlancrypt_core::{CryptoEngine, CryptoError, EngineConfig, KeyInstallPort, KeyRequest, OpMode, VdevId};
use wlancrypt_crypto::{KEYIX_NONE, KeyFlags};
use wlancrypt_proto::{CipherType, MacAddr, mac::fc};

use crate::{
    frames::{FrameBuilder, key_bytes},
    invariants::EngineSnapshot,
    model::{ModelCipher, Operation, OperationError, OperationResult},
};

/// Address of the driver's vdev (an AP).
pub const BSSID: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
/// Address of the driver's single peer.
pub const PEER: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x10]);
/// Vdev id used by the driver.
pub const VDEV: VdevId = 0;

impl ModelCipher {
    /// Engine cipher and key length.
    pub fn cipher(self) -> (CipherType, usize) {
        match self {
            Self::Ccmp => (CipherType::AesCcm, 16),
            Self::Ccmp256 => (CipherType::AesCcm256, 32),
            Self::Gcmp => (CipherType::AesGcm, 16),
        }
    }
}

impl From<CryptoError> for OperationError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyIndex { .. } => Self::InvalidKeyIndex,
            CryptoError::KeyNotFound { .. } => Self::KeyNotFound,
            _ => Self::Other,
        }
    }
}

fn result(outcome: wlancrypt_core::Result<()>) -> OperationResult {
    match outcome {
        Ok(()) => OperationResult::Ok,
        Err(err) => OperationResult::Error(err.into()),
    }
}

/// An AP vdev with one associated peer, driven by model operations.
#[derive(Debug)]
pub struct EngineDriver {
    engine: CryptoEngine,
}

impl EngineDriver {
    /// Software-crypto engine with no hardware port.
    pub fn new() -> wlancrypt_core::Result<Self> {
        Self::with_engine(CryptoEngine::new(EngineConfig::default()))
    }

    /// Engine mirroring keys into `port`.
    pub fn with_port(port: Arc<dyn KeyInstallPort>) -> wlancrypt_core::Result<Self> {
        Self::with_engine(CryptoEngine::with_port(EngineConfig::default(), port))
    }

    fn with_engine(engine: CryptoEngine) -> wlancrypt_core::Result<Self> {
        engine.create_vdev(VDEV, BSSID, OpMode::Ap)?;
        engine.create_peer(VDEV, PEER)?;
        Ok(Self { engine })
    }

    /// The engine under test.
    pub fn engine(&self) -> &CryptoEngine {
        &self.engine
    }

    /// Capture the vdev and its peer.
    pub fn snapshot(&self) -> wlancrypt_core::Result<EngineSnapshot> {
        Ok(EngineSnapshot::capture(&self.engine.vdev(VDEV)?))
    }

    fn target(peer: bool) -> MacAddr {
        if peer { PEER } else { MacAddr::BROADCAST }
    }

    /// Apply `op` to the engine.
    pub fn apply(&self, op: &Operation) -> OperationResult {
        match op {
            Operation::SetKey { slot, peer, default, cipher, seed } => {
                let (cipher, len) = cipher.cipher();
                let extra = if *default { KeyFlags::DEFAULT } else { KeyFlags::empty() };
                result(self.install(cipher, u16::from(slot % 4), Self::target(*peer), len, *seed, extra))
            },
            Operation::SetDefaultSlotKey { peer, seed } => {
                result(self.install(CipherType::AesCcm, KEYIX_NONE, Self::target(*peer), 16, *seed, KeyFlags::empty()))
            },
            Operation::DelKey { slot, peer } => {
                result(self.engine.delkey(VDEV, Self::target(*peer), u16::from(slot % 8)))
            },
            Operation::DefaultKey { slot, peer } => {
                result(self.engine.default_key(VDEV, Self::target(*peer), u16::from(slot % 4), *peer))
            },
            Operation::SetIgtk { slot, seed } => {
                let key_index = 4 + u16::from(slot % 2);
                result(self.install(CipherType::AesCmac, key_index, MacAddr::BROADCAST, 16, *seed, KeyFlags::empty()))
            },
            Operation::SendRecv { peer, payload } => result(self.send_recv(*peer, &payload.to_bytes())),
            Operation::ProtectMgmt => result(self.protect_mgmt()),
        }
    }

    fn install(
        &self,
        cipher: CipherType,
        key_index: u16,
        mac: MacAddr,
        len: usize,
        seed: u8,
        extra: KeyFlags,
    ) -> wlancrypt_core::Result<()> {
        let req = KeyRequest::new(cipher, key_index, mac, &key_bytes(u64::from(seed), len))?;
        let flags = req.flags | extra;
        self.engine.setkey(VDEV, &req.with_flags(flags))
    }

    /// Encrypt `body` toward the peer (or as a group frame) and decrypt it
    /// on the same engine.
    pub fn send_recv(&self, peer: bool, body: &[u8]) -> wlancrypt_core::Result<()> {
        let builder = FrameBuilder::data_from_ap(Self::target(peer), BSSID);
        let plain = builder.build(body);
        let mut frame = plain.clone();
        self.engine.encap(VDEV, Self::target(peer), &mut frame)?;
        let rx_from = if peer { PEER } else { BSSID };
        self.engine.decap(VDEV, rx_from, &mut frame)?;
        if frame != plain {
            return Err(CryptoError::MalformedFrame { reason: "loopback changed the frame".to_owned() });
        }
        Ok(())
    }

    /// Add an MMIE to a broadcast deauth and verify it.
    pub fn protect_mgmt(&self) -> wlancrypt_core::Result<()> {
        let mut frame = FrameBuilder::mgmt(fc::STYPE_DEAUTH, MacAddr::BROADCAST, BSSID).build(&[0x07, 0x00]);
        self.engine.add_mmie(VDEV, &mut frame)?;
        self.engine.verify_mmie(VDEV, &frame)?;
        Ok(())
    }
}
