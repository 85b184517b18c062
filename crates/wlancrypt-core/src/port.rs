//! Boundary to the driver/firmware key cache.
//!
//! The engine calls the port after it has updated its own state. Port
//! failures are logged and never roll back or fail the request: the
//! software state is authoritative and hardware is best-effort.

use thiserror::Error;
use wlancrypt_crypto::Key;
use wlancrypt_proto::{CipherType, MacAddr};

use crate::objmgr::VdevId;

/// Which object a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// Vdev-wide: group keys, IGTKs, static WEP
    Vdev(VdevId),
    /// One peer of a vdev: pairwise and FILS keys
    Peer {
        /// Owning vdev
        vdev: VdevId,
        /// Peer address
        mac: MacAddr,
    },
}

/// Failure reported by a port implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("key install port failed: {reason}")]
pub struct PortError {
    /// Driver-supplied description
    pub reason: String,
}

/// Programs keys into the device.
pub trait KeyInstallPort: Send + Sync {
    /// A key was installed or replaced.
    fn set_key(&self, scope: KeyScope, key: &Key, mac: MacAddr, cipher: CipherType) -> Result<(), PortError>;

    /// A key was removed.
    fn delete_key(&self, scope: KeyScope, key: &Key, mac: MacAddr, cipher: CipherType) -> Result<(), PortError>;

    /// The default transmit key of a scope changed.
    fn set_default_key(&self, scope: KeyScope, key_index: u16, mac: MacAddr) -> Result<(), PortError>;
}

/// Port for software-only operation: accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPort;

impl KeyInstallPort for NoopPort {
    fn set_key(&self, _: KeyScope, _: &Key, _: MacAddr, _: CipherType) -> Result<(), PortError> {
        Ok(())
    }

    fn delete_key(&self, _: KeyScope, _: &Key, _: MacAddr, _: CipherType) -> Result<(), PortError> {
        Ok(())
    }

    fn set_default_key(&self, _: KeyScope, _: u16, _: MacAddr) -> Result<(), PortError> {
        Ok(())
    }
}

/// Log a port failure; the request still succeeds.
pub(crate) fn log_failure(op: &'static str, scope: KeyScope, result: Result<(), PortError>) {
    if let Err(err) = result {
        tracing::warn!(op, ?scope, %err, "key install port failed, keeping software state");
    }
}
