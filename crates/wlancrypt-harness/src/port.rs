//! [`KeyInstallPort`] implementations for tests.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use wlancrypt_core::{KeyInstallPort, KeyScope, PortError};
use wlancrypt_crypto::Key;
use wlancrypt_proto::{CipherType, MacAddr};

/// One call the engine made into the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortCall {
    /// `set_key`
    SetKey {
        /// Scope of the key
        scope: KeyScope,
        /// Slot
        key_index: u16,
        /// Address passed along
        mac: MacAddr,
        /// Cipher passed along
        cipher: CipherType,
    },
    /// `delete_key`
    DeleteKey {
        /// Scope of the key
        scope: KeyScope,
        /// Slot
        key_index: u16,
        /// Address passed along
        mac: MacAddr,
    },
    /// `set_default_key`
    SetDefault {
        /// Scope of the key
        scope: KeyScope,
        /// New default slot
        key_index: u16,
    },
}

/// Records every call and accepts it.
#[derive(Debug, Default)]
pub struct RecordingPort {
    calls: Mutex<Vec<PortCall>>,
}

impl RecordingPort {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: PortCall) {
        tracing::trace!(?call, "port call");
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Calls so far, in order.
    pub fn calls(&self) -> Vec<PortCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl KeyInstallPort for RecordingPort {
    fn set_key(&self, scope: KeyScope, key: &Key, mac: MacAddr, cipher: CipherType) -> Result<(), PortError> {
        self.record(PortCall::SetKey { scope, key_index: key.key_index(), mac, cipher });
        Ok(())
    }

    fn delete_key(&self, scope: KeyScope, key: &Key, mac: MacAddr, _: CipherType) -> Result<(), PortError> {
        self.record(PortCall::DeleteKey { scope, key_index: key.key_index(), mac });
        Ok(())
    }

    fn set_default_key(&self, scope: KeyScope, key_index: u16, _: MacAddr) -> Result<(), PortError> {
        self.record(PortCall::SetDefault { scope, key_index });
        Ok(())
    }
}

/// Rejects every call, as firmware with a full key cache would.
#[derive(Debug, Default)]
pub struct FailingPort {
    attempts: AtomicUsize,
}

impl FailingPort {
    /// New failing port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    fn fail(&self) -> Result<(), PortError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(PortError { reason: "key cache full".to_owned() })
    }
}

impl KeyInstallPort for FailingPort {
    fn set_key(&self, _: KeyScope, _: &Key, _: MacAddr, _: CipherType) -> Result<(), PortError> {
        self.fail()
    }

    fn delete_key(&self, _: KeyScope, _: &Key, _: MacAddr, _: CipherType) -> Result<(), PortError> {
        self.fail()
    }

    fn set_default_key(&self, _: KeyScope, _: u16, _: MacAddr) -> Result<(), PortError> {
        self.fail()
    }
}
