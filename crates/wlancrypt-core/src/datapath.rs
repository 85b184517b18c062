//! Per-frame entry points.
//!
//! ```text
//!  encap: lock ─ reserve PN ─ snapshot ─ unlock ─ set Protected ─ ops.encap
//!  decap: lock ─ snapshot ─ unlock ─ ops.decap ─ lock ─ commit PN ─ unlock
//! ```
//!
//! # Security
//!
//! - A transmit PN is reserved under the scope lock before the frame is
//!   built, so two concurrent senders never share a PN.
//! - `decap` verifies against a snapshot and commits the PN only after the
//!   frame verified. The commit re-checks under the lock, so of two
//!   concurrent copies of one frame only the first is accepted.
//! - Unprotected frames are refused unless they are (re)association frames
//!   from a peer with FILS AEAD enabled.

use wlancrypt_crypto::{CipherOps, Key, KeyFlags, lookup};
use wlancrypt_proto::{
    CipherType, MacAddr, MacHeader,
    mac::{self, fc},
};

use crate::{
    engine::{CryptoEngine, Scope},
    error::{CryptoError, Result},
    objmgr::VdevId,
};

/// Key id carried in a received cipher header.
fn rx_key_id(frame: &[u8], hdr_len: usize, cipher: CipherType) -> Result<u16> {
    let (at, shift) = if cipher == CipherType::WapiSms4 { (hdr_len, 0) } else { (hdr_len + 3, 6) };
    let byte = frame.get(at).ok_or_else(|| CryptoError::MalformedFrame {
        reason: format!("no cipher header key id at offset {at}"),
    })?;
    Ok(u16::from((byte >> shift) & 0x03))
}

fn set_protected(frame: &mut [u8], protected: bool) -> Result<()> {
    let header = MacHeader::from_bytes_mut(frame)?;
    let bits = header.frame_control();
    let bits = if protected { bits | fc::PROTECTED } else { bits & !fc::PROTECTED };
    header.set_frame_control(bits);
    Ok(())
}

impl CryptoEngine {
    /// Default transmit key of the scope `mac` selects. Static WEP keys are
    /// vdev-wide, so a peer without keys of its own falls back to a WEP
    /// default key of the vdev.
    fn tx_scope(&self, vdev: VdevId, mac: MacAddr) -> Result<Scope> {
        let vdev = self.vdev(vdev)?;
        let scope = Scope::resolve(&vdev, mac)?;
        if scope.is_peer() && scope.crypto().keys.default_tx_key().is_none() {
            let vdev_scope = scope.widen();
            let static_wep = vdev_scope.crypto().keys.default_tx_key().is_some_and(|k| k.cipher().is_wep());
            if static_wep {
                return Ok(vdev_scope);
            }
        }
        Ok(scope)
    }

    /// Protect an outgoing MPDU for `mac` (receiver address).
    ///
    /// Reserves the next PN, inserts the cipher header, sets the Protected
    /// bit and, with software encryption, encrypts and appends the trailer.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if the scope has no default key; `MalformedFrame` for
    /// a frame too short to carry its MAC header.
    pub fn encap(&self, vdev: VdevId, mac: MacAddr, frame: &mut Vec<u8>) -> Result<()> {
        let hdr_len = mac::header_len(frame)?;
        let scope = self.tx_scope(vdev, mac)?;
        let (key, seq) = {
            let mut state = scope.crypto();
            let key = state.keys.default_tx_key_mut().ok_or(CryptoError::KeyNotFound { index: None })?;
            let seq = key.reserve_tx();
            (key.clone(), seq)
        };
        let ops = lookup(key.cipher())?;

        set_protected(frame, true)?;
        ops.encap(&key, seq, frame, hdr_len, false)?;
        tracing::trace!(vdev, %mac, key_index = key.key_index(), cipher = key.cipher().name(), len = frame.len(), "encap");
        Ok(())
    }

    /// Verify and strip a received MPDU from `mac` (transmitter address).
    ///
    /// Group-addressed frames use the vdev's keys, others the peer's. On
    /// success the frame holds the plaintext with the Protected bit clear.
    ///
    /// # Errors
    ///
    /// `PolicyViolation` for an unprotected frame that is not FILS-exempt,
    /// `KeyNotFound` when no key matches the header key id, and the
    /// frame-drop errors (`IcvMismatch`, `MicMismatch`, `ReplayDetected`,
    /// `MalformedFrame`). The frame contents are unspecified after an error.
    pub fn decap(&self, vdev: VdevId, mac: MacAddr, frame: &mut Vec<u8>) -> Result<()> {
        let hdr_len = mac::header_len(frame)?;
        let header = MacHeader::from_bytes(frame)?;
        let vdev_ref = self.vdev(vdev)?;

        if !header.is_protected() {
            let fils_exempt = header.is_assoc()
                && vdev_ref.resolve_peer(mac).is_ok_and(|peer| peer.crypto().keys.fils_aead_enabled());
            if fils_exempt {
                tracing::trace!(vdev, %mac, "FILS AEAD frame passed through");
                return Ok(());
            }
            return Err(CryptoError::PolicyViolation { reason: "unprotected frame" });
        }

        let scope = if header.addr1().is_group() {
            Scope::Vdev(vdev_ref.clone())
        } else {
            Scope::resolve(&vdev_ref, mac)?
        };
        let (scope, (key, generation)) = match self.rx_key(&scope, frame, hdr_len)? {
            Some(found) => (scope, found),
            None if scope.is_peer() => {
                let vdev_scope = scope.widen();
                match self.rx_key(&vdev_scope, frame, hdr_len)? {
                    Some(found) if found.0.cipher().is_wep() => (vdev_scope, found),
                    _ => return Err(CryptoError::KeyNotFound { index: None }),
                }
            },
            None => return Err(CryptoError::KeyNotFound { index: None }),
        };

        let ops = lookup(key.cipher())?;
        let tid = mac::tid(frame);
        let seq = ops.decap(&key, frame, hdr_len, tid)?;
        // a rekey while the transform ran leaves the new key's counter alone
        scope.crypto().keys.get_current_mut(key.key_index(), generation)?.commit_rx(seq)?;

        set_protected(frame, false)?;
        tracing::trace!(vdev, %mac, key_index = key.key_index(), ?seq, "decap");
        Ok(())
    }

    /// Snapshot of the key the frame's header key id names, with the
    /// generation it was installed at. `None` when the scope has no keys.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` carrying the header key id when that slot is empty.
    fn rx_key(&self, scope: &Scope, frame: &[u8], hdr_len: usize) -> Result<Option<(Key, u64)>> {
        let state = scope.crypto();
        let Some(default) = state.keys.default_tx_key() else {
            return Ok(None);
        };
        let key_id = rx_key_id(frame, hdr_len, default.cipher())?;
        let key = state.keys.get(key_id)?.clone();
        Ok(Some((key, state.keys.generation(key_id)?)))
    }

    /// Append a software MIC (TKIP Michael) when the key asks for software
    /// MIC but hardware encryption. No-op otherwise.
    pub fn enmic(&self, vdev: VdevId, mac: MacAddr, frame: &mut Vec<u8>) -> Result<()> {
        let hdr_len = mac::header_len(frame)?;
        let scope = self.tx_scope(vdev, mac)?;
        let Some(key) = scope.crypto().keys.default_tx_key().cloned() else {
            return Err(CryptoError::KeyNotFound { index: None });
        };
        let flags = key.flags();
        if !flags.contains(KeyFlags::SW_ENMIC) || flags.contains(KeyFlags::SW_ENCRYPT) {
            return Ok(());
        }
        lookup(key.cipher())?.enmic(&key, frame, hdr_len)?;
        Ok(())
    }

    /// Verify and strip a software MIC when the key asks for software MIC
    /// but hardware decryption. No-op otherwise.
    pub fn demic(&self, vdev: VdevId, mac: MacAddr, frame: &mut Vec<u8>) -> Result<()> {
        let hdr_len = mac::header_len(frame)?;
        let vdev_ref = self.vdev(vdev)?;
        let group = MacHeader::from_bytes(frame)?.addr1().is_group();
        let scope = if group { Scope::Vdev(vdev_ref.clone()) } else { Scope::resolve(&vdev_ref, mac)? };
        let Some(key) = scope.crypto().keys.default_tx_key().cloned() else {
            return Err(CryptoError::KeyNotFound { index: None });
        };
        let flags = key.flags();
        if !flags.contains(KeyFlags::SW_DEMIC) || flags.contains(KeyFlags::SW_DECRYPT) {
            return Ok(());
        }
        lookup(key.cipher())?.demic(&key, frame, hdr_len)?;
        Ok(())
    }

    /// Per-frame overhead of the scope's default key: cipher header bytes
    /// inserted after the MAC header and trailer bytes appended.
    pub fn overhead(&self, vdev: VdevId, mac: MacAddr) -> Result<(usize, usize)> {
        let scope = self.tx_scope(vdev, mac)?;
        let cipher = scope
            .crypto()
            .keys
            .default_tx_key()
            .map(Key::cipher)
            .ok_or(CryptoError::KeyNotFound { index: None })?;
        let ops: &dyn CipherOps = lookup(cipher)?;
        Ok((ops.header_len(), ops.trailer_len() + ops.mic_len()))
    }
}
