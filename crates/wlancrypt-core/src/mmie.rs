//! Management frame integrity for group-addressed robust management frames.
//!
//! # Security
//!
//! The IPN of an IGTK is compared and stored in one critical section
//! (`commit_rx` under the vdev lock). Two concurrent verifications of the
//! same frame cannot both succeed, and a frame that fails its MIC never
//! moves the counter.
//!
//! The two IGTK slots may hold different BIP ciphers during a rollover. A
//! received MMIE is matched against each installed IGTK using that key's
//! own MIC length.

use wlancrypt_crypto::{Pn48, RxSeq, TxSeq, bip};
use wlancrypt_proto::{mac, mmie};

use crate::{
    engine::CryptoEngine,
    error::{CryptoError, Result},
    keystore::Slot,
    objmgr::VdevId,
};

impl CryptoEngine {
    /// Append an MMIE to a management frame using the vdev's default IGTK.
    /// Returns the new frame length.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if no IGTK is installed.
    pub fn add_mmie(&self, vdev: VdevId, frame: &mut Vec<u8>) -> Result<usize> {
        let hdr_len = mac::header_len(frame)?;
        let vdev = self.vdev(vdev)?;
        let (key, ipn) = {
            let mut state = vdev.crypto();
            let key = state.keys.default_igtk_mut().ok_or(CryptoError::KeyNotFound { index: None })?;
            let TxSeq::Pn(ipn) = key.reserve_tx() else {
                return Err(CryptoError::UnsupportedOperation { cipher: key.cipher(), op: "add_mmie" });
            };
            (key.clone(), ipn)
        };
        bip::protect(&key, frame, hdr_len, ipn)?;
        tracing::trace!(vdev = vdev.id(), key_index = key.key_index(), ipn = ipn.get(), "MMIE added");
        Ok(frame.len())
    }

    /// Verify the trailing MMIE of a received management frame and advance
    /// the IGTK's IPN. Returns the accepted IPN.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` without an IGTK for the MMIE key id,
    /// `InvalidKeyIndex` for a key id outside the IGTK range,
    /// `ReplayDetected` for an IPN at or below the last accepted one,
    /// `MicMismatch` and `MalformedFrame` for bad frames.
    pub fn verify_mmie(&self, vdev: VdevId, frame: &[u8]) -> Result<Pn48> {
        let hdr_len = mac::header_len(frame)?;
        let vdev = self.vdev(vdev)?;
        let (key, generation) = {
            let state = vdev.crypto();
            let mut rejected = CryptoError::KeyNotFound { index: None };
            let mut matched = None;
            for igtk in state.keys.igtks() {
                let view = match mmie::parse_trailing(frame, hdr_len, bip::mic_len(igtk.cipher())?) {
                    Ok(view) => view,
                    Err(err) => {
                        rejected = err.into();
                        continue;
                    },
                };
                let key_id = view.prefix.key_id();
                if key_id == igtk.key_index() {
                    matched = Some((igtk, view.prefix.ipn()));
                    break;
                }
                rejected = match Slot::of(key_id) {
                    Ok(Slot::Igtk(_)) => CryptoError::KeyNotFound { index: Some(key_id) },
                    _ => CryptoError::InvalidKeyIndex { index: key_id },
                };
            }
            let (key, ipn) = matched.ok_or(rejected)?;
            key.check_rx(RxSeq::Ipn(Pn48::new(ipn)))?;
            (key.clone(), state.keys.generation(key.key_index())?)
        };

        let ipn = bip::verify(&key, frame, hdr_len)?;
        vdev.crypto().keys.get_current_mut(key.key_index(), generation)?.commit_rx(RxSeq::Ipn(ipn))?;
        tracing::trace!(vdev = vdev.id(), key_index = key.key_index(), ipn = ipn.get(), "MMIE verified");
        Ok(ipn)
    }

    /// Whether the trailing MMIE verifies. Accepted frames advance the IPN.
    pub fn is_mmie_valid(&self, vdev: VdevId, frame: &[u8]) -> bool {
        match self.verify_mmie(vdev, frame) {
            Ok(_) => true,
            Err(err) => {
                tracing::trace!(vdev, %err, "MMIE rejected");
                false
            },
        }
    }
}
