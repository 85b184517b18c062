//! Security element negotiation.
//!
//! A peer's RSN, WPA or WAPI element is parsed and intersected with the
//! vdev's policy. Empty vdev sets mean "not configured" and accept whatever
//! the peer offers.

use wlancrypt_proto::{CipherType, CryptoParams, IeKind, MacAddr, build_ie, check_ie};

use crate::{
    engine::CryptoEngine,
    error::{CryptoError, Result},
    objmgr::VdevId,
};

/// Intersect a peer's offer with the local policy.
///
/// # Errors
///
/// `UnsupportedCipher` when no pairwise cipher or no group cipher is shared,
/// `UnsupportedAkm` when no AKM is shared, `PolicyViolation` when one side
/// requires MFP and the other cannot do it.
pub fn intersect(local: &CryptoParams, offered: &CryptoParams) -> Result<CryptoParams> {
    let mut agreed = offered.clone();

    if !local.ucast_ciphers.is_empty() {
        agreed.ucast_ciphers &= local.ucast_ciphers;
        if agreed.ucast_ciphers.is_empty() {
            let cipher = offered.ucast_ciphers.preferred().unwrap_or(CipherType::None);
            return Err(CryptoError::UnsupportedCipher { cipher });
        }
    }
    if !local.mcast_cipher.is_empty() && !local.mcast_cipher.intersects(offered.mcast_cipher) {
        let cipher = offered.mcast_cipher.preferred().unwrap_or(CipherType::None);
        return Err(CryptoError::UnsupportedCipher { cipher });
    }
    if !local.key_mgmt.is_empty() {
        agreed.key_mgmt &= local.key_mgmt;
        if agreed.key_mgmt.is_empty() {
            return Err(CryptoError::UnsupportedAkm { selector: None });
        }
    }
    if local.mfp_required() && !offered.mfp_capable() {
        return Err(CryptoError::PolicyViolation { reason: "peer is not MFP capable" });
    }
    if offered.mfp_required() && !local.mfp_capable() {
        return Err(CryptoError::PolicyViolation { reason: "peer requires MFP" });
    }
    Ok(agreed)
}

impl CryptoEngine {
    /// Parse a peer's security element, check it against the vdev policy
    /// and store the agreed policy on the peer.
    ///
    /// # Errors
    ///
    /// `MalformedIe`, `UnknownCipherSelector` and `UnsupportedAkm` from
    /// parsing, `PeerNotFound`, and the [`intersect`] errors.
    pub fn negotiate_peer_ie(&self, vdev: VdevId, mac: MacAddr, ie: &[u8]) -> Result<CryptoParams> {
        let (kind, offered) = check_ie(ie)?;
        let vdev = self.vdev(vdev)?;
        let peer = vdev.resolve_peer(mac)?;
        let local = vdev.crypto().params.clone();

        let agreed = match intersect(&local, &offered) {
            Ok(agreed) => agreed,
            Err(err) => {
                tracing::debug!(vdev = vdev.id(), %mac, element = kind.name(), %err, "peer policy rejected");
                return Err(err);
            },
        };
        peer.crypto().params = agreed.clone();
        tracing::debug!(
            vdev = vdev.id(),
            %mac,
            element = kind.name(),
            ucast = ?agreed.ucast_ciphers,
            akm = ?agreed.key_mgmt,
            "peer policy negotiated"
        );
        Ok(agreed)
    }

    /// Build the vdev's own security element (beacon / association
    /// request).
    pub fn build_vdev_ie(&self, vdev: VdevId, kind: IeKind) -> Result<Vec<u8>> {
        let params = self.vdev_params(vdev)?;
        Ok(build_ie(kind, &params)?)
    }
}
