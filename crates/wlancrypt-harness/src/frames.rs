//! 802.11 frame builders, canned security elements and seeded key bytes.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wlancrypt_proto::{MacAddr, mac::fc};

/// RSN element of a WPA2-Personal station: CCMP/CCMP/PSK, no capabilities.
pub const WPA2_PSK_RSN_IE: [u8; 22] = [
    0x30, 0x14, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00,
    0x00, 0x0f, 0xac, 0x02, 0x00, 0x00,
];

/// RSN element of an MFP-capable WPA3-SAE station with BIP-CMAC.
pub const WPA3_SAE_RSN_IE: [u8; 28] = [
    0x30, 0x1a, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00,
    0x00, 0x0f, 0xac, 0x08, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x0f, 0xac, 0x06,
];

/// WPA vendor element: TKIP/TKIP/PSK.
pub const WPA_PSK_TKIP_IE: [u8; 24] = [
    0xdd, 0x16, 0x00, 0x50, 0xf2, 0x01, 0x01, 0x00, 0x00, 0x50, 0xf2, 0x02, 0x01, 0x00, 0x00, 0x50,
    0xf2, 0x02, 0x01, 0x00, 0x00, 0x50, 0xf2, 0x02,
];

/// Deterministic key bytes for a seed.
pub fn key_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut key = vec![0u8; len];
    rng.fill_bytes(&mut key);
    key
}

/// Deterministic payload for a seed.
pub fn payload(seed: u64, len: usize) -> Vec<u8> {
    key_bytes(seed ^ 0x5a5a_5a5a, len)
}

/// Builder for data and management MPDUs.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame_control: u16,
    addr1: MacAddr,
    addr2: MacAddr,
    addr3: MacAddr,
    addr4: Option<MacAddr>,
    seq: u16,
    tid: Option<u8>,
}

impl FrameBuilder {
    /// Data frame from `ta` to `ra` (To DS: `addr3` is the destination).
    pub fn data(ra: MacAddr, ta: MacAddr) -> Self {
        Self {
            frame_control: fc::TYPE_DATA | fc::TO_DS,
            addr1: ra,
            addr2: ta,
            addr3: ra,
            addr4: None,
            seq: 0,
            tid: None,
        }
    }

    /// Data frame sent by an AP (From DS).
    pub fn data_from_ap(da: MacAddr, bssid: MacAddr) -> Self {
        Self {
            frame_control: fc::TYPE_DATA | fc::FROM_DS,
            addr1: da,
            addr2: bssid,
            addr3: bssid,
            addr4: None,
            seq: 0,
            tid: None,
        }
    }

    /// Management frame of `subtype` from `bssid`.
    pub fn mgmt(subtype: u16, da: MacAddr, bssid: MacAddr) -> Self {
        Self {
            frame_control: fc::TYPE_MGMT | subtype,
            addr1: da,
            addr2: bssid,
            addr3: bssid,
            addr4: None,
            seq: 0,
            tid: None,
        }
    }

    /// Make a QoS data frame for `tid`.
    #[must_use]
    pub fn qos(mut self, tid: u8) -> Self {
        self.frame_control |= fc::STYPE_QOS;
        self.tid = Some(tid & 0x0f);
        self
    }

    /// Make a four-address (WDS) frame.
    #[must_use]
    pub fn wds(mut self, sa: MacAddr) -> Self {
        self.frame_control |= fc::TO_DS | fc::FROM_DS;
        self.addr4 = Some(sa);
        self
    }

    /// Set the sequence control field.
    #[must_use]
    pub fn seq(mut self, seq: u16) -> Self {
        self.seq = seq;
        self
    }

    /// Set the Protected bit (frames that arrive already encrypted).
    #[must_use]
    pub fn protected(mut self) -> Self {
        self.frame_control |= fc::PROTECTED;
        self
    }

    /// Serialize header and `body`.
    pub fn build(&self, body: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(32 + body.len());
        frame.extend_from_slice(&self.frame_control.to_le_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(self.addr1.octets());
        frame.extend_from_slice(self.addr2.octets());
        frame.extend_from_slice(self.addr3.octets());
        frame.extend_from_slice(&self.seq.to_le_bytes());
        if let Some(addr4) = self.addr4 {
            frame.extend_from_slice(addr4.octets());
        }
        if let Some(tid) = self.tid {
            frame.extend_from_slice(&[tid, 0]);
        }
        frame.extend_from_slice(body);
        frame
    }

    /// Header length of built frames.
    pub fn header_len(&self) -> usize {
        24 + self.addr4.map_or(0, |_| 6) + self.tid.map_or(0, |_| 2)
    }
}

#[cfg(test)]
mod tests {
    use wlancrypt_proto::{IeKind, check_ie, mac};

    use super::*;

    const A: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 1]);
    const B: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 2]);

    #[test]
    fn builder_header_lengths_match_parser() {
        for builder in [
            FrameBuilder::data(A, B),
            FrameBuilder::data(A, B).qos(5),
            FrameBuilder::data(A, B).wds(B).qos(3),
            FrameBuilder::mgmt(fc::STYPE_DEAUTH, MacAddr::BROADCAST, A),
        ] {
            let frame = builder.build(b"body");
            assert_eq!(mac::header_len(&frame).unwrap(), builder.header_len(), "{builder:?}");
        }
        assert_eq!(mac::tid(&FrameBuilder::data(A, B).qos(5).build(&[])), 5);
    }

    #[test]
    fn canned_elements_parse() {
        assert_eq!(check_ie(&WPA2_PSK_RSN_IE).unwrap().0, IeKind::Rsn);
        let (kind, sae) = check_ie(&WPA3_SAE_RSN_IE).unwrap();
        assert_eq!(kind, IeKind::Rsn);
        assert!(sae.mfp_required());
        assert_eq!(check_ie(&WPA_PSK_TKIP_IE).unwrap().0, IeKind::Wpa);
    }

    #[test]
    fn seeded_bytes_are_stable() {
        assert_eq!(key_bytes(7, 16), key_bytes(7, 16));
        assert_ne!(key_bytes(7, 16), key_bytes(8, 16));
    }
}
