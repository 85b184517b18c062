//! End-to-end scenarios: association, key install, data and management
//! frame protection, hardware port behaviour.

use std::sync::Arc;

use wlancrypt_core::{
    CryptoEngine, CryptoError, EngineConfig, KeyRequest, KeyScope, OpMode, negotiate::intersect,
};
use wlancrypt_crypto::KeyFlags;
use wlancrypt_harness::{
    BSSID, EngineDriver, FailingPort, FrameBuilder, PEER, PortCall, RecordingPort, VDEV,
    WPA2_PSK_RSN_IE, WPA3_SAE_RSN_IE, key_bytes, payload,
};
use wlancrypt_proto::{
    AkmSet, CipherSet, CipherType, CryptoParams, IeKind, MacAddr, ParamType, RsnCaps, check_ie,
    mac::fc,
};

fn wpa2_ap() -> CryptoEngine {
    let engine = CryptoEngine::default();
    engine.create_vdev(VDEV, BSSID, OpMode::Ap).unwrap();
    engine
        .set_vdev_params(
            VDEV,
            CryptoParams {
                ucast_ciphers: CipherSet::AES_CCM,
                mcast_cipher: CipherSet::AES_CCM,
                key_mgmt: AkmSet::PSK,
                ..CryptoParams::default()
            },
        )
        .unwrap();
    engine.create_peer(VDEV, PEER).unwrap();
    engine
}

#[test]
fn wpa2_psk_association_then_ccmp_traffic() {
    let engine = wpa2_ap();
    let agreed = engine.negotiate_peer_ie(VDEV, PEER, &WPA2_PSK_RSN_IE).unwrap();
    assert_eq!(agreed.ucast_ciphers, CipherSet::AES_CCM);
    assert_eq!(agreed.key_mgmt, AkmSet::PSK);

    let ptk = KeyRequest::new(CipherType::AesCcm, 0, PEER, &key_bytes(1, 16)).unwrap();
    engine.setkey(VDEV, &ptk).unwrap();
    let gtk = KeyRequest::new(CipherType::AesCcm, 1, MacAddr::BROADCAST, &key_bytes(2, 16)).unwrap();
    engine.setkey(VDEV, &gtk).unwrap();

    let body = payload(3, 100);
    let plain = FrameBuilder::data_from_ap(PEER, BSSID).qos(6).build(&body);
    let mut frame = plain.clone();
    engine.encap(VDEV, PEER, &mut frame).unwrap();
    assert_eq!(frame.len(), plain.len() + 8 + 8);
    engine.decap(VDEV, PEER, &mut frame).unwrap();
    assert_eq!(frame, plain);

    let resync = engine.getkey(VDEV, PEER, 0).unwrap();
    assert_eq!((resync.tsc, resync.rsc), (1, 1));
}

#[test]
fn negotiated_policy_gates_key_install() {
    let engine = wpa2_ap();
    engine.negotiate_peer_ie(VDEV, PEER, &WPA2_PSK_RSN_IE).unwrap();
    let tkip = KeyRequest::new(CipherType::Tkip, 0, PEER, &key_bytes(4, 32)).unwrap();
    assert_eq!(
        engine.setkey(VDEV, &tkip),
        Err(CryptoError::UnsupportedCipher { cipher: CipherType::Tkip })
    );
    assert!(matches!(engine.getkey(VDEV, PEER, 0), Err(CryptoError::KeyNotFound { .. })));
}

#[test]
fn sae_peer_against_psk_ap_is_refused() {
    let engine = wpa2_ap();
    assert_eq!(
        engine.negotiate_peer_ie(VDEV, PEER, &WPA3_SAE_RSN_IE),
        Err(CryptoError::UnsupportedAkm { selector: None })
    );
    assert_eq!(engine.peer_params(VDEV, PEER).unwrap(), CryptoParams::default());
}

#[test]
fn mfp_negotiation_enables_pmf() {
    let engine = CryptoEngine::default();
    engine.create_vdev(VDEV, BSSID, OpMode::Ap).unwrap();
    engine.create_peer(VDEV, PEER).unwrap();
    engine.set_vdev_param(VDEV, ParamType::RsnCap, u32::from(RsnCaps::MFP_CAPABLE.bits())).unwrap();
    assert!(!engine.is_pmf_enabled(VDEV, PEER));

    engine.negotiate_peer_ie(VDEV, PEER, &WPA3_SAE_RSN_IE).unwrap();
    assert!(engine.is_pmf_enabled(VDEV, PEER));
}

#[test]
fn vdev_element_round_trips_through_parser() {
    let engine = wpa2_ap();
    let ie = engine.build_vdev_ie(VDEV, IeKind::Rsn).unwrap();
    let (kind, parsed) = check_ie(&ie).unwrap();
    assert_eq!(kind, IeKind::Rsn);
    assert_eq!(intersect(&engine.vdev_params(VDEV).unwrap(), &parsed).unwrap().key_mgmt, AkmSet::PSK);
}

#[test]
fn key_index_nine_is_rejected_everywhere() {
    let engine = wpa2_ap();
    assert_eq!(engine.delkey(VDEV, PEER, 9), Err(CryptoError::InvalidKeyIndex { index: 9 }));
    let req = KeyRequest::new(CipherType::AesCcm, 9, PEER, &key_bytes(5, 16)).unwrap();
    assert_eq!(engine.setkey(VDEV, &req), Err(CryptoError::InvalidKeyIndex { index: 9 }));
    assert_eq!(engine.getkey(VDEV, PEER, 9).unwrap_err(), CryptoError::InvalidKeyIndex { index: 9 });
}

#[test]
fn port_failures_never_fail_requests() {
    let port = Arc::new(FailingPort::new());
    let driver = EngineDriver::with_port(port.clone()).unwrap();
    let engine = driver.engine();

    let ptk = KeyRequest::new(CipherType::AesGcm, 0, PEER, &key_bytes(6, 16)).unwrap();
    engine.setkey(VDEV, &ptk).unwrap();
    driver.send_recv(true, b"still works").unwrap();
    engine.delkey(VDEV, PEER, 0).unwrap();

    // set_key, set_default_key, delete_key
    assert_eq!(port.attempts(), 3);
}

#[test]
fn port_sees_key_lifecycle_in_order() {
    let port = Arc::new(RecordingPort::new());
    let driver = EngineDriver::with_port(port.clone()).unwrap();
    let engine = driver.engine();

    let gtk = KeyRequest::new(CipherType::AesCcm, 2, MacAddr::BROADCAST, &key_bytes(7, 16)).unwrap();
    engine.setkey(VDEV, &gtk).unwrap();
    let ptk = KeyRequest::new(CipherType::AesCcm, 0, PEER, &key_bytes(8, 16)).unwrap();
    engine.setkey(VDEV, &ptk).unwrap();
    engine.destroy_peer(VDEV, PEER).unwrap();

    let vdev = KeyScope::Vdev(VDEV);
    let peer = KeyScope::Peer { vdev: VDEV, mac: PEER };
    assert_eq!(
        port.calls(),
        vec![
            PortCall::SetKey { scope: vdev, key_index: 2, mac: MacAddr::BROADCAST, cipher: CipherType::AesCcm },
            PortCall::SetDefault { scope: vdev, key_index: 2 },
            PortCall::SetKey { scope: peer, key_index: 0, mac: PEER, cipher: CipherType::AesCcm },
            PortCall::SetDefault { scope: peer, key_index: 0 },
            PortCall::DeleteKey { scope: peer, key_index: 0, mac: PEER },
        ]
    );
}

#[test]
fn failed_operations_release_their_guards() {
    let engine = wpa2_ap();
    let vdev = engine.vdev(VDEV).unwrap();
    let peer = engine.peer(VDEV, PEER).unwrap();
    assert_eq!((vdev.ref_count(), peer.ref_count()), (1, 1));

    let mut frame = FrameBuilder::data_from_ap(PEER, BSSID).build(b"x");
    assert!(engine.encap(VDEV, PEER, &mut frame).is_err());
    assert!(engine.decap(VDEV, PEER, &mut frame).is_err());
    assert!(engine.delkey(VDEV, PEER, 3).is_err());
    assert!(engine.negotiate_peer_ie(VDEV, PEER, &[0x30, 0x01, 0x01]).is_err());
    assert!(!engine.is_mmie_valid(VDEV, &frame));

    assert_eq!((vdev.ref_count(), peer.ref_count()), (1, 1));
}

#[test]
fn fils_peer_may_send_plain_association_frames() {
    let engine = wpa2_ap();
    let assoc = FrameBuilder::mgmt(fc::STYPE_ASSOC_REQ, BSSID, PEER).build(&[0x31, 0x04, 0x05, 0x00]);

    let mut frame = assoc.clone();
    assert_eq!(
        engine.decap(VDEV, PEER, &mut frame),
        Err(CryptoError::PolicyViolation { reason: "unprotected frame" })
    );

    let kek = KeyRequest::new(CipherType::FilsAead, 0, PEER, &key_bytes(9, 32)).unwrap();
    engine.setkey(VDEV, &kek).unwrap();
    engine.decap(VDEV, PEER, &mut frame).unwrap();
    assert_eq!(frame, assoc);

    let mut data = FrameBuilder::data(BSSID, PEER).build(b"plain data");
    assert!(engine.decap(VDEV, PEER, &mut data).unwrap_err().is_frame_drop());
}

#[test]
fn frame_sent_under_a_deleted_key_is_not_decrypted_with_another() {
    let engine = wpa2_ap();
    let first = KeyRequest::new(CipherType::AesCcm, 0, PEER, &key_bytes(20, 16)).unwrap();
    engine.setkey(VDEV, &first).unwrap();
    let second = KeyRequest::new(CipherType::AesCcm, 1, PEER, &key_bytes(21, 16)).unwrap();
    engine.setkey(VDEV, &second.clone().with_flags(KeyFlags::DEFAULT)).unwrap();

    let plain = FrameBuilder::data_from_ap(PEER, BSSID).build(&payload(22, 48));
    let mut frame = plain.clone();
    engine.encap(VDEV, PEER, &mut frame).unwrap();
    let in_flight = frame.clone();

    engine.delkey(VDEV, PEER, 1).unwrap();
    assert_eq!(engine.decap(VDEV, PEER, &mut frame), Err(CryptoError::KeyNotFound { index: Some(1) }));
    assert_eq!(engine.getkey(VDEV, PEER, 0).unwrap().rsc, 0);

    // reinstalling the slot brings the frame back
    engine.setkey(VDEV, &second).unwrap();
    let mut frame = in_flight;
    engine.decap(VDEV, PEER, &mut frame).unwrap();
    assert_eq!(frame, plain);
}

#[test]
fn tkip_protects_qos_traffic_per_tid() {
    let engine = CryptoEngine::default();
    engine.create_vdev(VDEV, BSSID, OpMode::Sta).unwrap();
    engine.create_peer(VDEV, PEER).unwrap();
    let ptk = KeyRequest::new(CipherType::Tkip, 0, PEER, &key_bytes(10, 32)).unwrap();
    engine.setkey(VDEV, &ptk).unwrap();

    for tid in [0u8, 5, 0] {
        let plain = FrameBuilder::data(PEER, BSSID).qos(tid).build(&payload(u64::from(tid), 64));
        let mut frame = plain.clone();
        engine.encap(VDEV, PEER, &mut frame).unwrap();
        assert_eq!(frame.len(), plain.len() + 8 + 8 + 4);
        engine.decap(VDEV, PEER, &mut frame).unwrap();
        assert_eq!(frame, plain);
    }
}

#[test]
fn hardware_offload_only_frames_headers() {
    let engine = CryptoEngine::new(EngineConfig::offload());
    engine.create_vdev(VDEV, BSSID, OpMode::Ap).unwrap();
    engine.create_peer(VDEV, PEER).unwrap();
    engine.setkey(VDEV, &KeyRequest::new(CipherType::AesCcm, 0, PEER, &key_bytes(11, 16)).unwrap()).unwrap();

    let plain = FrameBuilder::data_from_ap(PEER, BSSID).build(b"offloaded");
    let mut frame = plain.clone();
    engine.encap(VDEV, PEER, &mut frame).unwrap();
    assert_eq!(frame.len(), plain.len() + 8);
    assert_eq!(&frame[24 + 8..], b"offloaded");
}

#[test]
fn destroying_a_vdev_purges_everything() {
    let port = Arc::new(RecordingPort::new());
    let engine = CryptoEngine::with_port(EngineConfig::default(), port.clone());
    engine.create_vdev(VDEV, BSSID, OpMode::Ap).unwrap();
    engine.create_peer(VDEV, PEER).unwrap();
    engine.setkey(VDEV, &KeyRequest::new(CipherType::AesCcm, 0, PEER, &key_bytes(12, 16)).unwrap()).unwrap();
    engine
        .setkey(VDEV, &KeyRequest::new(CipherType::AesCmac, 4, MacAddr::BROADCAST, &key_bytes(13, 16)).unwrap())
        .unwrap();
    port.clear();

    engine.destroy_vdev(VDEV).unwrap();
    let deletes = port.calls().iter().filter(|call| matches!(call, PortCall::DeleteKey { .. })).count();
    assert_eq!(deletes, 2);
    assert_eq!(engine.vdev(VDEV).unwrap_err(), CryptoError::VdevNotFound { id: VDEV });
}
