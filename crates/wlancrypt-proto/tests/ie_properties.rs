//! Property-based tests for the security element codec
//!
//! Build → check must preserve the cipher/AKM bitmaps and capabilities for
//! every expressible policy, and every strict prefix of a valid element must
//! be rejected as malformed.

use proptest::prelude::*;
use wlancrypt_proto::{
    AkmSet, AkmSuite, CipherSet, CipherType, CryptoParams, ProtocolError, RsnCaps, build_rsnie,
    build_wapiie, build_wpaie, check_ie, rsnie_check, wapiie_check, wpaie_check,
};

const RSN_DATA_CIPHERS: [CipherType; 5] = [
    CipherType::Tkip,
    CipherType::AesCcm,
    CipherType::AesCcm256,
    CipherType::AesGcm,
    CipherType::AesGcm256,
];

const RSN_AKMS: [AkmSuite; 18] = [
    AkmSuite::Ieee8021x,
    AkmSuite::Psk,
    AkmSuite::FtIeee8021x,
    AkmSuite::FtPsk,
    AkmSuite::Ieee8021xSha256,
    AkmSuite::PskSha256,
    AkmSuite::Sae,
    AkmSuite::FtSae,
    AkmSuite::Ieee8021xSuiteB,
    AkmSuite::Ieee8021xSuiteB192,
    AkmSuite::FtIeee8021xSha384,
    AkmSuite::FilsSha256,
    AkmSuite::FilsSha384,
    AkmSuite::FtFilsSha256,
    AkmSuite::FtFilsSha384,
    AkmSuite::Owe,
    AkmSuite::Osen,
    AkmSuite::Dpp,
];

fn cipher_set(ciphers: Vec<CipherType>) -> CipherSet {
    ciphers.into_iter().map(CipherType::bit).collect()
}

fn akm_set(akms: Vec<AkmSuite>) -> AkmSet {
    akms.into_iter().map(AkmSuite::bit).collect()
}

/// Strategy for RSN policies that the builder can express. Generic WEP is
/// left out: it is written with the WEP-40 suite and reads back as WEP-40.
fn arbitrary_rsn_params() -> impl Strategy<Value = CryptoParams> {
    (
        prop::sample::select(vec![
            CipherType::Tkip,
            CipherType::AesCcm,
            CipherType::AesCcm256,
            CipherType::AesGcm,
            CipherType::AesGcm256,
            CipherType::Wep40,
            CipherType::Wep104,
        ]),
        prop::sample::subsequence(RSN_DATA_CIPHERS.to_vec(), 1..=RSN_DATA_CIPHERS.len()),
        prop::sample::subsequence(RSN_AKMS.to_vec(), 1..=RSN_AKMS.len()),
        any::<u16>(),
        prop::option::of(prop::sample::select(vec![
            CipherType::AesCmac,
            CipherType::AesCmac256,
            CipherType::AesGmac,
            CipherType::AesGmac256,
        ])),
        prop::collection::vec(any::<[u8; 16]>(), 0..3),
    )
        .prop_map(|(group, pairwise, akms, caps, mgmt, pmkids)| CryptoParams {
            mcast_cipher: group.bit(),
            ucast_ciphers: cipher_set(pairwise),
            key_mgmt: akm_set(akms),
            rsn_caps: RsnCaps::from_bits_retain(caps),
            mgmt_cipher: mgmt.map(CipherType::bit).unwrap_or_default(),
            pmkids,
            ..CryptoParams::default()
        })
}

fn arbitrary_wpa_params() -> impl Strategy<Value = CryptoParams> {
    (
        prop::sample::select(vec![
            CipherType::Tkip,
            CipherType::AesCcm,
            CipherType::Wep40,
            CipherType::Wep104,
        ]),
        prop::sample::subsequence(vec![CipherType::Tkip, CipherType::AesCcm], 1..=2),
        prop::sample::subsequence(vec![AkmSuite::Ieee8021x, AkmSuite::Psk], 1..=2),
        any::<u16>(),
    )
        .prop_map(|(group, pairwise, akms, caps)| CryptoParams {
            mcast_cipher: group.bit(),
            ucast_ciphers: cipher_set(pairwise),
            key_mgmt: akm_set(akms),
            rsn_caps: RsnCaps::from_bits_retain(caps),
            ..CryptoParams::default()
        })
}

fn arbitrary_wapi_params() -> impl Strategy<Value = CryptoParams> {
    (
        prop::sample::subsequence(vec![AkmSuite::WapiCert, AkmSuite::WapiPsk], 1..=2),
        any::<u16>(),
    )
        .prop_map(|(akms, caps)| CryptoParams {
            mcast_cipher: CipherSet::WAPI_SMS4,
            ucast_ciphers: CipherSet::WAPI_SMS4,
            key_mgmt: akm_set(akms),
            rsn_caps: RsnCaps::from_bits_retain(caps),
            ..CryptoParams::default()
        })
}

fn assert_truncations_rejected(ie: &[u8], check: fn(&[u8]) -> wlancrypt_proto::Result<CryptoParams>) {
    for n in 0..ie.len() {
        let result = check(&ie[..n]);
        assert!(
            matches!(result, Err(ProtocolError::MalformedIe { .. })),
            "prefix of {n} bytes: expected MalformedIe, got {result:?}"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_rsn_roundtrip(params in arbitrary_rsn_params()) {
        let ie = build_rsnie(&params).expect("build should succeed");
        let parsed = rsnie_check(&ie).expect("check should succeed");

        // PROPERTY: negotiated bitmaps survive the wire
        prop_assert_eq!(parsed.ucast_ciphers, params.ucast_ciphers);
        prop_assert_eq!(parsed.mcast_cipher, params.mcast_cipher);
        prop_assert_eq!(parsed.key_mgmt, params.key_mgmt);
        prop_assert_eq!(parsed.rsn_caps, params.rsn_caps);
        prop_assert_eq!(parsed.pmkids, params.pmkids);
    }

    #[test]
    fn prop_wpa_roundtrip(params in arbitrary_wpa_params()) {
        let ie = build_wpaie(&params).expect("build should succeed");
        let parsed = wpaie_check(&ie).expect("check should succeed");

        prop_assert_eq!(parsed.ucast_ciphers, params.ucast_ciphers);
        prop_assert_eq!(parsed.mcast_cipher, params.mcast_cipher);
        prop_assert_eq!(parsed.key_mgmt, params.key_mgmt);
        prop_assert_eq!(parsed.rsn_caps, params.rsn_caps);
    }

    #[test]
    fn prop_wapi_roundtrip(params in arbitrary_wapi_params()) {
        let ie = build_wapiie(&params).expect("build should succeed");
        let parsed = wapiie_check(&ie).expect("check should succeed");

        prop_assert_eq!(parsed.ucast_ciphers, params.ucast_ciphers);
        prop_assert_eq!(parsed.mcast_cipher, params.mcast_cipher);
        prop_assert_eq!(parsed.key_mgmt, params.key_mgmt);
        prop_assert_eq!(parsed.rsn_caps, params.rsn_caps);
    }

    #[test]
    fn prop_rsn_truncation_rejected(params in arbitrary_rsn_params()) {
        let ie = build_rsnie(&params).expect("build should succeed");
        assert_truncations_rejected(&ie, rsnie_check);
    }

    #[test]
    fn prop_wpa_truncation_rejected(params in arbitrary_wpa_params()) {
        let ie = build_wpaie(&params).expect("build should succeed");
        assert_truncations_rejected(&ie, wpaie_check);
    }

    #[test]
    fn prop_wapi_truncation_rejected(params in arbitrary_wapi_params()) {
        let ie = build_wapiie(&params).expect("build should succeed");
        assert_truncations_rejected(&ie, wapiie_check);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = rsnie_check(&bytes);
        let _ = wpaie_check(&bytes);
        let _ = wapiie_check(&bytes);
        let _ = check_ie(&bytes);
    }

    #[test]
    fn prop_rsn_body_mutation_never_panics(
        params in arbitrary_rsn_params(),
        index in any::<prop::sample::Index>(),
        byte in any::<u8>(),
    ) {
        let mut ie = build_rsnie(&params).expect("build should succeed");
        let at = index.index(ie.len());
        ie[at] = byte;
        let _ = rsnie_check(&ie);
    }
}

#[test]
fn wpa2_personal_association() {
    let ie = hex::decode("30140100000fac040100000fac040100000fac020000").unwrap();
    let parsed = rsnie_check(&ie).unwrap();
    assert_eq!(parsed.ucast_ciphers, CipherSet::AES_CCM);
    assert_eq!(parsed.mcast_cipher, CipherSet::AES_CCM);
    assert_eq!(parsed.key_mgmt, AkmSet::PSK);
}

#[test]
fn rsn_version_only_defaults() {
    let parsed = rsnie_check(&[0x30, 0x02, 0x01, 0x00]).unwrap();
    assert_eq!(parsed.mcast_cipher, CipherSet::AES_CCM);
    assert_eq!(parsed.ucast_ciphers, CipherSet::AES_CCM);
    assert_eq!(parsed.key_mgmt, AkmSet::IEEE8021X);
}
