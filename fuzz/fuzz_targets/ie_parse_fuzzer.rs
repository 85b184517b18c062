//! Fuzz target for security element parsing
//!
//! # Strategy
//!
//! - Raw bytes fed to `check_ie` and to each family parser directly
//! - Anything that parses is rebuilt and parsed again
//!
//! # Invariants
//!
//! - NEVER panic on malformed elements
//! - A rebuilt element parses to the same policy (minus PMKIDs for
//!   families that cannot carry them)

#![no_main]

use libfuzzer_sys::fuzz_target;
use wlancrypt_proto::{build_ie, check_ie, rsnie_check, wapiie_check, wpaie_check};

fuzz_target!(|data: &[u8]| {
    let _ = rsnie_check(data);
    let _ = wpaie_check(data);
    let _ = wapiie_check(data);

    let Ok((kind, params)) = check_ie(data) else {
        return;
    };
    let Ok(rebuilt) = build_ie(kind, &params) else {
        return;
    };
    let (again_kind, again) = check_ie(&rebuilt).unwrap_or_else(|err| {
        panic!("rebuilt {kind:?} element failed to parse: {err}\n{rebuilt:02x?}")
    });
    assert_eq!(again_kind, kind);
    assert_eq!(again.ucast_ciphers, params.ucast_ciphers);
    assert_eq!(again.key_mgmt, params.key_mgmt);
});
