//! Fuzz target for MMIE verification
//!
//! # Strategy
//!
//! - Arbitrary management frames (random trailing MMIE, random lengths)
//!   verified against an engine holding a BIP-CMAC IGTK
//! - Valid protected frames with one byte corrupted
//!
//! # Invariants
//!
//! - NEVER panic on malformed frames
//! - A corrupted frame is never accepted
//! - The IPN only moves when a frame is accepted

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wlancrypt_core::{CryptoEngine, KeyRequest, OpMode};
use wlancrypt_harness::{BSSID, FrameBuilder, VDEV, key_bytes};
use wlancrypt_proto::{CipherType, MacAddr, mac::fc};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Corrupt { body: Vec<u8>, at: u16, xor: u8 },
}

fuzz_target!(|input: Input| {
    let engine = CryptoEngine::default();
    let Ok(_) = engine.create_vdev(VDEV, BSSID, OpMode::Ap) else {
        return;
    };
    let Ok(igtk) = KeyRequest::new(CipherType::AesCmac, 4, MacAddr::BROADCAST, &key_bytes(1, 16)) else {
        return;
    };
    if engine.setkey(VDEV, &igtk).is_err() {
        return;
    }

    match input {
        Input::Raw(frame) => {
            let _ = engine.is_mmie_valid(VDEV, &frame);
        },
        Input::Corrupt { body, at, xor } => {
            if xor == 0 {
                return;
            }
            let mut frame = FrameBuilder::mgmt(fc::STYPE_DEAUTH, MacAddr::BROADCAST, BSSID).build(&body);
            if engine.add_mmie(VDEV, &mut frame).is_err() {
                return;
            }
            let at = usize::from(at) % frame.len();
            frame[at] ^= xor;
            let before = engine.getkey(VDEV, MacAddr::BROADCAST, 4).map(|k| k.rsc).unwrap_or(0);
            let accepted = engine.is_mmie_valid(VDEV, &frame);
            let after = engine.getkey(VDEV, MacAddr::BROADCAST, 4).map(|k| k.rsc).unwrap_or(0);
            // Frame control, duration and sequence control are masked out of the AAD.
            let masked = matches!(at, 0..=3 | 22 | 23);
            assert!(!accepted || masked, "corrupted frame accepted at offset {at}");
            assert!(accepted || before == after, "IPN moved on a rejected frame");
        },
    }
});
