//! Fuzz target for TKIP decryption
//!
//! # Strategy
//!
//! - Arbitrary ciphertext after a valid MAC header, with arbitrary key
//! - Round trip through encrypt then decrypt for arbitrary plaintext
//!
//! # Invariants
//!
//! - NEVER panic on short or garbage frames
//! - encrypt followed by decrypt returns the plaintext

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wlancrypt_crypto::{framing, tkip_decrypt, tkip_encrypt, Pn48};
use wlancrypt_harness::{FrameBuilder, BSSID, PEER};

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 32],
    tsc: u64,
    qos_tid: Option<u8>,
    body: Vec<u8>,
    garbage: bool,
}

fuzz_target!(|input: Input| {
    let builder = match input.qos_tid {
        Some(tid) => FrameBuilder::data(PEER, BSSID).qos(tid),
        None => FrameBuilder::data(PEER, BSSID),
    };
    let hdr_len = builder.header_len();

    if input.garbage {
        let frame = builder.build(&input.body);
        let _ = tkip_decrypt(&input.key, &frame, hdr_len);
        return;
    }

    let tsc = Pn48::new(input.tsc & Pn48::MAX);
    let mut body = framing::tkip_header(tsc, 0).to_vec();
    body.extend_from_slice(&input.body);
    let plain = builder.build(&body);
    let mut frame = plain.clone();
    if tkip_encrypt(&input.key, &mut frame, hdr_len).is_err() {
        return;
    }
    let decrypted = tkip_decrypt(&input.key, &frame, hdr_len).unwrap_or_else(|err| panic!("round trip failed: {err}"));
    assert_eq!(decrypted, input.body);
});
