//! TKIP software cipher: per-packet key mixing, Michael MIC, RC4 + ICV.
//!
//! ```text
//! TTAK   = phase1(TK[0..16], TA, IV32)
//! WEPSeed = phase2(TTAK, TK[0..16], IV16)
//! frame  = MAC | TKIP hdr | RC4(WEPSeed, MSDU | MIC | ICV)
//! ```
//!
//! The Michael key is `TK[16..24]` for frames sent by the authenticator
//! (From DS) and `TK[24..32]` otherwise, so the same selection works on
//! both ends of the link.
//!
//! # Invariants
//!
//! - All mixing arithmetic is modulo 2^16 (wrapping); overflow is part of
//!   the algorithm.
//! - Decryption checks the ICV before the MIC, and returns no plaintext
//!   unless both verify.

use wlancrypt_proto::{
    CipherType, MacAddr, MacHeader,
    mac::{self, NON_QOS_TID, fc},
};

use crate::{
    error::{CipherError, Result},
    framing::{self, PN_HEADER_LEN},
    key::{Key, KeyFlags, RxSeq, TxSeq},
    registry::CipherOps,
    wep::{ICV_LEN, icv, rc4_apply},
};

/// Temporal key length (TK + two Michael keys).
pub const TKIP_KEY_LEN: usize = 32;
/// Michael MIC length.
pub const MICHAEL_MIC_LEN: usize = 8;

const AES_SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const fn xtime(b: u8) -> u8 {
    (b << 1) ^ if b & 0x80 != 0 { 0x1b } else { 0 }
}

/// 16-bit S-box: high byte `2·S[i]`, low byte `3·S[i]` in GF(2^8).
const SBOX16: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let s = AES_SBOX[i];
        let x = xtime(s);
        table[i] = ((x as u16) << 8) | ((x ^ s) as u16);
        i += 1;
    }
    table
};

fn s16(v: u16) -> u16 {
    SBOX16[usize::from(v as u8)] ^ SBOX16[usize::from((v >> 8) as u8)].rotate_left(8)
}

fn mk16(hi: u8, lo: u8) -> u16 {
    u16::from(hi) << 8 | u16::from(lo)
}

fn tk16(tk: &[u8], i: usize) -> u16 {
    mk16(tk[2 * i + 1], tk[2 * i])
}

/// Phase 1: mix TK, transmitter address and IV32 into the 80-bit TTAK.
pub fn phase1(tk: &[u8; 16], ta: MacAddr, iv32: u32) -> [u16; 5] {
    let a = ta.octets();
    let mut p = [iv32 as u16, (iv32 >> 16) as u16, mk16(a[1], a[0]), mk16(a[3], a[2]), mk16(a[5], a[4])];
    for i in 0..8u16 {
        let j = 2 * usize::from(i & 1);
        p[0] = p[0].wrapping_add(s16(p[4] ^ mk16(tk[1 + j], tk[j])));
        p[1] = p[1].wrapping_add(s16(p[0] ^ mk16(tk[5 + j], tk[4 + j])));
        p[2] = p[2].wrapping_add(s16(p[1] ^ mk16(tk[9 + j], tk[8 + j])));
        p[3] = p[3].wrapping_add(s16(p[2] ^ mk16(tk[13 + j], tk[12 + j])));
        p[4] = p[4].wrapping_add(s16(p[3] ^ mk16(tk[1 + j], tk[j]))).wrapping_add(i);
    }
    p
}

/// Phase 2: mix TTAK, TK and IV16 into the 128-bit RC4 seed.
pub fn phase2(ttak: &[u16; 5], tk: &[u8; 16], iv16: u16) -> [u8; 16] {
    let mut ppk = [ttak[0], ttak[1], ttak[2], ttak[3], ttak[4], ttak[4].wrapping_add(iv16)];

    for i in 0..6 {
        let prev = ppk[(i + 5) % 6];
        ppk[i] = ppk[i].wrapping_add(s16(prev ^ tk16(tk, i)));
    }
    ppk[0] = ppk[0].wrapping_add((ppk[5] ^ tk16(tk, 6)).rotate_right(1));
    ppk[1] = ppk[1].wrapping_add((ppk[0] ^ tk16(tk, 7)).rotate_right(1));
    for i in 2..6 {
        ppk[i] = ppk[i].wrapping_add(ppk[i - 1].rotate_right(1));
    }

    let [iv_hi, iv_lo] = iv16.to_be_bytes();
    let mut seed = [0u8; 16];
    seed[0] = iv_hi;
    seed[1] = (iv_hi | 0x20) & 0x7f;
    seed[2] = iv_lo;
    seed[3] = ((ppk[5] ^ tk16(tk, 0)) >> 1) as u8;
    for (i, word) in ppk.iter().enumerate() {
        seed[4 + 2 * i..6 + 2 * i].copy_from_slice(&word.to_le_bytes());
    }
    seed
}

/// Michael block function state.
struct Michael {
    l: u32,
    r: u32,
}

impl Michael {
    fn new(key: &[u8; 8]) -> Self {
        Self {
            l: u32::from_le_bytes([key[0], key[1], key[2], key[3]]),
            r: u32::from_le_bytes([key[4], key[5], key[6], key[7]]),
        }
    }

    fn block(&mut self, word: u32) {
        let (mut l, mut r) = (self.l ^ word, self.r);
        r ^= l.rotate_left(17);
        l = l.wrapping_add(r);
        r ^= ((l & 0xff00_ff00) >> 8) | ((l & 0x00ff_00ff) << 8);
        l = l.wrapping_add(r);
        r ^= l.rotate_left(3);
        l = l.wrapping_add(r);
        r ^= l.rotate_right(2);
        l = l.wrapping_add(r);
        self.l = l;
        self.r = r;
    }

    /// Feed whole words; returns the unconsumed tail (< 4 bytes).
    fn words<'a>(&mut self, data: &'a [u8]) -> &'a [u8] {
        let mut chunks = data.chunks_exact(4);
        for chunk in &mut chunks {
            self.block(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        chunks.remainder()
    }

    fn finish(mut self, tail: &[u8]) -> [u8; MICHAEL_MIC_LEN] {
        let mut last = [0u8; 4];
        last[..tail.len()].copy_from_slice(tail);
        last[tail.len()] = 0x5a;
        self.block(u32::from_le_bytes(last));
        self.block(0);
        let mut mic = [0u8; MICHAEL_MIC_LEN];
        mic[..4].copy_from_slice(&self.l.to_le_bytes());
        mic[4..].copy_from_slice(&self.r.to_le_bytes());
        mic
    }
}

/// Michael over raw data, without the MSDU pseudo header.
pub fn michael_raw(key: &[u8; 8], data: &[u8]) -> [u8; MICHAEL_MIC_LEN] {
    let mut m = Michael::new(key);
    let tail = m.words(data);
    m.finish(tail)
}

/// Michael over `DA | SA | priority | 0 0 0 | data`.
pub fn michael(
    key: &[u8; 8],
    da: MacAddr,
    sa: MacAddr,
    priority: u8,
    data: &[u8],
) -> [u8; MICHAEL_MIC_LEN] {
    let mut pseudo = [0u8; 16];
    pseudo[..6].copy_from_slice(da.octets());
    pseudo[6..12].copy_from_slice(sa.octets());
    pseudo[12] = priority;

    let mut m = Michael::new(key);
    m.words(&pseudo);
    let tail = m.words(data);
    m.finish(tail)
}

fn split_tk(tk: &[u8]) -> Result<&[u8; TKIP_KEY_LEN]> {
    tk.try_into()
        .map_err(|_| CipherError::InvalidKeyLength { cipher: CipherType::Tkip, len: tk.len() })
}

fn tk1(tk: &[u8; TKIP_KEY_LEN]) -> [u8; 16] {
    let mut first = [0u8; 16];
    first.copy_from_slice(&tk[..16]);
    first
}

/// Michael key for the direction `frame` travels in.
fn mic_key(tk: &[u8; TKIP_KEY_LEN], frame: &[u8]) -> Result<[u8; 8]> {
    let header = MacHeader::from_bytes(frame)?;
    let from = if header.frame_control() & fc::FROM_DS != 0 { 16 } else { 24 };
    let mut key = [0u8; 8];
    key.copy_from_slice(&tk[from..from + 8]);
    Ok(key)
}

fn priority(frame: &[u8]) -> u8 {
    match mac::tid(frame) {
        NON_QOS_TID => 0,
        tid => tid,
    }
}

/// Michael MIC of the MSDU at `frame[body_at..]`.
fn frame_mic(tk: &[u8; TKIP_KEY_LEN], frame: &[u8], body_at: usize, body_end: usize) -> Result<[u8; 8]> {
    let (da, sa) = mac::da_sa(frame)?;
    Ok(michael(&mic_key(tk, frame)?, da, sa, priority(frame), &frame[body_at..body_end]))
}

fn rc4_seed(tk: &[u8; TKIP_KEY_LEN], frame: &[u8], tsc: u64) -> Result<[u8; 16]> {
    let ta = MacHeader::from_bytes(frame)?.addr2();
    let tk1 = tk1(tk);
    let ttak = phase1(&tk1, ta, (tsc >> 16) as u32);
    Ok(phase2(&ttak, &tk1, tsc as u16))
}

/// Encrypt in place.
///
/// `frame` holds `MAC header | TKIP header | MSDU`; the TKIP header must
/// already carry the TSC. Appends MIC and ICV and RC4-encrypts
/// `MSDU | MIC | ICV`.
pub fn tkip_encrypt(tk: &[u8], frame: &mut Vec<u8>, hdr_len: usize) -> Result<()> {
    let tk = split_tk(tk)?;
    let body_at = hdr_len + PN_HEADER_LEN;
    framing::require_len(frame, body_at)?;
    let (tsc, _) = framing::parse_tkip_header(&frame[hdr_len..])?;

    let mic = frame_mic(tk, frame, body_at, frame.len())?;
    frame.extend_from_slice(&mic);
    let check = icv(&frame[body_at..]);
    frame.extend_from_slice(&check);

    let seed = rc4_seed(tk, frame, tsc.get())?;
    rc4_apply(&seed, &mut frame[body_at..])
}

/// Decrypt and verify; returns the MSDU without MIC and ICV.
///
/// # Errors
///
/// - `FrameTooShort` if the frame cannot hold header, MIC and ICV
/// - `IcvMismatch` if the CRC does not match after decryption
/// - `MicMismatch` if the Michael MIC does not match
pub fn tkip_decrypt(tk: &[u8], frame: &[u8], hdr_len: usize) -> Result<Vec<u8>> {
    let tk = split_tk(tk)?;
    let body_at = hdr_len + PN_HEADER_LEN;
    framing::require_len(frame, body_at + MICHAEL_MIC_LEN + ICV_LEN)?;
    let (tsc, _) = framing::parse_tkip_header(&frame[hdr_len..])?;

    let seed = rc4_seed(tk, frame, tsc.get())?;
    let mut plain = frame[body_at..].to_vec();
    rc4_apply(&seed, &mut plain)?;

    let icv_at = plain.len() - ICV_LEN;
    if icv(&plain[..icv_at]) != plain[icv_at..] {
        return Err(CipherError::IcvMismatch);
    }
    plain.truncate(icv_at);

    let mic_at = plain.len() - MICHAEL_MIC_LEN;
    let (da, sa) = mac::da_sa(frame)?;
    let expected = michael(&mic_key(tk, frame)?, da, sa, priority(frame), &plain[..mic_at]);
    if expected != plain[mic_at..] {
        return Err(CipherError::MicMismatch);
    }
    plain.truncate(mic_at);
    Ok(plain)
}

/// TKIP cipher suite.
#[derive(Debug)]
pub struct Tkip;

impl CipherOps for Tkip {
    fn cipher(&self) -> CipherType {
        CipherType::Tkip
    }

    fn key_lens(&self) -> &'static [usize] {
        &[TKIP_KEY_LEN]
    }

    fn header_len(&self) -> usize {
        PN_HEADER_LEN
    }

    fn trailer_len(&self) -> usize {
        ICV_LEN
    }

    fn mic_len(&self) -> usize {
        MICHAEL_MIC_LEN
    }

    fn encap(
        &self,
        key: &Key,
        seq: TxSeq,
        frame: &mut Vec<u8>,
        hdr_len: usize,
        already_encapped: bool,
    ) -> Result<()> {
        if !already_encapped {
            let TxSeq::Pn(tsc) = seq else {
                return Err(CipherError::MalformedHeader { reason: "TKIP needs a TSC" });
            };
            framing::insert_header(frame, hdr_len, &framing::tkip_header(tsc, key.header_key_id()))?;
        }
        if key.flags().contains(KeyFlags::SW_ENCRYPT) {
            tkip_encrypt(key.material().as_bytes(), frame, hdr_len)?;
        }
        Ok(())
    }

    fn decap(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize, tid: u8) -> Result<RxSeq> {
        framing::require_len(frame, hdr_len + PN_HEADER_LEN + ICV_LEN)?;
        let (tsc, _) = framing::parse_tkip_header(&frame[hdr_len..])?;
        let seq = RxSeq::Pn { tid, pn: tsc };
        key.check_rx(seq)?;

        if key.flags().contains(KeyFlags::SW_DECRYPT) {
            let plain = tkip_decrypt(key.material().as_bytes(), frame, hdr_len)?;
            frame.truncate(hdr_len);
            frame.extend_from_slice(&plain);
        } else {
            framing::strip(frame, hdr_len, PN_HEADER_LEN, ICV_LEN);
        }
        Ok(seq)
    }

    fn enmic(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize) -> Result<()> {
        let tk = split_tk(key.material().as_bytes())?;
        framing::require_len(frame, hdr_len)?;
        let mic = frame_mic(tk, frame, hdr_len, frame.len())?;
        frame.extend_from_slice(&mic);
        Ok(())
    }

    fn demic(&self, key: &Key, frame: &mut Vec<u8>, hdr_len: usize) -> Result<()> {
        let tk = split_tk(key.material().as_bytes())?;
        framing::require_len(frame, hdr_len + MICHAEL_MIC_LEN)?;
        let mic_at = frame.len() - MICHAEL_MIC_LEN;
        let expected = frame_mic(tk, frame, hdr_len, mic_at)?;
        if expected != frame[mic_at..] {
            return Err(CipherError::MicMismatch);
        }
        frame.truncate(mic_at);
        Ok(())
    }
}
