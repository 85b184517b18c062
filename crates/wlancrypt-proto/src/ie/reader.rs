//! Bounds-checked cursor over an element body.
//!
//! `bytes::Buf` accessors panic on underflow, so every read here checks
//! `remaining()` first and turns a shortfall into `MalformedIe`.

use bytes::Buf;

use crate::errors::{ProtocolError, Result};

/// Size of a cipher or AKM suite selector.
pub const SELECTOR_LEN: usize = 4;

pub(crate) struct IeReader<'a> {
    buf: &'a [u8],
    element: &'static str,
}

impl<'a> IeReader<'a> {
    pub(crate) fn new(body: &'a [u8], element: &'static str) -> Self {
        Self { buf: body, element }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn need(&self, len: usize, reason: &'static str) -> Result<()> {
        if self.buf.remaining() < len {
            return Err(ProtocolError::malformed(self.element, reason));
        }
        Ok(())
    }

    pub(crate) fn u16_le(&mut self, reason: &'static str) -> Result<u16> {
        self.need(2, reason)?;
        Ok(self.buf.get_u16_le())
    }

    pub(crate) fn selector(&mut self, reason: &'static str) -> Result<[u8; SELECTOR_LEN]> {
        self.array(reason)
    }

    pub(crate) fn array<const N: usize>(&mut self, reason: &'static str) -> Result<[u8; N]> {
        self.need(N, reason)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// `u16` count followed by that many selectors. A zero count is malformed.
    pub(crate) fn selector_list(&mut self, reason: &'static str) -> Result<Vec<[u8; SELECTOR_LEN]>> {
        let count = usize::from(self.u16_le(reason)?);
        if count == 0 {
            return Err(ProtocolError::malformed(self.element, "empty suite list"));
        }
        self.need(count * SELECTOR_LEN, reason)?;
        (0..count).map(|_| self.selector(reason)).collect()
    }
}
