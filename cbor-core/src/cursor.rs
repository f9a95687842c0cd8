//! Explicit read cursor over an immutable byte buffer

use crate::{DecodeError, Result};

/// Read cursor threaded through every decode call
///
/// Holds an immutable view of the input. Each successful read advances the
/// position; a read past the buffer end fails with
/// [`DecodeError::Truncated`] carrying the offset at which the read started.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Wrap a byte buffer, positioned at its start
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when the whole buffer has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read exactly `n` bytes
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated { offset: self.pos });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}
