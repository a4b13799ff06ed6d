// Copyright (C) 2026  The dosstub developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Position-tracking reader over an owned byte buffer.
//!
//! All the offsets passed to the `*_at` methods are absolute offsets within the buffer, and
//! are not affected by the current position. Writes through [`ByteCursor::replace_byte`] and
//! [`ByteCursor::replace_word`] are visible to every later read, which is what makes
//! self-modifying code observable by the decoder.

use byteorder::{ByteOrder as _, LittleEndian};
use core::ops::Range;

/// Owns a byte buffer and a read position within it.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    buf: Vec<u8>,
    position: usize,
}

/// Attempted to access bytes past the end of the buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Access to {len} byte(s) at offset 0x{offset:x} is out of bounds")]
pub struct OutOfBounds {
    /// First byte of the access.
    pub offset: usize,
    /// Number of bytes that were accessed.
    pub len: usize,
}

impl ByteCursor {
    /// Builds a cursor positioned at the start of `buf`.
    pub fn new(buf: Vec<u8>) -> Self {
        Self::with_position(buf, 0)
    }

    pub fn with_position(buf: Vec<u8>, position: usize) -> Self {
        ByteCursor { buf, position }
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the read position. Moving past the end is allowed, but any subsequent read fails.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Moves the read position forward by `n` bytes without checking their content.
    pub fn skip(&mut self, n: usize) {
        self.position = self.position.saturating_add(n);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` if at least one byte can still be read.
    pub fn available(&self) -> bool {
        self.position < self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Advances past `n` bytes and returns `true` if all of them are zero.
    ///
    /// The position always ends up `n` bytes further, even if a non-zero byte is found.
    pub fn check_reserved(&mut self, n: usize) -> Result<bool, OutOfBounds> {
        let all_zero = self.slice(self.position, n)?.iter().all(|b| *b == 0);
        self.position += n;
        Ok(all_zero)
    }

    pub fn read_byte(&mut self) -> Result<u8, OutOfBounds> {
        let byte = self.read_byte_at(self.position)?;
        self.position += 1;
        Ok(byte)
    }

    pub fn peek_byte(&self) -> Result<u8, OutOfBounds> {
        self.read_byte_at(self.position)
    }

    pub fn read_byte_at(&self, offset: usize) -> Result<u8, OutOfBounds> {
        self.buf
            .get(offset)
            .copied()
            .ok_or(OutOfBounds { offset, len: 1 })
    }

    pub fn read_word(&mut self) -> Result<u16, OutOfBounds> {
        let word = self.read_word_at(self.position)?;
        self.position += 2;
        Ok(word)
    }

    pub fn peek_word(&self) -> Result<u16, OutOfBounds> {
        self.read_word_at(self.position)
    }

    pub fn read_word_at(&self, offset: usize) -> Result<u16, OutOfBounds> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_dword(&mut self) -> Result<u32, OutOfBounds> {
        let dword = LittleEndian::read_u32(self.slice(self.position, 4)?);
        self.position += 4;
        Ok(dword)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, OutOfBounds> {
        let bytes = self.read_bytes_at(n, self.position)?;
        self.position += n;
        Ok(bytes)
    }

    pub fn peek_bytes(&self, n: usize) -> Result<Vec<u8>, OutOfBounds> {
        self.read_bytes_at(n, self.position)
    }

    pub fn read_bytes_at(&self, n: usize, offset: usize) -> Result<Vec<u8>, OutOfBounds> {
        Ok(self.slice(offset, n)?.to_vec())
    }

    /// Reads `len` bytes and maps each of them to the character of the same code point.
    pub fn read_string(&mut self, len: usize) -> Result<String, OutOfBounds> {
        let s = self.read_string_from_to(self.position, self.position + len)?;
        self.position += len;
        Ok(s)
    }

    /// Same as [`ByteCursor::read_string`], but for the absolute range `from..to`.
    pub fn read_string_from_to(&self, from: usize, to: usize) -> Result<String, OutOfBounds> {
        let len = to.checked_sub(from).ok_or(OutOfBounds { offset: from, len: 0 })?;
        Ok(self.slice(from, len)?.iter().map(|b| char::from(*b)).collect())
    }

    pub fn replace_byte(&mut self, offset: usize, value: u8) -> Result<(), OutOfBounds> {
        match self.buf.get_mut(offset) {
            Some(b) => {
                *b = value;
                Ok(())
            }
            None => Err(OutOfBounds { offset, len: 1 }),
        }
    }

    pub fn replace_word(&mut self, offset: usize, value: u16) -> Result<(), OutOfBounds> {
        let range = self.range(offset, 2)?;
        LittleEndian::write_u16(&mut self.buf[range], value);
        Ok(())
    }

    /// Returns the absolute offset of the first byte equal to `value` at or after `from`.
    pub fn find_first_byte_from(&self, from: usize, value: u8) -> Option<usize> {
        self.buf
            .get(from..)?
            .iter()
            .position(|b| *b == value)
            .map(|n| n + from)
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8], OutOfBounds> {
        let range = self.range(offset, len)?;
        Ok(&self.buf[range])
    }

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>, OutOfBounds> {
        match offset.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(offset..end),
            _ => Err(OutOfBounds { offset, len }),
        }
    }
}
