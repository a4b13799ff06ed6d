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

//! The "Portable Executable" header of 32-bit and 64-bit Windows programs.
//!
//! Only the signature is checked. The rest of the header isn't parsed.

use crate::{cursor::ByteCursor, error::HeaderError};

/// Signature found at the start of the header.
pub const SIGNATURE: &[u8; 4] = b"PE\0\0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableExecutable {
    /// Offset of the header within the file.
    pub offset: usize,
}

impl PortableExecutable {
    pub fn read(cursor: &mut ByteCursor, offset: usize) -> Result<PortableExecutable, HeaderError> {
        cursor.set_position(offset);
        if cursor.read_bytes(SIGNATURE.len())? != SIGNATURE {
            return Err(HeaderError::BadSignature("PE"));
        }
        Ok(PortableExecutable { offset })
    }
}
