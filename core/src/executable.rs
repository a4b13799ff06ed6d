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

//! Reading a whole executable file.

use crate::{
    cursor::ByteCursor,
    decoder::{decode, Trace},
    error::{DecodeError, Diagnostic, HeaderError},
    mz::MzHeader,
    ne::NeHeader,
    pe::PortableExecutable,
};
use std::{fs, path::Path};

/// Header that follows the DOS stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    Ne(NeHeader),
    Pe(PortableExecutable),
}

#[derive(Debug)]
pub struct Executable {
    pub mz: MzHeader,
    /// Outcome of decoding the DOS stub. A stub that can't be decoded doesn't prevent reading
    /// the rest of the file.
    pub stub: Result<Trace, DecodeError>,
    /// `None` if the signature at the new header offset isn't recognized.
    pub extension: Option<Extension>,
    /// Anomalies found while parsing the headers.
    pub diagnostics: Vec<Diagnostic>,
}

impl Executable {
    /// Reads the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Executable, HeaderError> {
        let bytes = fs::read(path)?;
        Executable::read(bytes)
    }

    pub fn read(bytes: Vec<u8>) -> Result<Executable, HeaderError> {
        let mut cursor = ByteCursor::new(bytes);
        let mut diagnostics = Vec::new();

        let mz = MzHeader::read(&mut cursor, &mut diagnostics)?;

        let range = mz.stub_range();
        let code = cursor.read_bytes_at(range.len(), range.start)?;
        let stub = decode(code, mz.seed());
        if let Err(err) = &stub {
            log::warn!("Failed to decode the DOS stub: {}", err);
        }

        let offset = mz.new_header_start();
        let extension = match cursor.read_bytes_at(2, offset)?.as_slice() {
            b"NE" => Some(Extension::Ne(NeHeader::read(
                &mut cursor,
                offset,
                &mut diagnostics,
            )?)),
            b"PE" => Some(Extension::Pe(PortableExecutable::read(&mut cursor, offset)?)),
            other => {
                log::debug!("Unknown signature {:?} at 0x{:x}", other, offset);
                None
            }
        };

        Ok(Executable {
            mz,
            stub,
            extension,
            diagnostics,
        })
    }

    pub fn ne(&self) -> Option<&NeHeader> {
        match &self.extension {
            Some(Extension::Ne(ne)) => Some(ne),
            _ => None,
        }
    }
}
