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

//! The MZ header found at the start of every DOS executable.
//!
//! Windows executables start with the same header, followed by a small DOS program (the
//! *stub*) that prints an error message, then by the Windows-specific header whose offset is
//! stored at offset 0x3c.

use crate::{
    cursor::ByteCursor,
    error::{Diagnostic, HeaderError},
    registers::Seed,
};
use core::ops::Range;

/// Size of a page, as counted by [`MzHeader::pages`].
pub const PAGE_SIZE: usize = 512;
/// Size of a paragraph.
pub const PARAGRAPH_SIZE: usize = 16;

/// Entry of the relocation table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub offset: u16,
    pub segment: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MzHeader {
    /// Number of bytes used in the last page.
    pub last_page_bytes: u16,
    /// Number of pages, including the partially-used last one.
    pub pages: u16,
    pub relocation_count: u16,
    /// Size of the header, in paragraphs.
    pub header_paragraphs: u16,
    /// Paragraphs required by the program in addition to its image.
    pub min_allocation: u16,
    /// Paragraphs requested by the program in addition to its image.
    pub max_allocation: u16,
    pub initial_ss: u16,
    pub initial_sp: u16,
    pub checksum: u16,
    pub initial_ip: u16,
    pub initial_cs: u16,
    pub relocation_table_offset: u16,
    /// 0 for the main program.
    pub overlay: u16,
    pub oem_id: u16,
    pub oem_info: u16,
    /// Offset of the Windows header.
    pub new_header_start: u32,
    /// Empty if the table isn't right after the fixed part of the header.
    pub relocations: Vec<Relocation>,
}

impl MzHeader {
    /// Reads the header at the start of `cursor`. Leaves the cursor at the end of the header.
    pub fn read(
        cursor: &mut ByteCursor,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<MzHeader, HeaderError> {
        cursor.set_position(0);
        if cursor.read_bytes(2)? != b"MZ" {
            return Err(HeaderError::BadSignature("MZ"));
        }

        let last_page_bytes = cursor.read_word()?;
        let pages = cursor.read_word()?;
        let relocation_count = cursor.read_word()?;
        let header_paragraphs = cursor.read_word()?;
        let min_allocation = cursor.read_word()?;
        let max_allocation = cursor.read_word()?;
        let initial_ss = cursor.read_word()?;
        let initial_sp = cursor.read_word()?;
        let checksum = cursor.read_word()?;
        let initial_ip = cursor.read_word()?;
        let initial_cs = cursor.read_word()?;
        let relocation_table_offset = cursor.read_word()?;
        let overlay = cursor.read_word()?;
        cursor.skip(8);
        let oem_id = cursor.read_word()?;
        let oem_info = cursor.read_word()?;
        cursor.skip(20);
        let new_header_start = cursor.read_dword()?;

        let mut relocations = Vec::with_capacity(usize::from(relocation_count));
        if cursor.position() == usize::from(relocation_table_offset) {
            for _ in 0..relocation_count {
                relocations.push(Relocation {
                    offset: cursor.read_word()?,
                    segment: cursor.read_word()?,
                });
            }
        } else if relocation_count != 0 {
            log::debug!(
                "Relocation table at 0x{:x} isn't read",
                relocation_table_offset
            );
        }

        let header_end = usize::from(header_paragraphs) * PARAGRAPH_SIZE;
        if cursor.position() < header_end {
            let offset = cursor.position();
            let len = header_end - offset;
            if !cursor.check_reserved(len)? {
                let diagnostic = Diagnostic::ReservedNotZero { offset, len };
                log::warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }
        }

        if new_header_start == 0 {
            return Err(HeaderError::MissingNewHeader);
        }

        Ok(MzHeader {
            last_page_bytes,
            pages,
            relocation_count,
            header_paragraphs,
            min_allocation,
            max_allocation,
            initial_ss,
            initial_sp,
            checksum,
            initial_ip,
            initial_cs,
            relocation_table_offset,
            overlay,
            oem_id,
            oem_info,
            new_header_start,
            relocations,
        })
    }

    /// Size of the header in bytes.
    pub fn header_bytes(&self) -> usize {
        usize::from(self.header_paragraphs) * PARAGRAPH_SIZE
    }

    /// Size of the DOS image in bytes, header included, as declared by the header.
    pub fn file_bytes(&self) -> usize {
        usize::from(self.pages).saturating_sub(1) * PAGE_SIZE + usize::from(self.last_page_bytes)
    }

    pub fn new_header_start(&self) -> usize {
        self.new_header_start as usize
    }

    /// Bytes of the DOS program that precedes the Windows header.
    pub fn stub_range(&self) -> Range<usize> {
        let start = self.header_bytes();
        start..self.new_header_start().max(start)
    }

    /// Registers assigned by the loader.
    pub fn seed(&self) -> Seed {
        Seed {
            ss: self.initial_ss,
            sp: self.initial_sp,
            ip: self.initial_ip,
            cs: self.initial_cs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MzHeader, Relocation};
    use crate::{
        cursor::ByteCursor,
        error::{Diagnostic, HeaderError},
        registers::Seed,
    };

    fn header(header_paragraphs: u16, relocations: &[(u16, u16)], new_header: u32) -> Vec<u8> {
        let mut out = b"MZ".to_vec();
        let words = [
            0x90,
            3,
            relocations.len() as u16,
            header_paragraphs,
            0,
            0xffff,
            0x10,
            0xb8,
            0,
            0x14,
            0x2,
            0x40,
            0,
        ];
        for word in words.iter() {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&0x1234u16.to_le_bytes());
        out.extend_from_slice(&0x5678u16.to_le_bytes());
        out.extend_from_slice(&[0; 20]);
        out.extend_from_slice(&new_header.to_le_bytes());
        for (offset, segment) in relocations {
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&segment.to_le_bytes());
        }
        out
    }

    #[test]
    fn fields_and_helpers() {
        let mut bytes = header(6, &[(0x10, 0x0), (0x22, 0x1)], 0x80);
        bytes.resize(0x80, 0);
        let mut diagnostics = Vec::new();
        let mz = MzHeader::read(&mut ByteCursor::new(bytes), &mut diagnostics).unwrap();

        assert_eq!(mz.pages, 3);
        assert_eq!(mz.file_bytes(), 2 * 512 + 0x90);
        assert_eq!(mz.header_bytes(), 0x60);
        assert_eq!(mz.oem_id, 0x1234);
        assert_eq!(mz.oem_info, 0x5678);
        assert_eq!(
            mz.relocations,
            vec![
                Relocation {
                    offset: 0x10,
                    segment: 0
                },
                Relocation {
                    offset: 0x22,
                    segment: 1
                }
            ]
        );
        assert_eq!(mz.stub_range(), 0x60..0x80);
        assert_eq!(
            mz.seed(),
            Seed {
                ss: 0x10,
                sp: 0xb8,
                ip: 0x14,
                cs: 0x2
            }
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn dirty_padding_is_a_warning() {
        let mut bytes = header(5, &[], 0x50);
        bytes.resize(0x50, 0);
        bytes[0x44] = 1;
        let mut diagnostics = Vec::new();
        let mz = MzHeader::read(&mut ByteCursor::new(bytes), &mut diagnostics).unwrap();
        assert_eq!(mz.stub_range(), 0x50..0x50);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::ReservedNotZero {
                offset: 0x40,
                len: 0x10
            }]
        );
    }

    #[test]
    fn errors() {
        let mut cursor = ByteCursor::new(b"ZM".to_vec());
        assert!(matches!(
            MzHeader::read(&mut cursor, &mut Vec::new()),
            Err(HeaderError::BadSignature("MZ"))
        ));

        let mut cursor = ByteCursor::new(header(4, &[], 0));
        assert!(matches!(
            MzHeader::read(&mut cursor, &mut Vec::new()),
            Err(HeaderError::MissingNewHeader)
        ));

        let mut cursor = ByteCursor::new(b"MZ\x00".to_vec());
        assert!(matches!(
            MzHeader::read(&mut cursor, &mut Vec::new()),
            Err(HeaderError::Truncated(_))
        ));
    }
}
