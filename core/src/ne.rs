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

//! The "New Executable" header of 16-bit Windows programs and libraries.
//!
//! Unless noted otherwise, the offsets stored in this header are relative to the start of the
//! header.

use crate::{
    cursor::ByteCursor,
    error::{Diagnostic, HeaderError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeHeader {
    /// Major and minor version of the linker.
    pub linker_version: (u8, u8),
    pub entry_table_offset: u16,
    pub entry_table_length: u16,
    pub crc: u32,
    pub flags: u16,
    pub auto_data_segment: u16,
    pub initial_heap: u16,
    pub initial_stack: u16,
    pub ip: u16,
    pub cs: u16,
    pub sp: u16,
    pub ss: u16,
    pub segment_count: u16,
    pub module_reference_count: u16,
    pub non_resident_names_size: u16,
    pub segment_table_offset: u16,
    pub resource_table_offset: u16,
    pub resident_names_offset: u16,
    pub module_reference_offset: u16,
    pub imported_names_offset: u16,
    /// Stored in the file relative to the start of the file.
    pub non_resident_names_offset: u32,
    pub movable_entry_points: u16,
    /// Segment data is stored at offsets multiple of `1 << shift_count`.
    pub shift_count: u16,
    pub resource_segment_count: u16,
    pub target_os: u8,
    pub additional_info: u8,
    pub fast_load_offset: u16,
    pub fast_load_length: u16,
    /// Major and minor version of Windows.
    pub expected_windows_version: (u8, u8),
    pub segments: Vec<Segment>,
    pub resources: ResourceTable,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment {
    /// In units of `1 << shift_count` bytes. Zero if the segment has no data.
    pub data_offset: u16,
    /// Zero means 64kiB.
    pub length: u16,
    pub flags: u16,
    pub min_allocation: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    pub alignment_shift: u16,
    pub types: Vec<ResourceTypeInfo>,
    pub strings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeInfo {
    /// If the high bit is set, a [`ResourceType`]. Otherwise the offset of a string within the
    /// resource table.
    pub type_id: u16,
    pub resources: Vec<ResourceName>,
}

impl ResourceTypeInfo {
    /// Returns the type, or `None` if the type is designated by a string.
    pub fn resource_type(&self) -> Option<ResourceType> {
        if self.type_id & 0x8000 != 0 {
            Some(ResourceType::from(self.type_id))
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub offset: u16,
    pub length: u16,
    pub flags: u16,
    pub id: u16,
}

/// Predefined type of a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ResourceType {
    Cursor,
    Bitmap,
    Icon,
    Menu,
    Dialog,
    String,
    FontDir,
    Font,
    Accelerator,
    RcData,
    MessageTable,
    GroupCursor,
    GroupIcon,
    Version,
    DlgInclude,
    PlugPlay,
    Vxd,
    AniCursor,
    AniIcon,
    Html,
    Manifest,
    #[display(fmt = "0x{:X}", _0)]
    Other(u16),
}

impl From<u16> for ResourceType {
    fn from(id: u16) -> ResourceType {
        match id {
            0x8001 => ResourceType::Cursor,
            0x8002 => ResourceType::Bitmap,
            0x8003 => ResourceType::Icon,
            0x8004 => ResourceType::Menu,
            0x8005 => ResourceType::Dialog,
            0x8006 => ResourceType::String,
            0x8007 => ResourceType::FontDir,
            0x8008 => ResourceType::Font,
            0x8009 => ResourceType::Accelerator,
            0x800a => ResourceType::RcData,
            0x800b => ResourceType::MessageTable,
            0x800c => ResourceType::GroupCursor,
            0x800e => ResourceType::GroupIcon,
            0x8010 => ResourceType::Version,
            0x8011 => ResourceType::DlgInclude,
            0x8013 => ResourceType::PlugPlay,
            0x8014 => ResourceType::Vxd,
            0x8015 => ResourceType::AniCursor,
            0x8016 => ResourceType::AniIcon,
            0x8017 => ResourceType::Html,
            0x8018 => ResourceType::Manifest,
            other => ResourceType::Other(other),
        }
    }
}

impl NeHeader {
    /// Reads the header located at `offset`, followed by its segment and resource tables.
    pub fn read(
        cursor: &mut ByteCursor,
        offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<NeHeader, HeaderError> {
        cursor.set_position(offset);
        if cursor.read_bytes(2)? != b"NE" {
            return Err(HeaderError::BadSignature("NE"));
        }

        let linker_major = cursor.read_byte()?;
        let linker_minor = cursor.read_byte()?;
        let entry_table_offset = cursor.read_word()?;
        let entry_table_length = cursor.read_word()?;
        let crc = cursor.read_dword()?;
        let flags = cursor.read_word()?;
        let auto_data_segment = cursor.read_word()?;
        let initial_heap = cursor.read_word()?;
        let initial_stack = cursor.read_word()?;
        let ip = cursor.read_word()?;
        let cs = cursor.read_word()?;
        let sp = cursor.read_word()?;
        let ss = cursor.read_word()?;
        let segment_count = cursor.read_word()?;
        let module_reference_count = cursor.read_word()?;
        let non_resident_names_size = cursor.read_word()?;
        let segment_table_offset = cursor.read_word()?;
        let resource_table_offset = cursor.read_word()?;
        let resident_names_offset = cursor.read_word()?;
        let module_reference_offset = cursor.read_word()?;
        let imported_names_offset = cursor.read_word()?;
        let non_resident_names_offset = cursor.read_dword()?.wrapping_sub(offset as u32);
        let movable_entry_points = cursor.read_word()?;
        let shift_count = cursor.read_word()?;
        let resource_segment_count = cursor.read_word()?;
        let target_os = cursor.read_byte()?;
        let additional_info = cursor.read_byte()?;
        let fast_load_offset = cursor.read_word()?;
        let fast_load_length = cursor.read_word()?;
        reserved(cursor, 2, diagnostics)?;
        let windows_minor = cursor.read_byte()?;
        let windows_major = cursor.read_byte()?;

        seek_table(cursor, "segment", offset + usize::from(segment_table_offset), diagnostics)?;
        let mut segments = Vec::with_capacity(usize::from(segment_count));
        for _ in 0..segment_count {
            segments.push(Segment {
                data_offset: cursor.read_word()?,
                length: cursor.read_word()?,
                flags: cursor.read_word()?,
                min_allocation: cursor.read_word()?,
            });
        }

        seek_table(cursor, "resource", offset + usize::from(resource_table_offset), diagnostics)?;
        let resources = ResourceTable::read(
            cursor,
            usize::from(resident_names_offset.saturating_sub(resource_table_offset)),
            diagnostics,
        )?;

        Ok(NeHeader {
            linker_version: (linker_major, linker_minor),
            entry_table_offset,
            entry_table_length,
            crc,
            flags,
            auto_data_segment,
            initial_heap,
            initial_stack,
            ip,
            cs,
            sp,
            ss,
            segment_count,
            module_reference_count,
            non_resident_names_size,
            segment_table_offset,
            resource_table_offset,
            resident_names_offset,
            module_reference_offset,
            imported_names_offset,
            non_resident_names_offset,
            movable_entry_points,
            shift_count,
            resource_segment_count,
            target_os,
            additional_info,
            fast_load_offset,
            fast_load_length,
            expected_windows_version: (windows_major, windows_minor),
            segments,
            resources,
        })
    }
}

impl ResourceTable {
    /// Reads the table at the current position. `length` is the size of the table, as deduced
    /// from the offset of the table that follows.
    fn read(
        cursor: &mut ByteCursor,
        length: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<ResourceTable, HeaderError> {
        let start = cursor.position();
        let alignment_shift = cursor.read_word()?;

        let mut types = Vec::new();
        while cursor.peek_word()? != 0 {
            let type_id = cursor.read_word()?;
            let count = cursor.read_word()?;
            reserved(cursor, 4, diagnostics)?;

            let mut resources = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                resources.push(ResourceName {
                    offset: cursor.read_word()?,
                    length: cursor.read_word()?,
                    flags: cursor.read_word()?,
                    id: cursor.read_word()?,
                });
                reserved(cursor, 4, diagnostics)?;
            }

            types.push(ResourceTypeInfo { type_id, resources });
        }
        cursor.skip(2);

        // Many files end the table here, without the list of strings.
        let mut strings = Vec::new();
        if cursor.position() - start < length {
            while cursor.peek_byte()? != 0 {
                let len = cursor.read_byte()?;
                strings.push(cursor.read_string(usize::from(len))?);
            }
            cursor.skip(1);
        }

        Ok(ResourceTable {
            alignment_shift,
            types,
            strings,
        })
    }
}

fn reserved(
    cursor: &mut ByteCursor,
    len: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), HeaderError> {
    let offset = cursor.position();
    if !cursor.check_reserved(len)? {
        let diagnostic = Diagnostic::ReservedNotZero { offset, len };
        log::warn!("{}", diagnostic);
        diagnostics.push(diagnostic);
    }
    Ok(())
}

/// Moves the cursor to the start of a table that is expected to follow the data read so far.
fn seek_table(
    cursor: &mut ByteCursor,
    table: &'static str,
    expected: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), HeaderError> {
    let position = cursor.position();
    if position > expected {
        return Err(HeaderError::TableOverlap {
            table,
            expected,
            position,
        });
    }

    if position < expected {
        let diagnostic = Diagnostic::SkippedGap {
            from: position,
            to: expected,
        };
        log::warn!("{} before the {} table", diagnostic, table);
        diagnostics.push(diagnostic);
        cursor.set_position(expected);
    }

    Ok(())
}
