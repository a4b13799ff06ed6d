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

use crate::{cursor::OutOfBounds, registers::Register};
use std::io;

/// Error that aborts a decoding pass.
///
/// Offsets are absolute offsets within the decoded buffer, pointing at the first byte of the
/// faulty instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Register {register} has no known value at offset 0x{offset:x}")]
    UnresolvedOperand { register: Register, offset: usize },

    #[error("Stack is empty when popping at offset 0x{offset:x}")]
    EmptyStack { offset: usize },

    #[error("Unsupported opcode 0x{opcode:02x} at offset 0x{offset:x}")]
    UnsupportedOpcode { opcode: u8, offset: usize },

    #[error("Unsupported ModRM byte 0x{modrm:02x} for opcode 0x{opcode:02x} at offset 0x{offset:x}")]
    UnsupportedOperand { opcode: u8, modrm: u8, offset: usize },

    /// `int 21h` function 9 was called, but no `$` follows the string.
    #[error("String at offset 0x{start:x} isn't terminated with `$`")]
    UnterminatedString { start: usize },

    /// A `call` targets itself or code before it.
    #[error("Call at offset 0x{offset:x} goes back to 0x{target:x}")]
    BackwardCall { target: usize, offset: usize },

    /// The pass executed more instructions than allowed, for example because of a loop built
    /// with `push` and `ret`.
    #[error("Step limit of {limit} reached at offset 0x{offset:x}")]
    StepLimit { limit: usize, offset: usize },

    #[error("{0}")]
    OutOfBounds(#[from] OutOfBounds),
}

/// Error while parsing the fixed-layout executable headers.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    /// The header doesn't start with the expected signature, such as `MZ`.
    #[error("Missing `{0}` signature")]
    BadSignature(&'static str),

    #[error("Header doesn't point to a new executable header")]
    MissingNewHeader,

    #[error("The {table} table at 0x{expected:x} overlaps data ending at 0x{position:x}")]
    TableOverlap {
        table: &'static str,
        expected: usize,
        position: usize,
    },

    #[error("Truncated header: {0}")]
    Truncated(#[from] OutOfBounds),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Non-fatal anomaly noticed while decoding or parsing.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Diagnostic {
    /// A 16-bit register was read while only one of its halves was known.
    #[display(
        fmt = "{} is partially defined at offset 0x{:x}, {} replaced with 0",
        register,
        offset,
        unknown
    )]
    DegradedRead {
        register: Register,
        unknown: Register,
        offset: usize,
    },

    /// Bytes that are supposed to be zero aren't.
    #[display(fmt = "{} reserved byte(s) at offset 0x{:x} aren't zero", len, offset)]
    ReservedNotZero { offset: usize, len: usize },

    /// A `rep` prefix was found. Its termination condition isn't modelled, and the instruction
    /// is executed once.
    #[display(fmt = "rep prefix at offset 0x{:x} executed once", offset)]
    RepNotModelled { offset: usize },

    /// Unexpected bytes between two tables of a header were skipped.
    #[display(fmt = "skipped unknown bytes 0x{:x}..0x{:x}", from, to)]
    SkippedGap { from: usize, to: usize },
}
