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

//! Inspection of DOS and 16-bit Windows executables.
//!
//! Every such executable starts with an MZ header followed by a small DOS program, the *stub*,
//! that usually prints a message such as "This program cannot be run in DOS mode." and exits.
//! This crate parses the headers, and decodes the stub into its disassembly while evaluating
//! its effects on the registers, the stack and the code itself.
//!
//! The entry points are [`Executable::read`] for a whole file, and [`decode`] for raw code.
//!
//! Registers whose value isn't known, for example because the code reads them before writing
//! them, hold a [`RegisterValue::Symbolic`] value that designates the register by name.

#![deny(unsafe_code)]

pub mod cursor;
pub mod decoder;
pub mod dos;
pub mod error;
pub mod executable;
pub mod modrm;
pub mod mz;
pub mod ne;
pub mod pe;
pub mod registers;
pub mod stack;

pub use self::cursor::{ByteCursor, OutOfBounds};
pub use self::decoder::{decode, DecodedInstruction, Decoder, Halt, Trace};
pub use self::error::{DecodeError, Diagnostic, HeaderError};
pub use self::executable::{Executable, Extension};
pub use self::registers::{Register, RegisterFile, RegisterValue, Seed};
