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

//! Interpretation of the DOS services called through `int 21h`.

use crate::{
    cursor::ByteCursor,
    decoder::read_word,
    error::{DecodeError, Diagnostic},
    registers::{Register, RegisterFile, RegisterValue},
};
use core::ops::RangeInclusive;

/// Interrupt vector of the DOS services.
pub const DOS_SERVICES: u8 = 0x21;

/// `ah` value of the "print string" service.
pub const PRINT_STRING: u8 = 0x09;
/// `ah` value of the "terminate with return code" service.
pub const EXIT: u8 = 0x4c;

/// Outcome of decoding an `int` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupt {
    pub vector: u8,
    /// Disassembly of the instruction itself, such as `int 21h`.
    pub text: String,
    /// Pseudo-statement describing the service being called.
    pub annotation: Option<String>,
    /// Bytes of the code that the service reads as data.
    pub skip: Option<RangeInclusive<usize>>,
}

/// Decodes an `int` instruction whose vector has already been read.
///
/// `offset` is the offset of the instruction, used in errors. Only the services of
/// `int 21h` listed in this module are recognized. For any other service or vector, only the
/// text is produced.
pub fn interpret(
    vector: u8,
    offset: usize,
    code: &ByteCursor,
    regs: &RegisterFile,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Interrupt, DecodeError> {
    let mut interrupt = Interrupt {
        vector,
        text: format!("int {:x}h", vector),
        annotation: None,
        skip: None,
    };

    if vector != DOS_SERVICES {
        return Ok(interrupt);
    }

    let service = match regs.read_byte(Register::Ah) {
        Some(RegisterValue::Concrete(ah)) => ah,
        _ => {
            return Err(DecodeError::UnresolvedOperand {
                register: Register::Ah,
                offset,
            })
        }
    };

    match service {
        PRINT_STRING => {
            let start = match read_word(regs, diagnostics, Register::Dx, offset) {
                RegisterValue::Concrete(dx) => usize::from(dx),
                RegisterValue::Symbolic(_) => {
                    return Err(DecodeError::UnresolvedOperand {
                        register: Register::Dx,
                        offset,
                    })
                }
            };

            let end = code
                .find_first_byte_from(start, b'$')
                .ok_or(DecodeError::UnterminatedString { start })?;
            let string = code.read_string_from_to(start, end)?;
            log::debug!("Print string at 0x{:x}: {:?}", start, string);

            interrupt.annotation = Some(format!("; printf(\"{}\");", escape(&string)));
            interrupt.skip = Some(start..=end);
        }
        EXIT => {
            let code = regs.read_byte(Register::Al);
            log::debug!("Exit with code {:?}", code);

            interrupt.annotation = Some(match code {
                Some(RegisterValue::Concrete(al)) => format!("; exit({});", al),
                Some(RegisterValue::Symbolic(reg)) => format!("; exit({});", reg),
                None => format!("; exit({});", Register::Al),
            });
        }
        _ => {}
    }

    Ok(interrupt)
}

fn escape(s: &str) -> String {
    s.replace('\n', "\\n").replace('\r', "\\r")
}
