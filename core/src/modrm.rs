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

//! Decoding of the ModRM byte that follows most opcodes taking a register or memory operand.
//!
//! The byte is made of three fields: `mod` (bits 6-7), `reg` (bits 3-5) and `rm` (bits 0-2).
//! When `mod` is 3, `rm` designates a register. Otherwise, `rm` designates a base expression to
//! which a displacement is added.
//!
//! A memory operand whose base registers aren't all known can't be resolved, whether or not
//! the instruction ends up reading the memory.

use crate::{
    cursor::ByteCursor,
    error::DecodeError,
    registers::{Register, RegisterValue},
};
use core::fmt;

/// Registers summed to form an effective address.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Base {
    #[display(fmt = "bx+si")]
    BxSi,
    #[display(fmt = "bx+di")]
    BxDi,
    #[display(fmt = "bp+si")]
    BpSi,
    #[display(fmt = "bp+di")]
    BpDi,
    #[display(fmt = "si")]
    Si,
    #[display(fmt = "di")]
    Di,
    #[display(fmt = "bp")]
    Bp,
    #[display(fmt = "bx")]
    Bx,
}

impl Base {
    fn from_rm(rm: u8) -> Base {
        match rm & 0b111 {
            0 => Base::BxSi,
            1 => Base::BxDi,
            2 => Base::BpSi,
            3 => Base::BpDi,
            4 => Base::Si,
            5 => Base::Di,
            6 => Base::Bp,
            _ => Base::Bx,
        }
    }

    /// Returns the registers whose values are added together.
    pub fn registers(self) -> &'static [Register] {
        match self {
            Base::BxSi => &[Register::Bx, Register::Si],
            Base::BxDi => &[Register::Bx, Register::Di],
            Base::BpSi => &[Register::Bp, Register::Si],
            Base::BpDi => &[Register::Bp, Register::Di],
            Base::Si => &[Register::Si],
            Base::Di => &[Register::Di],
            Base::Bp => &[Register::Bp],
            Base::Bx => &[Register::Bx],
        }
    }

    /// Returns the segment register used by default. Addresses based on `bp` are relative to
    /// the stack segment.
    pub fn segment(self) -> Register {
        match self {
            Base::BpSi | Base::BpDi | Base::Bp => Register::Ss,
            _ => Register::Ds,
        }
    }
}

/// How a memory operand is addressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// `mod` = 0 and `rm` = 6. Absolute 16-bit address.
    Direct(u16),
    /// `mod` = 0. No displacement.
    Base(Base),
    /// `mod` = 1. The displacement is sign-extended.
    BaseByte(Base, i8),
    /// `mod` = 2.
    BaseWord(Base, u16),
}

impl Addressing {
    /// Returns the displacement, extended to 16 bits.
    pub fn displacement(&self) -> u16 {
        match *self {
            Addressing::Direct(addr) => addr,
            Addressing::Base(_) => 0,
            Addressing::BaseByte(_, disp) => disp as i16 as u16,
            Addressing::BaseWord(_, disp) => disp,
        }
    }

    pub fn base(&self) -> Option<Base> {
        match *self {
            Addressing::Direct(_) => None,
            Addressing::Base(base)
            | Addressing::BaseByte(base, _)
            | Addressing::BaseWord(base, _) => Some(base),
        }
    }
}

impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Addressing::Direct(addr) => write!(f, "[0x{:X}]", addr),
            Addressing::Base(base) => write!(f, "[{}]", base),
            Addressing::BaseByte(base, disp) if disp < 0 => {
                write!(f, "[{}-0x{:X}]", base, i16::from(disp).unsigned_abs())
            }
            Addressing::BaseByte(base, disp) => write!(f, "[{}+0x{:X}]", base, disp),
            Addressing::BaseWord(base, disp) => write!(f, "[{}+0x{:X}]", base, disp),
        }
    }
}

/// Memory operand designated by a ModRM byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Memory {
    pub addressing: Addressing,
    /// Base registers plus displacement, wrapping at 16 bits.
    pub effective_address: u16,
    /// Segment register the effective address is relative to.
    pub segment: Register,
}

/// Operand designated by the `mod` and `rm` fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Index of a register, as found in the `rm` field.
    Register(u8),
    Memory(Memory),
}

/// Decoded ModRM byte, plus the displacement that follows it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OperandResolution {
    /// Raw value of the byte.
    pub modrm: u8,
    pub mode: u8,
    pub reg: u8,
    pub rm: u8,
    pub operand: Operand,
}

impl OperandResolution {
    /// Reads a ModRM byte, and its displacement if any, from `cursor`.
    ///
    /// `read_register` is called to obtain the value of each base register the operand refers
    /// to. If one of them is symbolic, returns [`DecodeError::UnresolvedOperand`] for the
    /// instruction at `offset`.
    pub fn read(
        cursor: &mut ByteCursor,
        offset: usize,
        mut read_register: impl FnMut(Register) -> RegisterValue,
    ) -> Result<Self, DecodeError> {
        let modrm = cursor.read_byte()?;
        let mode = modrm >> 6;
        let reg = (modrm >> 3) & 0b111;
        let rm = modrm & 0b111;

        let addressing = match (mode, rm) {
            (3, _) => None,
            (0, 6) => Some(Addressing::Direct(cursor.read_word()?)),
            (0, _) => Some(Addressing::Base(Base::from_rm(rm))),
            (1, _) => Some(Addressing::BaseByte(
                Base::from_rm(rm),
                cursor.read_byte()? as i8,
            )),
            _ => Some(Addressing::BaseWord(Base::from_rm(rm), cursor.read_word()?)),
        };

        let operand = match addressing {
            None => Operand::Register(rm),
            Some(addressing) => {
                let (effective_address, segment) = match addressing.base() {
                    None => (addressing.displacement(), Register::Ds),
                    Some(base) => {
                        let mut sum = addressing.displacement();
                        for register in base.registers() {
                            match read_register(*register) {
                                RegisterValue::Concrete(value) => sum = sum.wrapping_add(value),
                                RegisterValue::Symbolic(_) => {
                                    return Err(DecodeError::UnresolvedOperand {
                                        register: *register,
                                        offset,
                                    })
                                }
                            }
                        }
                        (sum, base.segment())
                    }
                };

                Operand::Memory(Memory {
                    addressing,
                    effective_address,
                    segment,
                })
            }
        };

        Ok(OperandResolution {
            modrm,
            mode,
            reg,
            rm,
            operand,
        })
    }

    /// Returns the effective address, if the operand is in memory.
    pub fn effective_address(&self) -> Option<u16> {
        match &self.operand {
            Operand::Register(_) => None,
            Operand::Memory(mem) => Some(mem.effective_address),
        }
    }

    /// Returns true if `mod` is 3.
    pub fn is_register(&self) -> bool {
        matches!(self.operand, Operand::Register(_))
    }
}

impl fmt::Display for Operand {
    /// Formats as a 16-bit operand.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Register(rm) => write!(f, "{}", Register::word(*rm)),
            Operand::Memory(mem) => write!(f, "{}", mem.addressing),
        }
    }
}

/// Returns the 20-bit address designated by a segment and an offset.
pub fn physical_offset(segment: u16, offset: u16) -> usize {
    (usize::from(segment) << 4) + usize::from(offset)
}
