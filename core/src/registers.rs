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

//! Architectural state of an 8086, with support for registers whose value isn't known.
//!
//! Every register starts in the *symbolic* state, in which its value is represented by its own
//! name. Code that reads such a register can then be detected, instead of silently working on
//! a default value of zero.
//!
//! The `AX`, `BX`, `CX` and `DX` registers don't have any storage of their own. They are views
//! over their two 8-bit halves. Reading one of them while exactly one half is known produces a
//! [`WordRead::Degraded`] outcome, in which the unknown half is replaced with zero.

use core::fmt;

/// Name of a register.
///
/// The `Display` implementation produces the name used in the disassembly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Register {
    #[display(fmt = "al")]
    Al,
    #[display(fmt = "cl")]
    Cl,
    #[display(fmt = "dl")]
    Dl,
    #[display(fmt = "bl")]
    Bl,
    #[display(fmt = "ah")]
    Ah,
    #[display(fmt = "ch")]
    Ch,
    #[display(fmt = "dh")]
    Dh,
    #[display(fmt = "bh")]
    Bh,
    #[display(fmt = "ax")]
    Ax,
    #[display(fmt = "cx")]
    Cx,
    #[display(fmt = "dx")]
    Dx,
    #[display(fmt = "bx")]
    Bx,
    #[display(fmt = "sp")]
    Sp,
    #[display(fmt = "bp")]
    Bp,
    #[display(fmt = "si")]
    Si,
    #[display(fmt = "di")]
    Di,
    #[display(fmt = "es")]
    Es,
    #[display(fmt = "cs")]
    Cs,
    #[display(fmt = "ss")]
    Ss,
    #[display(fmt = "ds")]
    Ds,
    #[display(fmt = "ip")]
    Ip,
}

const BYTE_REGS: [Register; 8] = [
    Register::Al,
    Register::Cl,
    Register::Dl,
    Register::Bl,
    Register::Ah,
    Register::Ch,
    Register::Dh,
    Register::Bh,
];

const WORD_REGS: [Register; 8] = [
    Register::Ax,
    Register::Cx,
    Register::Dx,
    Register::Bx,
    Register::Sp,
    Register::Bp,
    Register::Si,
    Register::Di,
];

const SEGMENT_REGS: [Register; 4] = [Register::Es, Register::Cs, Register::Ss, Register::Ds];

/// Where the value of a register is stored within a [`RegisterFile`].
#[derive(Debug, Copy, Clone)]
enum Slot {
    Low(usize),
    High(usize),
    Pair(usize),
    Pointer(usize),
    Segment(usize),
    Ip,
}

impl Register {
    /// Returns the 8-bit register designated by a 3-bits `reg` or `rm` field.
    pub fn byte(index: u8) -> Register {
        BYTE_REGS[usize::from(index & 0b111)]
    }

    /// Returns the 16-bit register designated by a 3-bits `reg` or `rm` field.
    pub fn word(index: u8) -> Register {
        WORD_REGS[usize::from(index & 0b111)]
    }

    /// Returns the segment register designated by the `reg` field of `mov` to/from a segment
    /// register. Only the values 0 to 3 are valid on the 8086.
    pub fn segment(index: u8) -> Option<Register> {
        SEGMENT_REGS.get(usize::from(index)).copied()
    }

    /// Returns true for `al` to `bh`.
    pub fn is_byte(self) -> bool {
        matches!(self.slot(), Slot::Low(_) | Slot::High(_))
    }

    /// For `ax`, `bx`, `cx` and `dx`, returns the high and low halves.
    pub fn halves(self) -> Option<(Register, Register)> {
        match self.slot() {
            Slot::Pair(n) => Some((BYTE_REGS[n + 4], BYTE_REGS[n])),
            _ => None,
        }
    }

    fn slot(self) -> Slot {
        match self {
            Register::Al => Slot::Low(0),
            Register::Cl => Slot::Low(1),
            Register::Dl => Slot::Low(2),
            Register::Bl => Slot::Low(3),
            Register::Ah => Slot::High(0),
            Register::Ch => Slot::High(1),
            Register::Dh => Slot::High(2),
            Register::Bh => Slot::High(3),
            Register::Ax => Slot::Pair(0),
            Register::Cx => Slot::Pair(1),
            Register::Dx => Slot::Pair(2),
            Register::Bx => Slot::Pair(3),
            Register::Sp => Slot::Pointer(0),
            Register::Bp => Slot::Pointer(1),
            Register::Si => Slot::Pointer(2),
            Register::Di => Slot::Pointer(3),
            Register::Es => Slot::Segment(0),
            Register::Cs => Slot::Segment(1),
            Register::Ss => Slot::Segment(2),
            Register::Ds => Slot::Segment(3),
            Register::Ip => Slot::Ip,
        }
    }
}

/// Value held by a register or a stack entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegisterValue<T = u16> {
    /// The value is known.
    Concrete(T),
    /// The value isn't known. Contains the name of the register whose initial value this is.
    Symbolic(Register),
}

impl<T: Copy> RegisterValue<T> {
    /// Returns the value if it is known.
    pub fn concrete(&self) -> Option<T> {
        match *self {
            RegisterValue::Concrete(v) => Some(v),
            RegisterValue::Symbolic(_) => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, RegisterValue::Symbolic(_))
    }
}

impl<T: fmt::UpperHex> fmt::Display for RegisterValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegisterValue::Concrete(v) => write!(f, "0x{:X}", v),
            RegisterValue::Symbolic(reg) => write!(f, "{}", reg),
        }
    }
}

/// Outcome of reading a 16-bit register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WordRead {
    Concrete(u16),
    /// Only one of the two halves is known. `value` contains zero in place of the `unknown`
    /// half.
    Degraded { value: u16, unknown: Register },
    Symbolic(Register),
}

impl WordRead {
    /// Converts to a [`RegisterValue`], accepting the zero-filled value of a degraded read.
    pub fn into_value(self) -> RegisterValue {
        match self {
            WordRead::Concrete(v) | WordRead::Degraded { value: v, .. } => {
                RegisterValue::Concrete(v)
            }
            WordRead::Symbolic(reg) => RegisterValue::Symbolic(reg),
        }
    }
}

/// Values of the `SS`, `SP`, `IP` and `CS` registers found in an executable header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Seed {
    pub ss: u16,
    pub sp: u16,
    pub ip: u16,
    pub cs: u16,
}

/// Single-bit entries of the `FLAGS` register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flag {
    Carry,
    Parity,
    Adjust,
    Zero,
    Sign,
    Trap,
    Interrupt,
    Direction,
    Overflow,
    NestedTask,
}

impl Flag {
    fn bit(self) -> u16 {
        match self {
            Flag::Carry => 0,
            Flag::Parity => 2,
            Flag::Adjust => 4,
            Flag::Zero => 6,
            Flag::Sign => 7,
            Flag::Trap => 8,
            Flag::Interrupt => 9,
            Flag::Direction => 10,
            Flag::Overflow => 11,
            Flag::NestedTask => 14,
        }
    }
}

/// Bits of `FLAGS` that have a meaning. Bits 1, 3, 5 and 15 are reserved.
pub const FLAGS_MASK: u16 = 0b0111_1111_1101_0101;

const IOPL_SHIFT: u16 = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Pair {
    high: RegisterValue<u8>,
    low: RegisterValue<u8>,
}

/// State of all the registers of the CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    /// `ax`, `cx`, `dx`, `bx`, in this order.
    pairs: [Pair; 4],
    /// `sp`, `bp`, `si`, `di`, in this order.
    pointers: [RegisterValue; 4],
    /// `es`, `cs`, `ss`, `ds`, in this order.
    segments: [RegisterValue; 4],
    ip: RegisterValue,
    flags: u16,
}

impl RegisterFile {
    /// Builds a register file where every register is symbolic and every flag is cleared.
    pub fn new() -> Self {
        let pair = |n: usize| Pair {
            high: RegisterValue::Symbolic(BYTE_REGS[n + 4]),
            low: RegisterValue::Symbolic(BYTE_REGS[n]),
        };

        RegisterFile {
            pairs: [pair(0), pair(1), pair(2), pair(3)],
            pointers: [
                RegisterValue::Symbolic(Register::Sp),
                RegisterValue::Symbolic(Register::Bp),
                RegisterValue::Symbolic(Register::Si),
                RegisterValue::Symbolic(Register::Di),
            ],
            segments: [
                RegisterValue::Symbolic(Register::Es),
                RegisterValue::Symbolic(Register::Cs),
                RegisterValue::Symbolic(Register::Ss),
                RegisterValue::Symbolic(Register::Ds),
            ],
            ip: RegisterValue::Symbolic(Register::Ip),
            flags: 0,
        }
    }

    /// Same as [`RegisterFile::new`], then assigns the registers found in the header.
    pub fn seeded(seed: Seed) -> Self {
        let mut regs = RegisterFile::new();
        regs.set_word(Register::Ss, seed.ss);
        regs.set_word(Register::Sp, seed.sp);
        regs.set_word(Register::Ip, seed.ip);
        regs.set_word(Register::Cs, seed.cs);
        regs
    }

    /// Reads any register. 8-bit registers are zero-extended.
    pub fn read(&self, register: Register) -> WordRead {
        match register.slot() {
            Slot::Low(n) => Self::extend(self.pairs[n].low),
            Slot::High(n) => Self::extend(self.pairs[n].high),
            Slot::Pair(n) => self.read_pair(n, register),
            Slot::Pointer(n) => Self::word_read(self.pointers[n]),
            Slot::Segment(n) => Self::word_read(self.segments[n]),
            Slot::Ip => Self::word_read(self.ip),
        }
    }

    /// Reads an 8-bit register. Returns `None` if `register` isn't an 8-bit register.
    pub fn read_byte(&self, register: Register) -> Option<RegisterValue<u8>> {
        match register.slot() {
            Slot::Low(n) => Some(self.pairs[n].low),
            Slot::High(n) => Some(self.pairs[n].high),
            _ => None,
        }
    }

    /// Writes any register.
    ///
    /// Writing a concrete value to an 8-bit register only keeps the low byte of the value.
    /// Writing a symbolic value to `ax`, `bx`, `cx` or `dx` makes both halves symbolic.
    pub fn write(&mut self, register: Register, value: RegisterValue) {
        match register.slot() {
            Slot::Low(n) => self.pairs[n].low = Self::narrow(value),
            Slot::High(n) => self.pairs[n].high = Self::narrow(value),
            Slot::Pair(n) => {
                self.pairs[n] = match value {
                    RegisterValue::Concrete(v) => Pair {
                        high: RegisterValue::Concrete((v >> 8) as u8),
                        low: RegisterValue::Concrete((v & 0xff) as u8),
                    },
                    RegisterValue::Symbolic(reg) => {
                        let (high, low) = reg.halves().unwrap_or((reg, reg));
                        Pair {
                            high: RegisterValue::Symbolic(high),
                            low: RegisterValue::Symbolic(low),
                        }
                    }
                }
            }
            Slot::Pointer(n) => self.pointers[n] = value,
            Slot::Segment(n) => self.segments[n] = value,
            Slot::Ip => self.ip = value,
        }
    }

    pub fn write_byte(&mut self, register: Register, value: RegisterValue<u8>) {
        match value {
            RegisterValue::Concrete(v) => self.write(register, RegisterValue::Concrete(u16::from(v))),
            RegisterValue::Symbolic(reg) => self.write(register, RegisterValue::Symbolic(reg)),
        }
    }

    pub fn set_word(&mut self, register: Register, value: u16) {
        self.write(register, RegisterValue::Concrete(value));
    }

    pub fn set_byte(&mut self, register: Register, value: u8) {
        self.write_byte(register, RegisterValue::Concrete(value));
    }

    pub fn flag(&self, flag: Flag) -> bool {
        (self.flags & 1 << flag.bit()) != 0
    }

    pub fn set_flag(&mut self, flag: Flag, val: bool) {
        if val {
            self.flags |= 1 << flag.bit();
        } else {
            self.flags &= !(1 << flag.bit());
        }
    }

    /// Returns the two-bits I/O privilege level.
    pub fn iopl(&self) -> u8 {
        ((self.flags >> IOPL_SHIFT) & 0b11) as u8
    }

    pub fn set_iopl(&mut self, iopl: u8) {
        self.flags &= !(0b11 << IOPL_SHIFT);
        self.flags |= u16::from(iopl & 0b11) << IOPL_SHIFT;
    }

    /// Returns the `FLAGS` register. Reserved bits are always zero.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Overwrites the `FLAGS` register. Reserved bits are ignored.
    pub fn set_flags(&mut self, value: u16) {
        self.flags = value & FLAGS_MASK;
    }

    fn read_pair(&self, n: usize, name: Register) -> WordRead {
        let Pair { high, low } = self.pairs[n];
        match (high, low) {
            (RegisterValue::Concrete(h), RegisterValue::Concrete(l)) => {
                WordRead::Concrete(u16::from(h) << 8 | u16::from(l))
            }
            (RegisterValue::Concrete(h), RegisterValue::Symbolic(unknown)) => WordRead::Degraded {
                value: u16::from(h) << 8,
                unknown,
            },
            (RegisterValue::Symbolic(unknown), RegisterValue::Concrete(l)) => WordRead::Degraded {
                value: u16::from(l),
                unknown,
            },
            (RegisterValue::Symbolic(h), RegisterValue::Symbolic(l)) => {
                // Both halves came from the same origin, for example after `mov ax,bx` with an
                // unknown `bx`.
                let origin = WORD_REGS
                    .iter()
                    .copied()
                    .find(|reg| reg.halves() == Some((h, l)));
                match origin {
                    Some(reg) => WordRead::Symbolic(reg),
                    None if h == l => WordRead::Symbolic(h),
                    None => WordRead::Symbolic(name),
                }
            }
        }
    }

    fn word_read(value: RegisterValue) -> WordRead {
        match value {
            RegisterValue::Concrete(v) => WordRead::Concrete(v),
            RegisterValue::Symbolic(reg) => WordRead::Symbolic(reg),
        }
    }

    fn extend(value: RegisterValue<u8>) -> WordRead {
        match value {
            RegisterValue::Concrete(v) => WordRead::Concrete(u16::from(v)),
            RegisterValue::Symbolic(reg) => WordRead::Symbolic(reg),
        }
    }

    fn narrow(value: RegisterValue) -> RegisterValue<u8> {
        match value {
            RegisterValue::Concrete(v) => RegisterValue::Concrete((v & 0xff) as u8),
            RegisterValue::Symbolic(reg) => RegisterValue::Symbolic(reg),
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile::new()
    }
}
