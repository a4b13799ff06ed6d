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

//! Linear decoder and partial evaluator for 16-bit x86 code.
//!
//! The [`Decoder`] reads the code one instruction at a time, produces its disassembly, and
//! applies its effects on a [`RegisterFile`] and a [`Stack`]. Only a small set of opcodes, the
//! ones commonly found in the DOS stub of executables, is supported.
//!
//! Jumps are followed by moving the read position. Bytes are decoded again when an instruction
//! prefixed with `repne` is repeated, and when `ret` returns before itself. A `call` must go
//! forward, and a pass stops with [`DecodeError::StepLimit`] after [`STEP_LIMIT`] steps.

use crate::{
    cursor::{ByteCursor, OutOfBounds},
    dos,
    error::{DecodeError, Diagnostic},
    modrm::{physical_offset, Memory, Operand, OperandResolution},
    registers::{Flag, Register, RegisterFile, RegisterValue, Seed, WordRead},
    stack::Stack,
};
use core::convert::TryFrom;
use hashbrown::HashSet;

mod tests;

/// Default maximum number of steps of a pass.
pub const STEP_LIMIT: usize = 1 << 20;

/// Decodes `code` from its beginning, with the registers seeded from `seed`.
pub fn decode(code: Vec<u8>, seed: Seed) -> Result<Trace, DecodeError> {
    Decoder::new(code, seed).run()
}

/// Kind of a repeat prefix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RepKind {
    #[display(fmt = "rep")]
    Rep,
    #[display(fmt = "repne")]
    Repne,
}

/// Repeat prefix being applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RepState {
    pub kind: RepKind,
    /// Offset of the instruction that follows the prefix. The read position is moved back
    /// there for each new iteration.
    pub offset: usize,
}

/// Operation selected by the `reg` field of opcodes 0x81 and 0x83.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ArithmeticOp {
    #[display(fmt = "add")]
    Add,
    #[display(fmt = "or")]
    Or,
    #[display(fmt = "adc")]
    Adc,
    #[display(fmt = "sbb")]
    Sbb,
    #[display(fmt = "and")]
    And,
    #[display(fmt = "sub")]
    Sub,
    #[display(fmt = "xor")]
    Xor,
    #[display(fmt = "cmp")]
    Cmp,
}

impl ArithmeticOp {
    fn from_reg(reg: u8) -> ArithmeticOp {
        match reg & 0b111 {
            0 => ArithmeticOp::Add,
            1 => ArithmeticOp::Or,
            2 => ArithmeticOp::Adc,
            3 => ArithmeticOp::Sbb,
            4 => ArithmeticOp::And,
            5 => ArithmeticOp::Sub,
            6 => ArithmeticOp::Xor,
            _ => ArithmeticOp::Cmp,
        }
    }
}

/// Operation selected by the `reg` field of opcode 0xf7.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum UnaryOp {
    #[display(fmt = "test")]
    Test,
    #[display(fmt = "not")]
    Not,
    #[display(fmt = "neg")]
    Neg,
    #[display(fmt = "mul")]
    Mul,
    #[display(fmt = "imul")]
    Imul,
    #[display(fmt = "div")]
    Div,
    #[display(fmt = "idiv")]
    Idiv,
}

impl UnaryOp {
    /// Returns `None` for the value 1, which the 8086 doesn't define.
    fn from_reg(reg: u8) -> Option<UnaryOp> {
        match reg & 0b111 {
            0 => Some(UnaryOp::Test),
            2 => Some(UnaryOp::Not),
            3 => Some(UnaryOp::Neg),
            4 => Some(UnaryOp::Mul),
            5 => Some(UnaryOp::Imul),
            6 => Some(UnaryOp::Div),
            7 => Some(UnaryOp::Idiv),
            _ => None,
        }
    }
}

/// Instruction that has been decoded and executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Offset of the first byte of the instruction, prefix included.
    pub offset: usize,
    /// Number of bytes of the instruction, prefix included.
    pub len: usize,
    /// Disassembly.
    pub text: String,
    /// Pseudo-statement describing what the instruction does at a higher level, such as a
    /// DOS service call.
    pub annotation: Option<String>,
    /// Offsets of bytes that the instruction uses as data, and that must not be decoded.
    pub skip: Vec<usize>,
}

impl DecodedInstruction {
    /// Returns the text followed by the annotation, if any.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.text.as_str()).chain(self.annotation.as_deref())
    }
}

/// Unsupported opcode that stopped the decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Halt {
    pub opcode: u8,
    pub offset: usize,
}

/// Outcome of a successful decoding pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub instructions: Vec<DecodedInstruction>,
    pub diagnostics: Vec<Diagnostic>,
    /// If `Some`, the decoding stopped on an opcode that isn't supported. The instructions
    /// that precede it are still valid.
    pub halt: Option<Halt>,
}

impl Trace {
    /// Returns the disassembly, one line per entry.
    pub fn lines(&self) -> Vec<String> {
        self.instructions
            .iter()
            .flat_map(|i| i.lines())
            .map(|l| l.to_owned())
            .collect()
    }

    /// Turns a halted trace into an error.
    pub fn into_strict(self) -> Result<Trace, DecodeError> {
        match self.halt {
            Some(Halt { opcode, offset }) => Err(DecodeError::UnsupportedOpcode { opcode, offset }),
            None => Ok(self),
        }
    }
}

/// Effects of an instruction, as returned by its handler.
struct Executed {
    text: String,
    annotation: Option<String>,
    skip: Vec<usize>,
    /// If `Some`, the read position is moved there once the instruction is complete.
    jump: Option<usize>,
}

impl From<String> for Executed {
    fn from(text: String) -> Executed {
        Executed {
            text,
            annotation: None,
            skip: Vec::new(),
            jump: None,
        }
    }
}

impl<'a> From<&'a str> for Executed {
    fn from(text: &'a str) -> Executed {
        Executed::from(text.to_owned())
    }
}

/// State of a decoding pass.
pub struct Decoder {
    cursor: ByteCursor,
    regs: RegisterFile,
    stack: Stack,
    rep: Option<RepState>,
    /// Offsets of bytes that must be consumed without being decoded.
    skip: HashSet<usize>,
    diagnostics: Vec<Diagnostic>,
    /// Offset of the instruction being executed.
    offset: usize,
    steps: usize,
    step_limit: usize,
}

impl Decoder {
    /// Builds a decoder positioned at the start of `code`, with fresh registers.
    pub fn new(code: Vec<u8>, seed: Seed) -> Self {
        Self::with_registers(code, RegisterFile::seeded(seed))
    }

    pub fn with_registers(code: Vec<u8>, regs: RegisterFile) -> Self {
        Decoder {
            cursor: ByteCursor::new(code),
            regs,
            stack: Stack::new(),
            rep: None,
            skip: HashSet::new(),
            diagnostics: Vec::new(),
            offset: 0,
            steps: 0,
            step_limit: STEP_LIMIT,
        }
    }

    /// Changes the maximum number of calls to [`Decoder::step`] that [`Decoder::run`] makes.
    pub fn set_step_limit(&mut self, limit: usize) {
        self.step_limit = limit;
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn into_registers(self) -> RegisterFile {
        self.regs
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Returns the repeat prefix currently being applied.
    pub fn rep(&self) -> Option<RepState> {
        self.rep
    }

    pub fn cursor(&self) -> &ByteCursor {
        &self.cursor
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Decodes until the end of the code.
    ///
    /// Stops early and fills [`Trace::halt`] if an unsupported opcode is found.
    pub fn run(&mut self) -> Result<Trace, DecodeError> {
        let mut instructions = Vec::new();
        let mut halt = None;

        while self.cursor.available() {
            if self.steps >= self.step_limit {
                return Err(DecodeError::StepLimit {
                    limit: self.step_limit,
                    offset: self.cursor.position(),
                });
            }
            self.steps += 1;

            match self.step() {
                Ok(Some(instruction)) => instructions.push(instruction),
                Ok(None) => {}
                Err(DecodeError::UnsupportedOpcode { opcode, offset }) => {
                    log::warn!("Unsupported opcode 0x{:02x} at offset 0x{:x}", opcode, offset);
                    halt = Some(Halt { opcode, offset });
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Trace {
            instructions,
            diagnostics: self.diagnostics.clone(),
            halt,
        })
    }

    /// Decodes and executes the instruction at the current position.
    ///
    /// Returns `None` if no new instruction was decoded. This happens when the byte is part of
    /// the data of a previous instruction, or when an instruction is repeated.
    pub fn step(&mut self) -> Result<Option<DecodedInstruction>, DecodeError> {
        let start = self.cursor.position();
        let repeating = self.rep.map_or(false, |rep| rep.offset == start);

        let mut opcode = self.cursor.read_byte()?;
        if self.skip.contains(&start) {
            return Ok(None);
        }

        let mut prefix = None;
        while let Some(kind) = match opcode {
            0xf2 => Some(RepKind::Repne),
            0xf3 => Some(RepKind::Rep),
            _ => None,
        } {
            prefix = Some(kind);
            self.rep = Some(RepState {
                kind,
                offset: self.cursor.position(),
            });

            if !self.cursor.available() {
                return Ok(Some(DecodedInstruction {
                    offset: start,
                    len: self.cursor.position() - start,
                    text: kind.to_string(),
                    annotation: None,
                    skip: Vec::new(),
                }));
            }

            let position = self.cursor.position();
            opcode = self.cursor.read_byte()?;
            if self.skip.contains(&position) {
                return Ok(None);
            }
        }

        self.offset = start;
        let executed = self.execute(opcode)?;
        let end = self.cursor.position();
        if let Some(target) = executed.jump {
            self.cursor.set_position(target);
        }

        log::trace!("0x{:04x}: {}", start, executed.text);
        self.skip.extend(executed.skip.iter().copied());
        self.repeat()?;

        if repeating {
            return Ok(None);
        }

        let text = match prefix {
            Some(kind) => format!("{} {}", kind, executed.text),
            None => executed.text,
        };

        Ok(Some(DecodedInstruction {
            offset: start,
            len: end - start,
            text,
            annotation: executed.annotation,
            skip: executed.skip,
        }))
    }

    /// Applies the repeat prefix, if any, after an instruction has been executed.
    fn repeat(&mut self) -> Result<(), DecodeError> {
        let rep = match self.rep {
            Some(rep) => rep,
            None => return Ok(()),
        };

        match rep.kind {
            RepKind::Repne => {
                let cx = self.concrete(Register::Cx)?.wrapping_sub(1);
                self.regs.set_word(Register::Cx, cx);
                if self.regs.flag(Flag::Zero) || cx == 0 {
                    self.rep = None;
                } else {
                    self.cursor.set_position(rep.offset);
                }
            }
            RepKind::Rep => {
                let offset = rep.offset.saturating_sub(1);
                log::warn!(
                    "Termination of rep prefix at offset 0x{:x} isn't modelled, executed once",
                    offset
                );
                self.diagnostics.push(Diagnostic::RepNotModelled { offset });
                self.rep = None;
            }
        }

        Ok(())
    }

    fn execute(&mut self, opcode: u8) -> Result<Executed, DecodeError> {
        match opcode {
            0x00 => Ok("nop".into()),
            0x0e => self.push(Register::Cs),
            0x1f => self.pop(Register::Ds),
            0x33 => self.xor(),
            0x50 => self.push(Register::Ax),
            0x55 => self.push(Register::Bp),
            0x56 => self.push(Register::Si),
            0x5d => self.pop(Register::Bp),
            0x81 | 0x83 => self.arithmetic(opcode),
            0x8b => self.mov_from_operand(),
            0x8c => self.mov_from_segment(),
            0x8d => self.lea(),
            0x8e => self.mov_to_segment(),
            0xae => self.scasb(),
            0xb0..=0xb7 => {
                let register = Register::byte(opcode & 0b111);
                let value = self.cursor.read_byte()?;
                self.regs.set_byte(register, value);
                Ok(format!("mov {},0x{:02X}", register, value).into())
            }
            0xb8..=0xbf => {
                let register = Register::word(opcode & 0b111);
                let value = self.cursor.read_word()?;
                self.regs.set_word(register, value);
                Ok(format!("mov {},0x{:04X}", register, value).into())
            }
            0xc3 => self.ret(),
            0xcd => self.int(),
            0xe8 => self.call(),
            0xf7 => self.unary(),
            _ => Err(DecodeError::UnsupportedOpcode {
                opcode,
                offset: self.offset,
            }),
        }
    }

    fn push(&mut self, register: Register) -> Result<Executed, DecodeError> {
        let value = self.word(register);
        self.stack.push(value);
        Ok(format!("push {}", register).into())
    }

    fn pop(&mut self, register: Register) -> Result<Executed, DecodeError> {
        let value = self.pop_value()?;
        self.regs.write(register, value);
        Ok(format!("pop {}", register).into())
    }

    fn xor(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let dest = Register::word(resolution.reg);
        let value = self.concrete(dest)?;
        let source = self.read_operand(&resolution)?;
        let source = self.require(source)?;
        self.regs.set_word(dest, value ^ source);
        Ok(format!("xor {},{}", dest, resolution.operand).into())
    }

    fn arithmetic(&mut self, opcode: u8) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let op = ArithmeticOp::from_reg(resolution.reg);

        let (immediate, immediate_text) = if opcode == 0x81 {
            let imm = self.cursor.read_word()?;
            (imm, format!("0x{:X}", imm))
        } else {
            let imm = self.cursor.read_byte()? as i8;
            let text = if imm < 0 {
                format!("-0x{:X}", i16::from(imm).unsigned_abs())
            } else {
                format!("0x{:X}", imm)
            };
            (imm as i16 as u16, text)
        };

        // Other operations are only disassembled.
        if op == ArithmeticOp::Sub {
            // The sign-extended byte form patches a single byte of memory.
            if let (0x83, Operand::Memory(mem)) = (opcode, &resolution.operand) {
                let address = self.physical_address(mem)?;
                let byte = self.cursor.read_byte_at(address)?;
                self.cursor
                    .replace_byte(address, byte.wrapping_sub(immediate as u8))?;
                return Ok(format!("{} {},{}", op, resolution.operand, immediate_text).into());
            }

            let value = self.read_operand(&resolution)?;
            let value = self.require(value)?;
            self.write_operand(
                &resolution,
                RegisterValue::Concrete(value.wrapping_sub(immediate)),
            )?;
        }

        Ok(format!("{} {},{}", op, resolution.operand, immediate_text).into())
    }

    fn mov_from_operand(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let dest = Register::word(resolution.reg);
        let value = self.read_operand(&resolution)?;
        self.regs.write(dest, value);
        Ok(format!("mov {},{}", dest, resolution.operand).into())
    }

    fn mov_from_segment(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let segment = self.segment_register(0x8c, &resolution)?;
        let value = self.word(segment);
        self.write_operand(&resolution, value)?;
        Ok(format!("mov {},{}", resolution.operand, segment).into())
    }

    fn mov_to_segment(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let segment = self.segment_register(0x8e, &resolution)?;
        let value = self.read_operand(&resolution)?;
        self.regs.write(segment, value);
        Ok(format!("mov {},{}", segment, resolution.operand).into())
    }

    fn lea(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let dest = Register::word(resolution.reg);
        let value = match &resolution.operand {
            Operand::Register(rm) => self.word(Register::word(*rm)),
            Operand::Memory(mem) => RegisterValue::Concrete(mem.effective_address),
        };
        self.regs.write(dest, value);
        Ok(format!("lea {},{}", dest, resolution.operand).into())
    }

    fn scasb(&mut self) -> Result<Executed, DecodeError> {
        let es = self.concrete(Register::Es)?;
        let di = self.concrete(Register::Di)?;
        let al = match self.regs.read_byte(Register::Al) {
            Some(RegisterValue::Concrete(al)) => al,
            _ => {
                return Err(DecodeError::UnresolvedOperand {
                    register: Register::Al,
                    offset: self.offset,
                })
            }
        };

        let byte = self.cursor.read_byte_at(physical_offset(es, di))?;
        self.regs.set_flag(Flag::Zero, byte == al);
        let di = if self.regs.flag(Flag::Direction) {
            di.wrapping_sub(1)
        } else {
            di.wrapping_add(1)
        };
        self.regs.set_word(Register::Di, di);
        Ok("scasb".into())
    }

    fn ret(&mut self) -> Result<Executed, DecodeError> {
        let target = match self.pop_value()? {
            RegisterValue::Concrete(target) => target,
            RegisterValue::Symbolic(register) => {
                return Err(DecodeError::UnresolvedOperand {
                    register,
                    offset: self.offset,
                })
            }
        };

        Ok(Executed {
            jump: Some(usize::from(target)),
            ..Executed::from("ret")
        })
    }

    fn int(&mut self) -> Result<Executed, DecodeError> {
        let vector = self.cursor.read_byte()?;
        let interrupt = dos::interpret(
            vector,
            self.offset,
            &self.cursor,
            &self.regs,
            &mut self.diagnostics,
        )?;

        Ok(Executed {
            text: interrupt.text,
            annotation: interrupt.annotation,
            skip: interrupt.skip.map(|range| range.collect()).unwrap_or_default(),
            jump: None,
        })
    }

    fn call(&mut self) -> Result<Executed, DecodeError> {
        let displacement = self.cursor.read_word()? as i16;
        let ret = self.cursor.position();
        let ret_value = u16::try_from(ret).map_err(|_| OutOfBounds {
            offset: ret,
            len: 2,
        })?;

        let target = if displacement < 0 {
            ret.checked_sub(usize::from(displacement.unsigned_abs()))
        } else {
            ret.checked_add(displacement as usize)
        };
        let target = target.ok_or(OutOfBounds {
            offset: self.offset,
            len: ret - self.offset,
        })?;
        if target <= self.offset {
            return Err(DecodeError::BackwardCall {
                target,
                offset: self.offset,
            });
        }
        self.stack.push(RegisterValue::Concrete(ret_value));

        Ok(Executed {
            jump: Some(target),
            ..Executed::from(format!("call 0x{:04X}", target))
        })
    }

    fn unary(&mut self) -> Result<Executed, DecodeError> {
        let resolution = self.modrm()?;
        let op = UnaryOp::from_reg(resolution.reg).ok_or(DecodeError::UnsupportedOperand {
            opcode: 0xf7,
            modrm: resolution.modrm,
            offset: self.offset,
        })?;

        match op {
            UnaryOp::Test => {
                let immediate = self.cursor.read_word()?;
                let value = self.read_operand(&resolution)?;
                let value = self.require(value)?;
                self.regs.set_flag(Flag::Carry, false);
                self.regs.set_flag(Flag::Overflow, false);
                self.regs.set_flag(Flag::Zero, value == 0);
                self.regs.set_flag(Flag::Sign, (value >> 15) != 0);
                self.regs
                    .set_flag(Flag::Parity, test_parity((value & 0xff) as u8));
                Ok(format!("{} {},0x{:X}", op, resolution.operand, immediate).into())
            }
            UnaryOp::Not => {
                let value = self.read_operand(&resolution)?;
                let value = self.require(value)?;
                self.write_operand(&resolution, RegisterValue::Concrete(!value))?;
                Ok(format!("{} {}", op, resolution.operand).into())
            }
            // Only disassembled.
            _ => Ok(format!("{} {}", op, resolution.operand).into()),
        }
    }

    fn segment_register(
        &self,
        opcode: u8,
        resolution: &OperandResolution,
    ) -> Result<Register, DecodeError> {
        Register::segment(resolution.reg).ok_or(DecodeError::UnsupportedOperand {
            opcode,
            modrm: resolution.modrm,
            offset: self.offset,
        })
    }

    fn modrm(&mut self) -> Result<OperandResolution, DecodeError> {
        let regs = &self.regs;
        let diagnostics = &mut self.diagnostics;
        let offset = self.offset;
        OperandResolution::read(&mut self.cursor, offset, |r| {
            read_word(regs, diagnostics, r, offset)
        })
    }

    /// Reads the 16-bit operand designated by the `mod` and `rm` fields.
    ///
    /// A memory operand requires a known address. A register operand is returned as is.
    fn read_operand(&mut self, resolution: &OperandResolution) -> Result<RegisterValue, DecodeError> {
        match &resolution.operand {
            Operand::Register(rm) => Ok(self.word(Register::word(*rm))),
            Operand::Memory(mem) => {
                let address = self.physical_address(mem)?;
                Ok(RegisterValue::Concrete(self.cursor.read_word_at(address)?))
            }
        }
    }

    /// Writes the 16-bit operand designated by the `mod` and `rm` fields.
    ///
    /// Only concrete values can be written to memory.
    fn write_operand(
        &mut self,
        resolution: &OperandResolution,
        value: RegisterValue,
    ) -> Result<(), DecodeError> {
        match &resolution.operand {
            Operand::Register(rm) => {
                self.regs.write(Register::word(*rm), value);
                Ok(())
            }
            Operand::Memory(mem) => {
                let value = self.require(value)?;
                let address = self.physical_address(mem)?;
                self.cursor.replace_word(address, value)?;
                Ok(())
            }
        }
    }

    fn physical_address(&mut self, mem: &Memory) -> Result<usize, DecodeError> {
        let segment = self.concrete(mem.segment)?;
        Ok(physical_offset(segment, mem.effective_address))
    }

    fn pop_value(&mut self) -> Result<RegisterValue, DecodeError> {
        self.stack.pop().ok_or(DecodeError::EmptyStack {
            offset: self.offset,
        })
    }

    /// Reads a register. A degraded read is accepted and recorded.
    fn word(&mut self, register: Register) -> RegisterValue {
        read_word(&self.regs, &mut self.diagnostics, register, self.offset)
    }

    /// Reads a register whose value must be known.
    fn concrete(&mut self, register: Register) -> Result<u16, DecodeError> {
        match self.word(register) {
            RegisterValue::Concrete(value) => Ok(value),
            RegisterValue::Symbolic(_) => Err(DecodeError::UnresolvedOperand {
                register,
                offset: self.offset,
            }),
        }
    }

    fn require(&self, value: RegisterValue) -> Result<u16, DecodeError> {
        match value {
            RegisterValue::Concrete(value) => Ok(value),
            RegisterValue::Symbolic(register) => Err(DecodeError::UnresolvedOperand {
                register,
                offset: self.offset,
            }),
        }
    }
}

/// Reads a register on behalf of the instruction at `offset`.
///
/// If only one half of the register is known, the unknown half is replaced with zero and a
/// diagnostic is recorded.
pub(crate) fn read_word(
    regs: &RegisterFile,
    diagnostics: &mut Vec<Diagnostic>,
    register: Register,
    offset: usize,
) -> RegisterValue {
    match regs.read(register) {
        WordRead::Concrete(value) => RegisterValue::Concrete(value),
        WordRead::Symbolic(origin) => RegisterValue::Symbolic(origin),
        WordRead::Degraded { value, unknown } => {
            let diagnostic = Diagnostic::DegradedRead {
                register,
                unknown,
                offset,
            };
            log::warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
            RegisterValue::Concrete(value)
        }
    }
}

/// Value of the parity flag after `test`, given the low byte of the operand.
///
/// The flag is set when the number of digits of the binary representation of `low`, minus one
/// if that representation contains a `0`, is even. Zero is written `0`.
pub fn test_parity(low: u8) -> bool {
    let width = if low == 0 {
        1
    } else {
        8 - low.leading_zeros()
    };
    let has_zero = low == 0 || low.count_ones() < width;
    let len = width - u32::from(has_zero);
    len % 2 == 0
}
