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

#![cfg(test)]

use super::{decode, test_parity, Decoder, Halt};
use crate::{
    error::{DecodeError, Diagnostic},
    registers::{Flag, Register, RegisterFile, RegisterValue, Seed, WordRead},
};
use proptest::prelude::*;

const DOS_STUB: &[u8] = b"\x0e\x1f\xba\x0e\x00\xb4\x09\xcd\x21\xb8\x01\x4c\xcd\x21\
This program cannot be run in DOS mode.\r\r\n$\x00\x00\x00\x00\x00\x00\x00";

fn symbolic_decoder(code: &[u8]) -> Decoder {
    Decoder::with_registers(code.to_vec(), RegisterFile::new())
}

#[test]
fn dos_stub() {
    let trace = decode(DOS_STUB.to_vec(), Seed::default()).unwrap();
    let lines = trace.lines();
    assert_eq!(
        &lines[..9],
        &[
            "push cs",
            "pop ds",
            "mov dx,0x000E",
            "mov ah,0x09",
            "int 21h",
            "; printf(\"This program cannot be run in DOS mode.\\r\\r\\n\");",
            "mov ax,0x4C01",
            "int 21h",
            "; exit(1);",
        ]
    );
    assert!(lines[9..].iter().all(|l| l == "nop"));
    assert_eq!(lines.len(), 9 + 7);
    assert_eq!(trace.halt, None);
    assert!(trace.diagnostics.is_empty());
}

#[test]
fn mov_immediates_then_half_overwrite() {
    let mut decoder = Decoder::new(vec![0xb8, 0x34, 0x12, 0xb4, 0x09], Seed::default());
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines(), vec!["mov ax,0x1234", "mov ah,0x09"]);
    // The low half still comes from the first load.
    assert_eq!(decoder.registers().read(Register::Ax), WordRead::Concrete(0x0934));
}

#[test]
fn half_loaded_pair_is_degraded() {
    let mut decoder = Decoder::new(vec![0xb4, 0x09, 0x50], Seed::default());
    assert_eq!(
        decoder.registers().read(Register::Ax),
        WordRead::Symbolic(Register::Ax)
    );
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines(), vec!["mov ah,0x09", "push ax"]);
    assert_eq!(
        trace.diagnostics,
        vec![Diagnostic::DegradedRead {
            register: Register::Ax,
            unknown: Register::Al,
            offset: 2,
        }]
    );
    assert_eq!(
        decoder.stack().iter().copied().collect::<Vec<_>>(),
        vec![RegisterValue::Concrete(0x0900)]
    );
}

#[test]
fn symbolic_push_then_pop() {
    let mut decoder = symbolic_decoder(&[0x0e, 0x1f, 0x56, 0x5d]);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines(), vec!["push cs", "pop ds", "push si", "pop bp"]);
    let regs = decoder.into_registers();
    assert_eq!(regs.read(Register::Ds), WordRead::Symbolic(Register::Cs));
    assert_eq!(regs.read(Register::Bp), WordRead::Symbolic(Register::Si));
}

#[test]
fn pop_empty_stack() {
    let err = decode(vec![0x00, 0x5d], Seed::default()).unwrap_err();
    assert_eq!(err, DecodeError::EmptyStack { offset: 1 });
}

#[test]
fn registers_do_not_leak_between_passes() {
    decode(vec![0xb8, 0x00, 0x00], Seed::default()).unwrap();
    let mut decoder = Decoder::new(vec![0x50], Seed::default());
    decoder.run().unwrap();
    assert_eq!(
        decoder.stack().iter().copied().collect::<Vec<_>>(),
        vec![RegisterValue::Symbolic(Register::Ax)]
    );
}

#[test]
fn sub_sign_extended_byte() {
    // mov bx,0x10 ; sub bx,0x1 ; sub bx,-0x1
    let mut decoder = symbolic_decoder(&[0xbb, 0x10, 0x00, 0x83, 0xeb, 0x01, 0x83, 0xeb, 0xff]);
    let trace = decoder.step().unwrap().unwrap();
    assert_eq!(trace.text, "mov bx,0x0010");

    let sub = decoder.step().unwrap().unwrap();
    assert_eq!(sub.text, "sub bx,0x1");
    assert_eq!(decoder.registers().read(Register::Bx), WordRead::Concrete(0x0f));

    let sub = decoder.step().unwrap().unwrap();
    assert_eq!(sub.text, "sub bx,-0x1");
    assert_eq!(decoder.registers().read(Register::Bx), WordRead::Concrete(0x10));
}

#[test]
fn other_arithmetic_is_text_only() {
    // mov bx,0x0010 ; add [bx],0x1234 ; cmp cx,0x5
    let code = [0xbb, 0x10, 0x00, 0x81, 0x07, 0x34, 0x12, 0x83, 0xf9, 0x05];
    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(
        trace.lines(),
        vec!["mov bx,0x0010", "add [bx],0x1234", "cmp cx,0x5"]
    );
    assert_eq!(
        decoder.registers().read(Register::Cx),
        WordRead::Symbolic(Register::Cx)
    );
    assert_eq!(decoder.cursor().as_bytes(), &code[..]);
}

#[test]
fn symbolic_base_is_fatal() {
    // mov ax,[bx] ; add [bx],0x1234 ; mul [si] ; lea ax,[bp+di]
    let cases: &[(&[u8], Register)] = &[
        (&[0x8b, 0x07], Register::Bx),
        (&[0x81, 0x07, 0x34, 0x12], Register::Bx),
        (&[0xf7, 0x24], Register::Si),
        (&[0x8d, 0x03], Register::Bp),
    ];

    for (code, register) in cases {
        let err = symbolic_decoder(code).run().unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnresolvedOperand {
                register: *register,
                offset: 0
            }
        );
    }
}

#[test]
fn xor_requires_known_destination() {
    let err = symbolic_decoder(&[0x33, 0xc0]).run().unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnresolvedOperand {
            register: Register::Ax,
            offset: 0
        }
    );

    // mov ax,0x00FF ; mov cx,0x0F0F ; xor ax,cx
    let mut decoder = symbolic_decoder(&[0xb8, 0xff, 0x00, 0xb9, 0x0f, 0x0f, 0x33, 0xc1]);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[2], "xor ax,cx");
    assert_eq!(decoder.registers().read(Register::Ax), WordRead::Concrete(0x0ff0));
}

#[test]
fn memory_operands_use_physical_offsets() {
    let mut code = vec![
        0xb8, 0x01, 0x00, // mov ax,0x0001
        0x8e, 0xd8, // mov ds,ax
        0x8b, 0x1e, 0x08, 0x00, // mov bx,[0x8]
        0x8d, 0x47, 0x02, // lea ax,[bx+0x2]
        0x8c, 0x1e, 0x0a, 0x00, // mov [0xA],ds
    ];
    code.resize(0x20, 0x00);
    code[0x18] = 0x34;
    code[0x19] = 0x12;

    let mut decoder = symbolic_decoder(&code);
    for _ in 0..5 {
        decoder.step().unwrap();
    }
    assert_eq!(decoder.registers().read(Register::Bx), WordRead::Concrete(0x1234));
    assert_eq!(decoder.registers().read(Register::Ax), WordRead::Concrete(0x1236));
    assert_eq!(decoder.cursor().read_word_at(0x1a).unwrap(), 0x0001);
}

#[test]
fn not_patches_code() {
    let mut code = vec![
        0xb8, 0x01, 0x00, // mov ax,0x0001
        0x8e, 0xd8, // mov ds,ax
        0xf7, 0x16, 0x04, 0x00, // not [0x4]
    ];
    code.resize(0x16, 0x00);

    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[2], "not [0x4]");
    assert_eq!(&decoder.cursor().as_bytes()[0x14..], &[0xff, 0xff]);
    // The patched bytes are decoded.
    assert_eq!(
        trace.halt,
        Some(Halt {
            opcode: 0xff,
            offset: 0x14
        })
    );
}

#[test]
fn sub_sign_extended_byte_patches_one_byte() {
    let mut code = vec![
        0xb8, 0x00, 0x00, // mov ax,0x0000
        0x8e, 0xd8, // mov ds,ax
        0x83, 0x2e, 0x10, 0x00, 0x01, // sub [0x10],0x1
    ];
    code.resize(0x12, 0x00);
    code[0x11] = 0x05;

    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[2], "sub [0x10],0x1");
    assert_eq!(&decoder.cursor().as_bytes()[0x10..], &[0xff, 0x05]);

    // The word form still patches both bytes.
    code[5] = 0x81;
    code[9] = 0x01;
    code.insert(10, 0x00);
    code.truncate(0x12);
    code[0x11] = 0x05;
    let mut decoder = symbolic_decoder(&code);
    decoder.run().unwrap();
    assert_eq!(&decoder.cursor().as_bytes()[0x10..], &[0xff, 0x04]);
}

#[test]
fn repne_scasb_exhausts_count() {
    let mut code = vec![
        0xb8, 0x00, 0x00, // mov ax,0x0000
        0x8e, 0xc0, // mov es,ax
        0xb9, 0x03, 0x00, // mov cx,0x0003
        0xb0, 0xaa, // mov al,0xAA
        0xbf, 0x10, 0x00, // mov di,0x0010
        0xf2, 0xae, // repne scasb
    ];
    code.resize(0x13, 0x00);

    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[5], "repne scasb");
    assert_eq!(trace.instructions[5].len, 2);
    assert_eq!(trace.lines().len(), 6 + 4);

    let regs = decoder.registers();
    assert_eq!(regs.read(Register::Cx), WordRead::Concrete(0));
    assert_eq!(regs.read(Register::Di), WordRead::Concrete(0x13));
    assert!(!regs.flag(Flag::Zero));
    assert_eq!(decoder.rep(), None);
}

#[test]
fn repne_scasb_stops_on_match() {
    let mut code = vec![
        0xb8, 0x00, 0x00, // mov ax,0x0000
        0x8e, 0xc0, // mov es,ax
        0xb9, 0x03, 0x00, // mov cx,0x0003
        0xb0, 0xaa, // mov al,0xAA
        0xbf, 0x10, 0x00, // mov di,0x0010
        0xf2, 0xae, // repne scasb
    ];
    code.resize(0x13, 0x00);
    code[0x11] = 0xaa;

    let mut decoder = symbolic_decoder(&code);
    while decoder.cursor().position() < 15 {
        decoder.step().unwrap();
    }

    let regs = decoder.registers();
    assert!(regs.flag(Flag::Zero));
    assert_eq!(regs.read(Register::Cx), WordRead::Concrete(1));
    assert_eq!(regs.read(Register::Di), WordRead::Concrete(0x12));
    assert_eq!(decoder.rep(), None);
}

#[test]
fn rep_runs_once() {
    let code = vec![
        0xb8, 0x00, 0x00, // mov ax,0x0000
        0x8e, 0xc0, // mov es,ax
        0xbf, 0x00, 0x00, // mov di,0x0000
        0xf3, 0xae, // rep scasb
    ];

    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[3], "rep scasb");
    assert_eq!(trace.diagnostics, vec![Diagnostic::RepNotModelled { offset: 8 }]);
    assert_eq!(decoder.registers().read(Register::Di), WordRead::Concrete(1));
    assert_eq!(decoder.rep(), None);
}

#[test]
fn call_and_ret() {
    // call 0x0004 ; nop ; ret
    let mut decoder = symbolic_decoder(&[0xe8, 0x01, 0x00, 0x00, 0xc3]);

    let call = decoder.step().unwrap().unwrap();
    assert_eq!(call.text, "call 0x0004");
    assert_eq!(call.len, 3);
    assert_eq!(decoder.cursor().position(), 4);

    let ret = decoder.step().unwrap().unwrap();
    assert_eq!(ret.text, "ret");
    assert_eq!(decoder.cursor().position(), 3);

    assert_eq!(decoder.step().unwrap().unwrap().text, "nop");
    assert_eq!(
        decoder.step().unwrap_err(),
        DecodeError::EmptyStack { offset: 4 }
    );
}

#[test]
fn call_to_itself() {
    let mut decoder = symbolic_decoder(&[0xe8, 0xfd, 0xff]);
    assert_eq!(
        decoder.run().unwrap_err(),
        DecodeError::BackwardCall {
            target: 0,
            offset: 0
        }
    );
    assert!(decoder.stack().is_empty());
}

#[test]
fn ret_loop_hits_step_limit() {
    // mov ax,0x0000 ; push ax ; ret
    let mut decoder = symbolic_decoder(&[0xb8, 0x00, 0x00, 0x50, 0xc3]);
    decoder.set_step_limit(30);
    assert_eq!(
        decoder.run().unwrap_err(),
        DecodeError::StepLimit {
            limit: 30,
            offset: 0
        }
    );
    assert!(decoder.stack().is_empty());
}

#[test]
fn backward_call_before_start() {
    let err = symbolic_decoder(&[0xe8, 0xf0, 0xff]).run().unwrap_err();
    assert!(matches!(err, DecodeError::OutOfBounds(_)));
}

#[test]
fn ret_to_symbolic_address() {
    let err = symbolic_decoder(&[0x0e, 0xc3]).run().unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnresolvedOperand {
            register: Register::Cs,
            offset: 1
        }
    );
}

#[test]
fn unsupported_opcode_halts() {
    let trace = decode(vec![0xb0, 0x01, 0x90, 0x00], Seed::default()).unwrap();
    assert_eq!(trace.lines(), vec!["mov al,0x01"]);
    assert_eq!(
        trace.halt,
        Some(Halt {
            opcode: 0x90,
            offset: 2
        })
    );
    assert_eq!(
        trace.into_strict().unwrap_err(),
        DecodeError::UnsupportedOpcode {
            opcode: 0x90,
            offset: 2
        }
    );
}

#[test]
fn unsupported_operands() {
    let err = symbolic_decoder(&[0xf7, 0xc8]).run().unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnsupportedOperand {
            opcode: 0xf7,
            modrm: 0xc8,
            offset: 0
        }
    );

    let err = symbolic_decoder(&[0x00, 0x8e, 0xe0]).run().unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnsupportedOperand {
            opcode: 0x8e,
            modrm: 0xe0,
            offset: 1
        }
    );
}

#[test]
fn test_sets_flags() {
    // mov bx,0x8000 ; test bx,0xFFFF
    let mut decoder = symbolic_decoder(&[0xbb, 0x00, 0x80, 0xf7, 0xc3, 0xff, 0xff]);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.lines()[1], "test bx,0xFFFF");

    let regs = decoder.registers();
    assert!(regs.flag(Flag::Sign));
    assert!(!regs.flag(Flag::Zero));
    assert!(!regs.flag(Flag::Carry));
    assert!(!regs.flag(Flag::Overflow));
    assert!(regs.flag(Flag::Parity));
    assert_eq!(regs.read(Register::Bx), WordRead::Concrete(0x8000));
}

#[test]
fn test_parity_pinned() {
    let cases = [
        (0x00, true),
        (0x01, false),
        (0x02, false),
        (0x03, true),
        (0x04, true),
        (0x05, true),
        (0x10, true),
        (0x80, false),
        (0xff, true),
    ];
    for (low, parity) in cases.iter().copied() {
        assert_eq!(test_parity(low), parity, "0x{:x}", low);
    }
}

#[test]
fn skipped_bytes_are_not_decoded() {
    let mut code = vec![
        0xba, 0x0a, 0x00, // mov dx,0x000A
        0xb4, 0x09, // mov ah,0x09
        0xcd, 0x21, // int 21h
        0xeb, 0xeb, 0xeb, // unsupported
    ];
    code.extend_from_slice(b"\x90\x90$");

    let mut decoder = symbolic_decoder(&code);
    let trace = decoder.run().unwrap();
    assert_eq!(trace.instructions[2].skip, vec![0x0a, 0x0b, 0x0c]);
    assert_eq!(
        trace.halt,
        Some(Halt {
            opcode: 0xeb,
            offset: 7
        })
    );

    // Jump over the unsupported bytes.
    let mut code = code;
    code[7] = 0xe8;
    code[8] = 0x00;
    code[9] = 0x00;
    let trace = symbolic_decoder(&code).run().unwrap();
    assert_eq!(trace.halt, None);
    assert_eq!(trace.lines().last().map(|s| s.as_str()), Some("call 0x000A"));
}

#[test]
fn lengths_match_reference_decoder() {
    let code: Vec<u8> = vec![
        0xb8, 0x00, 0x00, // mov ax,0x0000
        0x8e, 0xd8, // mov ds,ax
        0x8e, 0xc0, // mov es,ax
        0xbb, 0x20, 0x00, // mov bx,0x0020
        0xbe, 0x02, 0x00, // mov si,0x0002
        0xbd, 0x00, 0x00, // mov bp,0x0000
        0x8b, 0x00, // mov ax,[bx+si]
        0x8b, 0x46, 0x04, // mov ax,[bp+0x4]
        0x8d, 0x40, 0x01, // lea ax,[bx+si+0x1]
        0x8d, 0x80, 0x00, 0x01, // lea ax,[bx+si+0x100]
        0x8c, 0xd8, // mov ax,ds
        0x33, 0xc0, // xor ax,ax
        0x81, 0xeb, 0x01, 0x00, // sub bx,0x1
        0x83, 0xc3, 0x02, // add bx,0x2
        0xf7, 0xc3, 0x01, 0x00, // test bx,0x1
        0xf7, 0xd0, // not ax
        0xf7, 0x26, 0x00, 0x00, // mul [0x0]
        0x56, 0x5d, // push si ; pop bp
        0x0e, 0x1f, // push cs ; pop ds
        0xb1, 0x07, // mov cl,0x07
        0xcd, 0x10, // int 10h
    ];

    let trace = decode(code.clone(), Seed::default()).unwrap();
    assert_eq!(trace.halt, None);
    assert_eq!(trace.instructions.len(), 23);

    for code in &[code, DOS_STUB.to_vec()] {
        let trace = decode(code.clone(), Seed::default()).unwrap();
        // 0x00 is consumed alone here, while it is `add r/m8,r8` for the reference decoder.
        for instruction in trace.instructions.iter().filter(|i| i.text != "nop") {
            let reference = iced_x86::Decoder::new(
                16,
                &code[instruction.offset..],
                iced_x86::DecoderOptions::NONE,
            )
            .decode();
            assert_eq!(instruction.len, reference.len(), "{}", instruction.text);
        }
    }
}

proptest! {
    #[test]
    fn mov_immediate_word(index in 0u8..8, value: u16) {
        let [low, high] = value.to_le_bytes();
        let mut decoder = symbolic_decoder(&[0xb8 + index, low, high]);
        let trace = decoder.run().unwrap();
        prop_assert_eq!(trace.instructions[0].len, 3);
        prop_assert_eq!(
            decoder.registers().read(Register::word(index)),
            WordRead::Concrete(value)
        );
    }

    #[test]
    fn mov_immediate_byte(index in 0u8..8, value: u8) {
        let mut decoder = symbolic_decoder(&[0xb0 + index, value]);
        let trace = decoder.run().unwrap();
        prop_assert_eq!(&trace.lines()[0], &format!("mov {},0x{:02X}", Register::byte(index), value));
        prop_assert_eq!(
            decoder.registers().read_byte(Register::byte(index)),
            Some(RegisterValue::Concrete(value))
        );
    }
}
