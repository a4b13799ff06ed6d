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

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dosstub_core::{decode, Seed};

fn bench(c: &mut Criterion) {
    // Stub emitted by most linkers of the Windows 3.x era.
    let stub = b"\x0e\x1f\xba\x0e\x00\xb4\x09\xcd\x21\xb8\x01\x4c\xcd\x21\
This program cannot be run in DOS mode.\r\r\n$\x00\x00\x00\x00\x00\x00\x00";

    c.bench_function("decode-dos-stub", |b| {
        b.iter(|| decode(black_box(stub.to_vec()), Seed::default()).unwrap())
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
