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

use dosstub_core::{mz::MzHeader, ne::NeHeader, DecodeError, Executable, Extension, Trace};
use std::{path::PathBuf, process};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "dosstub", about = "Prints the headers and the decoded DOS stub of executables.")]
struct CliOptions {
    /// Fail if the DOS stub can't be entirely decoded.
    #[structopt(long)]
    strict: bool,

    /// Executables to inspect.
    #[structopt(parse(from_os_str), required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli_opts = CliOptions::from_args();

    let mut failed = false;
    for file in &cli_opts.files {
        println!("Info of {}", file.display());
        match Executable::open(file) {
            Ok(exe) => {
                if !print_executable(&exe, cli_opts.strict) {
                    failed = true;
                }
            }
            Err(err) => {
                eprintln!("{}: {}", file.display(), err);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Prints everything known about `exe`. Returns `false` if the stub is considered a failure.
fn print_executable(exe: &Executable, strict: bool) -> bool {
    print_mz(&exe.mz);

    println!("MZ Header code:");
    let success = match &exe.stub {
        Ok(trace) => print_trace(trace, strict),
        Err(err) => {
            print_stub_error(err);
            !strict
        }
    };
    println!();

    match &exe.extension {
        Some(Extension::Ne(ne)) => print_ne(ne),
        Some(Extension::Pe(_)) => {
            println!("Windows Executable Signature: Portable Executable");
            println!();
        }
        None => {}
    }

    for diagnostic in &exe.diagnostics {
        println!("Warning: {}", diagnostic);
    }

    success
}

fn print_mz(mz: &MzHeader) {
    println!("MZ Info:");
    println!("  {} bytes in the last page", mz.last_page_bytes);
    println!(
        "  {} whole/partial pages (total of {} bytes)",
        mz.pages,
        mz.file_bytes()
    );
    println!("  {} entries in the relocation table", mz.relocation_count);
    println!(
        "  Header size: {} paragraphs ({} bytes)",
        mz.header_paragraphs,
        mz.header_bytes()
    );
    println!(
        "  Minimum allocation: {} paragraphs ({} bytes) required",
        mz.min_allocation,
        u32::from(mz.min_allocation) * 16
    );
    println!(
        "  Maximum allocation: {} paragraphs ({} bytes) requested",
        mz.max_allocation,
        u32::from(mz.max_allocation) * 16
    );
    println!("  Initial SS value: {}", mz.initial_ss);
    println!("  Initial SP value: {}", mz.initial_sp);
    println!("  Checksum: {}", mz.checksum);
    println!("  Initial IP value: {}", mz.initial_ip);
    println!("  Initial CS value: {}", mz.initial_cs);
    println!(
        "  Relocation table offset: 0x{:X}{}",
        mz.relocation_table_offset,
        if mz.relocation_count == 0 {
            " (ignored due to 0 entries)"
        } else {
            ""
        }
    );
    println!("  Overlay value: {}", mz.overlay);
    println!();

    println!("  Windows Executable Extension:");
    println!("    OEM Identifier: 0x{:X}", mz.oem_id);
    println!("    OEM Info: 0x{:X}", mz.oem_info);
    println!("    New header start: 0x{:X}", mz.new_header_start);
    println!();
}

fn print_trace(trace: &Trace, strict: bool) -> bool {
    for line in trace.lines() {
        println!("{}", line);
    }

    match trace.halt {
        Some(halt) => {
            println!(
                "; unsupported opcode 0x{:02X} at offset 0x{:X}",
                halt.opcode, halt.offset
            );
            !strict
        }
        None => true,
    }
}

fn print_stub_error(err: &DecodeError) {
    println!("; {}", err);
}

fn print_ne(ne: &NeHeader) {
    println!("Windows Executable Signature: New Executable");
    println!(
        "  Linker Version: {}.{}",
        ne.linker_version.0, ne.linker_version.1
    );
    println!("  Entry Table Offset: 0x{:X}", ne.entry_table_offset);
    println!("  Entry Table Length: {}", ne.entry_table_length);
    println!("  CRC: {}", ne.crc);
    println!("  Flag Word: 0x{:X}", ne.flags);
    println!("  Automatic Data Segment Number: {}", ne.auto_data_segment);
    println!("  Initial Local Heap Size: {}", ne.initial_heap);
    println!("  Initial Stack Size: {}", ne.initial_stack);
    println!("  CS value: 0x{:X}", ne.cs);
    println!("  IP value: 0x{:X}", ne.ip);
    println!("  SS value: 0x{:X}", ne.ss);
    println!("  SP value: 0x{:X}", ne.sp);
    println!("  Entry Count in Segment Table: {}", ne.segment_count);
    println!(
        "  Entry count in Module Reference Table: {}",
        ne.module_reference_count
    );
    println!(
        "  Non-Resident Names Table Size: {}",
        ne.non_resident_names_size
    );
    println!("  Segment Table Offset: 0x{:X}", ne.segment_table_offset);
    println!("  Resource Table Offset: 0x{:X}", ne.resource_table_offset);
    println!(
        "  Resident Names Table Offset: 0x{:X}",
        ne.resident_names_offset
    );
    println!(
        "  Module Reference Table Offset: 0x{:X}",
        ne.module_reference_offset
    );
    println!(
        "  Imported Names Table Offset: 0x{:X}",
        ne.imported_names_offset
    );
    println!(
        "  Non Resident Names Table Offset: 0x{:X}",
        ne.non_resident_names_offset
    );
    println!("  Moveable Entry Points: {}", ne.movable_entry_points);
    println!("  Shift Count: {}", ne.shift_count);
    println!("  Resource Segment Count: {}", ne.resource_segment_count);
    println!("  Target Operating System: {}", ne.target_os);
    println!("  Additional Information: 0x{:X}", ne.additional_info);
    println!("  Fast-Load Offset: 0x{:X}", ne.fast_load_offset);
    println!("  Fast-Load Length: {}", ne.fast_load_length);
    println!(
        "  Expected Version: Windows {}.{}",
        ne.expected_windows_version.0, ne.expected_windows_version.1
    );

    for (index, segment) in ne.segments.iter().enumerate() {
        println!(
            "  Segment {}: offset 0x{:X}, length {}, flags 0x{:X}, minimum allocation {}",
            index + 1,
            u32::from(segment.data_offset) << ne.shift_count.min(16),
            segment.length,
            segment.flags,
            segment.min_allocation
        );
    }

    for type_info in &ne.resources.types {
        let name = match type_info.resource_type() {
            Some(ty) => ty.to_string(),
            None => format!("named 0x{:X}", type_info.type_id),
        };
        println!(
            "  Resources of type {}: {}",
            name,
            type_info.resources.len()
        );
    }

    for string in &ne.resources.strings {
        println!("  Resource string: {:?}", string);
    }

    println!();
}
