//! Line program header (prologue) decoder.
//!
//! # Layout (DWARF 2-4)
//!
//! ```text
//! +------------------------------------------------+
//! | unit_length          4 bytes, or 0xFFFFFFFF    |
//! |                      followed by 8 (DWARF64)   |
//! | version              2 bytes                   |
//! | header_length        4 or 8 bytes              |
//! | minimum_instruction_length   1 byte            |
//! | maximum_operations_per_instruction 1 byte (v4) |
//! | default_is_stmt      1 byte                    |
//! | line_base            1 byte, signed            |
//! | line_range           1 byte                    |
//! | opcode_base          1 byte                    |
//! | standard_opcode_lengths  opcode_base - 1 bytes |
//! | include_directories  strings, "" terminated    |
//! | file_names           entries, "" terminated    |
//! +------------------------------------------------+
//! | line number program (header_length bytes after |
//! | the header_length field)                       |
//! +------------------------------------------------+
//! ```
//!
//! Newer versions insert fields in the middle of this layout, so only the
//! versions listed in [`SUPPORTED_VERSIONS`] are accepted.

use super::cursor::Cursor;
use super::error::{LineError, Result};
use super::file::{is_absolute, join_path, read_file_entry, FileTable};
use crate::interpreter::opcode::known_argument_count;
use std::ops::RangeInclusive;

/// Line table versions this decoder understands.
pub const SUPPORTED_VERSIONS: RangeInclusive<u16> = 2..=4;

/// Initial length value announcing the 64-bit DWARF format.
pub const DWARF64_ESCAPE: u32 = 0xFFFF_FFFF;

/// Start of the reserved initial length range.
pub const RESERVED_LENGTH_START: u32 = 0xFFFF_FFF0;

/// 32-bit or 64-bit DWARF, chosen per unit by its initial length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwarfFormat {
    Dwarf32,
    Dwarf64,
}

impl DwarfFormat {
    /// Width of section offsets and lengths in this format.
    pub fn offset_size(self) -> u8 {
        match self {
            DwarfFormat::Dwarf32 => 4,
            DwarfFormat::Dwarf64 => 8,
        }
    }
}

/// Decoded line program header: the interpreter's fixed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProgramHeader {
    /// Section offset of the header
    pub offset: usize,
    pub format: DwarfFormat,
    pub version: u16,
    /// Size of the unit in bytes, excluding the initial length field
    pub unit_length: u64,
    pub header_length: u64,
    pub minimum_instruction_length: u8,
    /// 1 before version 4
    pub maximum_operations_per_instruction: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    /// First special opcode
    pub opcode_base: u8,
    /// Declared argument counts; entry `i` is for opcode `i + 1`
    pub standard_opcode_lengths: Vec<u8>,
    /// Include directories; entry 0 is the compilation directory
    pub include_directories: Vec<String>,
    /// Section offset of the first opcode
    pub program_offset: usize,
    /// Section offset one past the last opcode
    pub end_offset: usize,
    /// Number of files declared in the header
    pub initial_file_count: usize,
}

impl LineProgramHeader {
    /// Decode a header at the cursor and fill `files` with its file table.
    ///
    /// On success the cursor's readable range is limited to the unit.
    pub fn parse(
        cursor: &mut Cursor<'_>,
        comp_dir: &str,
        files: &mut FileTable,
        check_opcode_lengths: bool,
    ) -> Result<Self> {
        let offset = cursor.offset();

        let (format, unit_length) = match cursor.u32()? {
            DWARF64_ESCAPE => (DwarfFormat::Dwarf64, cursor.u64()?),
            value if value >= RESERVED_LENGTH_START => {
                return Err(cursor.fail(LineError::ReservedUnitLength { offset, value }));
            }
            value => (DwarfFormat::Dwarf32, u64::from(value)),
        };

        let end = (cursor.offset() as u64).saturating_add(unit_length);
        if end > cursor.section_len() as u64 {
            return Err(cursor.fail(LineError::UnitExceedsSection {
                offset,
                end,
                section_len: cursor.section_len(),
            }));
        }
        let end_offset = end as usize;
        cursor.set_end(end_offset);

        let version = cursor.u16()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(cursor.fail(LineError::UnsupportedVersion { offset, version }));
        }

        let header_length = match format {
            DwarfFormat::Dwarf32 => u64::from(cursor.u32()?),
            DwarfFormat::Dwarf64 => cursor.u64()?,
        };
        let program_offset = (cursor.offset() as u64).saturating_add(header_length);
        if program_offset > end {
            return Err(cursor.fail(LineError::HeaderExceedsUnit {
                offset,
                program_offset,
                end: end_offset,
            }));
        }

        let minimum_instruction_length = cursor.u8()?;
        let maximum_operations_per_instruction = if version >= 4 { cursor.u8()? } else { 1 };
        let default_is_stmt = cursor.u8()? != 0;
        let line_base = cursor.u8()? as i8;
        let line_range = cursor.u8()?;

        if maximum_operations_per_instruction == 0 {
            return Err(cursor.fail(LineError::InvalidMaxOpsPerInstruction { offset }));
        }
        if line_range == 0 {
            return Err(cursor.fail(LineError::InvalidLineRange { offset }));
        }

        let opcode_base = cursor.u8()?;
        if opcode_base == 0 {
            return Err(cursor.fail(LineError::InvalidOpcodeBase { offset }));
        }
        let mut standard_opcode_lengths = Vec::with_capacity(usize::from(opcode_base) - 1);
        for _ in 1..opcode_base {
            standard_opcode_lengths.push(cursor.u8()?);
        }

        if check_opcode_lengths {
            for (opcode, &declared) in (1u8..).zip(&standard_opcode_lengths) {
                match known_argument_count(opcode) {
                    Some(expected) if expected != declared => {
                        return Err(cursor.fail(LineError::OpcodeLengthMismatch {
                            offset,
                            opcode,
                            expected,
                            declared,
                        }));
                    }
                    _ => {}
                }
            }
        }

        let mut include_directories = vec![comp_dir.to_string()];
        loop {
            let directory = cursor.string()?;
            if directory.is_empty() {
                break;
            }
            let directory = if is_absolute(&directory) {
                directory
            } else {
                join_path(comp_dir, &directory)
            };
            include_directories.push(directory);
        }

        while read_file_entry(cursor, &include_directories, files)? {}
        let initial_file_count = files.len();

        log::debug!(
            "Line program at 0x{:X}: version {} {:?}, opcode_base {}, {} directories, {} files, program 0x{:X}..0x{:X}",
            offset,
            version,
            format,
            opcode_base,
            include_directories.len(),
            initial_file_count,
            program_offset,
            end_offset
        );

        Ok(Self {
            offset,
            format,
            version,
            unit_length,
            header_length,
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories,
            program_offset: program_offset as usize,
            end_offset,
            initial_file_count,
        })
    }

    /// Declared argument count of a standard opcode, if it is below `opcode_base`.
    pub fn standard_opcode_length(&self, opcode: u8) -> Option<u8> {
        let index = usize::from(opcode).checked_sub(1)?;
        self.standard_opcode_lengths.get(index).copied()
    }

    /// Operation advance encoded by special opcode 255, used by `DW_LNS_const_add_pc`.
    pub fn const_add_pc_advance(&self) -> u64 {
        u64::from(255 - self.opcode_base) / u64::from(self.line_range)
    }
}
