//! Line program opcodes.
//!
//! Three classes share the opcode byte:
//!
//! | Byte | Class | Encoding |
//! |------|-------|----------|
//! | `0` | extended | ULEB128 length, sub-opcode, operands |
//! | `1..opcode_base` | standard | LEB128 operands (`fixed_advance_pc`: one `u16`) |
//! | `opcode_base..=255` | special | none, address and line advance packed in the byte |
//!
//! Standard opcodes this decoder does not know are skipped by reading as many
//! ULEB128 operands as the header declares for them. Unknown extended opcodes
//! are skipped by their length prefix. Both decode to explicit `Unknown*`
//! variants so callers can see what was passed over.

use crate::parser::cursor::Cursor;
use crate::parser::error::{LineError, Result};
use crate::parser::file::{read_file_entry, FileTable};
use crate::parser::header::LineProgramHeader;
use std::fmt;

// Standard opcodes (DWARF 2)
pub const DW_LNS_COPY: u8 = 0x01;
pub const DW_LNS_ADVANCE_PC: u8 = 0x02;
pub const DW_LNS_ADVANCE_LINE: u8 = 0x03;
pub const DW_LNS_SET_FILE: u8 = 0x04;
pub const DW_LNS_SET_COLUMN: u8 = 0x05;
pub const DW_LNS_NEGATE_STMT: u8 = 0x06;
pub const DW_LNS_SET_BASIC_BLOCK: u8 = 0x07;
pub const DW_LNS_CONST_ADD_PC: u8 = 0x08;
pub const DW_LNS_FIXED_ADVANCE_PC: u8 = 0x09;
// Standard opcodes (DWARF 3)
pub const DW_LNS_SET_PROLOGUE_END: u8 = 0x0A;
pub const DW_LNS_SET_EPILOGUE_BEGIN: u8 = 0x0B;
pub const DW_LNS_SET_ISA: u8 = 0x0C;

// Extended opcodes
pub const DW_LNE_END_SEQUENCE: u8 = 0x01;
pub const DW_LNE_SET_ADDRESS: u8 = 0x02;
pub const DW_LNE_DEFINE_FILE: u8 = 0x03;
/// DWARF 4
pub const DW_LNE_SET_DISCRIMINATOR: u8 = 0x04;

/// Argument count of a standard opcode with a fixed meaning.
///
/// `DW_LNS_fixed_advance_pc` takes a `u16` rather than a LEB128, so there is
/// no agreed value for the header to declare and it is left unchecked.
pub fn known_argument_count(opcode: u8) -> Option<u8> {
    match opcode {
        DW_LNS_COPY => Some(0),
        DW_LNS_ADVANCE_PC => Some(1),
        DW_LNS_ADVANCE_LINE => Some(1),
        DW_LNS_SET_FILE => Some(1),
        DW_LNS_SET_COLUMN => Some(1),
        DW_LNS_NEGATE_STMT => Some(0),
        DW_LNS_SET_BASIC_BLOCK => Some(0),
        DW_LNS_CONST_ADD_PC => Some(0),
        DW_LNS_SET_PROLOGUE_END => Some(0),
        DW_LNS_SET_EPILOGUE_BEGIN => Some(0),
        DW_LNS_SET_ISA => Some(1),
        _ => None,
    }
}

/// One decoded line program instruction with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineInstruction {
    /// Special opcode (the raw byte, `>= opcode_base`)
    Special(u8),

    Copy,
    AdvancePc(u64),
    AdvanceLine(i64),
    SetFile(u64),
    SetColumn(u64),
    NegateStatement,
    SetBasicBlock,
    ConstAddPc,
    FixedAddPc(u16),
    SetPrologueEnd,
    SetEpilogueBegin,
    SetIsa(u64),
    /// Standard opcode with no known meaning; `args` operands were skipped
    UnknownStandard { opcode: u8, args: u8 },

    EndSequence,
    SetAddress(u64),
    /// A file was appended to the table; holds its 1-based index
    DefineFile(u64),
    SetDiscriminator(u64),
    /// Extended opcode with no known meaning; `length` bytes were skipped
    UnknownExtended { opcode: u8, length: u64 },
}

impl LineInstruction {
    /// Decode the instruction at the cursor.
    ///
    /// `DW_LNE_define_file` appends to `files` as part of decoding.
    pub fn decode(
        cursor: &mut Cursor<'_>,
        header: &LineProgramHeader,
        files: &mut FileTable,
    ) -> Result<Self> {
        let opcode = cursor.u8()?;

        if opcode >= header.opcode_base {
            return Ok(LineInstruction::Special(opcode));
        }
        if opcode == 0 {
            return Self::decode_extended(cursor, header, files);
        }

        let instruction = match opcode {
            DW_LNS_COPY => LineInstruction::Copy,
            DW_LNS_ADVANCE_PC => LineInstruction::AdvancePc(cursor.uleb128()?),
            DW_LNS_ADVANCE_LINE => LineInstruction::AdvanceLine(cursor.sleb128()?),
            DW_LNS_SET_FILE => LineInstruction::SetFile(cursor.uleb128()?),
            DW_LNS_SET_COLUMN => LineInstruction::SetColumn(cursor.uleb128()?),
            DW_LNS_NEGATE_STMT => LineInstruction::NegateStatement,
            DW_LNS_SET_BASIC_BLOCK => LineInstruction::SetBasicBlock,
            DW_LNS_CONST_ADD_PC => LineInstruction::ConstAddPc,
            DW_LNS_FIXED_ADVANCE_PC => LineInstruction::FixedAddPc(cursor.u16()?),
            DW_LNS_SET_PROLOGUE_END => LineInstruction::SetPrologueEnd,
            DW_LNS_SET_EPILOGUE_BEGIN => LineInstruction::SetEpilogueBegin,
            DW_LNS_SET_ISA => LineInstruction::SetIsa(cursor.uleb128()?),
            _ => {
                let args = header.standard_opcode_length(opcode).unwrap_or(0);
                log::debug!(
                    "Skipping unknown standard opcode {} at 0x{:X} ({} args)",
                    opcode,
                    cursor.offset() - 1,
                    args
                );
                for _ in 0..args {
                    cursor.uleb128()?;
                }
                LineInstruction::UnknownStandard { opcode, args }
            }
        };
        Ok(instruction)
    }

    fn decode_extended(
        cursor: &mut Cursor<'_>,
        header: &LineProgramHeader,
        files: &mut FileTable,
    ) -> Result<Self> {
        let offset = cursor.offset() - 1;
        let length = cursor.uleb128()?;
        let start = cursor.offset();
        let opcode = cursor.u8()?;

        let instruction = match opcode {
            DW_LNE_END_SEQUENCE => LineInstruction::EndSequence,
            DW_LNE_SET_ADDRESS => LineInstruction::SetAddress(cursor.address()?),
            DW_LNE_DEFINE_FILE => {
                if !read_file_entry(cursor, &header.include_directories, files)? {
                    return Err(cursor.fail(LineError::MalformedDefineFile { offset }));
                }
                log::trace!(
                    "DW_LNE_define_file at 0x{:X}: file {} = {}",
                    offset,
                    files.len(),
                    files.get(files.len() as u64).map_or("", |f| f.path.as_str())
                );
                LineInstruction::DefineFile(files.len() as u64)
            }
            DW_LNE_SET_DISCRIMINATOR => LineInstruction::SetDiscriminator(cursor.uleb128()?),
            _ => {
                log::debug!(
                    "Skipping unknown extended opcode 0x{:02X} at 0x{:X} ({} bytes)",
                    opcode,
                    offset,
                    length
                );
                LineInstruction::UnknownExtended { opcode, length }
            }
        };

        // Skip whatever the sub-opcode did not consume, e.g. vendor trailing data
        let consumed = (cursor.offset() - start) as u64;
        if consumed > length {
            return Err(cursor.fail(LineError::ExtendedOpcodeOverrun {
                offset,
                opcode,
                length,
                consumed,
            }));
        }
        cursor.skip(length - consumed)?;

        Ok(instruction)
    }
}

impl fmt::Display for LineInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineInstruction::Special(opcode) => write!(f, "special opcode {}", opcode),
            LineInstruction::Copy => write!(f, "DW_LNS_copy"),
            LineInstruction::AdvancePc(n) => write!(f, "DW_LNS_advance_pc {}", n),
            LineInstruction::AdvanceLine(n) => write!(f, "DW_LNS_advance_line {}", n),
            LineInstruction::SetFile(n) => write!(f, "DW_LNS_set_file {}", n),
            LineInstruction::SetColumn(n) => write!(f, "DW_LNS_set_column {}", n),
            LineInstruction::NegateStatement => write!(f, "DW_LNS_negate_stmt"),
            LineInstruction::SetBasicBlock => write!(f, "DW_LNS_set_basic_block"),
            LineInstruction::ConstAddPc => write!(f, "DW_LNS_const_add_pc"),
            LineInstruction::FixedAddPc(n) => write!(f, "DW_LNS_fixed_advance_pc 0x{:X}", n),
            LineInstruction::SetPrologueEnd => write!(f, "DW_LNS_set_prologue_end"),
            LineInstruction::SetEpilogueBegin => write!(f, "DW_LNS_set_epilogue_begin"),
            LineInstruction::SetIsa(n) => write!(f, "DW_LNS_set_isa {}", n),
            LineInstruction::UnknownStandard { opcode, args } => {
                write!(f, "unknown standard opcode {} ({} args)", opcode, args)
            }
            LineInstruction::EndSequence => write!(f, "DW_LNE_end_sequence"),
            LineInstruction::SetAddress(addr) => write!(f, "DW_LNE_set_address 0x{:X}", addr),
            LineInstruction::DefineFile(index) => write!(f, "DW_LNE_define_file {}", index),
            LineInstruction::SetDiscriminator(n) => write!(f, "DW_LNE_set_discriminator {}", n),
            LineInstruction::UnknownExtended { opcode, length } => {
                write!(f, "unknown extended opcode 0x{:02X} ({} bytes)", opcode, length)
            }
        }
    }
}
