//! Line program decode errors.
//!
//! Every failure is fatal to the line table it was raised for. The cursor
//! remembers the first one and hands out clones of it from then on, so a
//! caller that keeps driving a broken reader always sees the original cause.

use thiserror::Error;

/// Line program decode error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    /// A read ran past the end of the unit.
    #[error("Unexpected end of line program at 0x{offset:X}: need {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A LEB128 value does not fit in 64 bits.
    #[error("LEB128 value at 0x{offset:X} overflows 64 bits")]
    Leb128Overflow { offset: usize },

    /// The compile unit declares an address size we cannot read.
    #[error("Unsupported address size {0} (expected 1, 2, 4 or 8)")]
    UnsupportedAddressSize(u8),

    /// The initial length field holds a reserved value.
    #[error("Reserved unit length 0x{value:08X} at 0x{offset:X}")]
    ReservedUnitLength { offset: usize, value: u32 },

    /// The unit length runs past the end of the section.
    #[error("Line table at 0x{offset:X} ends at 0x{end:X}, beyond section size 0x{section_len:X}")]
    UnitExceedsSection {
        offset: usize,
        end: u64,
        section_len: usize,
    },

    /// The header length puts the program start past the unit end.
    #[error("Line program at 0x{offset:X} starts at 0x{program_offset:X}, beyond unit end 0x{end:X}")]
    HeaderExceedsUnit {
        offset: usize,
        program_offset: u64,
        end: usize,
    },

    /// Line table version outside the supported set.
    #[error("Unsupported line table version {version} at 0x{offset:X}")]
    UnsupportedVersion { offset: usize, version: u16 },

    /// `line_range` of zero would divide by zero in special opcodes.
    #[error("Invalid line range 0 in header at 0x{offset:X}")]
    InvalidLineRange { offset: usize },

    /// `maximum_operations_per_instruction` of zero.
    #[error("Invalid maximum operations per instruction 0 in header at 0x{offset:X}")]
    InvalidMaxOpsPerInstruction { offset: usize },

    /// `opcode_base` of zero leaves no room for extended opcodes.
    #[error("Invalid opcode base 0 in header at 0x{offset:X}")]
    InvalidOpcodeBase { offset: usize },

    /// A standard opcode with a fixed meaning declares the wrong argument count.
    #[error("Opcode {opcode} expected to have {expected} arguments, header declares {declared}")]
    OpcodeLengthMismatch {
        offset: usize,
        opcode: u8,
        expected: u8,
        declared: u8,
    },

    /// A file entry names a directory that is not in the table.
    #[error("Directory index {index} at 0x{offset:X} out of range ({count} directories)")]
    DirectoryIndexOutOfRange {
        offset: usize,
        index: u64,
        count: usize,
    },

    /// `DW_LNE_define_file` with an empty file name.
    #[error("Malformed DW_LNE_define_file at 0x{offset:X}")]
    MalformedDefineFile { offset: usize },

    /// An extended opcode read more operand bytes than it declared.
    #[error("Extended opcode 0x{opcode:02X} at 0x{offset:X} declares {length} bytes but uses {consumed}")]
    ExtendedOpcodeOverrun {
        offset: usize,
        opcode: u8,
        length: u64,
        consumed: u64,
    },

    /// The file table grew past the configured limit.
    #[error("File table at 0x{offset:X} exceeds the limit of {limit} entries")]
    FileTableFull { offset: usize, limit: usize },
}

/// Result type for line program decoding.
pub type Result<T> = std::result::Result<T, LineError>;
