//! Line program assembler for tests.
//!
//! Builds a complete line program unit (header and opcode stream) so tests
//! can state their input as opcodes instead of hand-counted bytes.
//!
//! ```ignore
//! let section = ProgramBuilder::new()
//!     .file("main.c", 0)
//!     .set_address(0x1000)
//!     .advance_line(4)
//!     .copy()
//!     .end_sequence()
//!     .build();
//! ```

use crate::interpreter::opcode::*;
use crate::parser::cursor::Endian;
use crate::parser::header::{DwarfFormat, DWARF64_ESCAPE};
use crate::parser::unit::CompileUnit;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

/// Declared argument counts for opcodes 1-12.
const STANDARD_OPCODE_LENGTHS: [u8; 12] = [0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1];

/// Compilation directory used by [`ProgramBuilder::unit`].
pub const COMP_DIR: &str = "/work";

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assembler for a single line program unit.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    format: DwarfFormat,
    endian: Endian,
    address_size: u8,
    version: u16,
    min_inst_length: u8,
    max_ops: u8,
    default_is_stmt: bool,
    line_base: i8,
    line_range: u8,
    opcode_base: u8,
    opcode_lengths: Option<Vec<u8>>,
    directories: Vec<String>,
    files: Vec<(String, u64)>,
    program: Vec<u8>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// A DWARF 4, 32-bit, little-endian unit with typical GCC parameters.
    pub fn new() -> Self {
        init_logging();
        Self {
            format: DwarfFormat::Dwarf32,
            endian: Endian::Little,
            address_size: 8,
            version: 4,
            min_inst_length: 1,
            max_ops: 1,
            default_is_stmt: true,
            line_base: -5,
            line_range: 14,
            opcode_base: 13,
            opcode_lengths: None,
            directories: Vec::new(),
            files: Vec::new(),
            program: Vec::new(),
        }
    }

    // Header parameters

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn dwarf64(mut self) -> Self {
        self.format = DwarfFormat::Dwarf64;
        self
    }

    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn address_size(mut self, address_size: u8) -> Self {
        self.address_size = address_size;
        self
    }

    pub fn min_inst_length(mut self, length: u8) -> Self {
        self.min_inst_length = length;
        self
    }

    pub fn max_ops(mut self, max_ops: u8) -> Self {
        self.max_ops = max_ops;
        self
    }

    pub fn default_is_stmt(mut self, is_stmt: bool) -> Self {
        self.default_is_stmt = is_stmt;
        self
    }

    pub fn line_params(mut self, line_base: i8, line_range: u8, opcode_base: u8) -> Self {
        self.line_base = line_base;
        self.line_range = line_range;
        self.opcode_base = opcode_base;
        self
    }

    /// Declare these argument counts instead of the standard ones.
    pub fn opcode_lengths(mut self, lengths: Vec<u8>) -> Self {
        self.opcode_lengths = Some(lengths);
        self
    }

    pub fn directory(mut self, directory: &str) -> Self {
        self.directories.push(directory.to_string());
        self
    }

    pub fn file(mut self, name: &str, directory_index: u64) -> Self {
        self.files.push((name.to_string(), directory_index));
        self
    }

    // Program

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.program.extend_from_slice(bytes);
        self
    }

    pub fn special(self, opcode: u8) -> Self {
        self.raw(&[opcode])
    }

    pub fn copy(self) -> Self {
        self.raw(&[DW_LNS_COPY])
    }

    pub fn advance_pc(mut self, n: u64) -> Self {
        self.program.push(DW_LNS_ADVANCE_PC);
        write_uleb128(&mut self.program, n);
        self
    }

    pub fn advance_line(mut self, n: i64) -> Self {
        self.program.push(DW_LNS_ADVANCE_LINE);
        write_sleb128(&mut self.program, n);
        self
    }

    pub fn set_file(mut self, index: u64) -> Self {
        self.program.push(DW_LNS_SET_FILE);
        write_uleb128(&mut self.program, index);
        self
    }

    pub fn set_column(mut self, column: u64) -> Self {
        self.program.push(DW_LNS_SET_COLUMN);
        write_uleb128(&mut self.program, column);
        self
    }

    pub fn negate_stmt(self) -> Self {
        self.raw(&[DW_LNS_NEGATE_STMT])
    }

    pub fn set_basic_block(self) -> Self {
        self.raw(&[DW_LNS_SET_BASIC_BLOCK])
    }

    pub fn const_add_pc(self) -> Self {
        self.raw(&[DW_LNS_CONST_ADD_PC])
    }

    pub fn fixed_advance_pc(mut self, delta: u16) -> Self {
        self.program.push(DW_LNS_FIXED_ADVANCE_PC);
        match self.endian {
            Endian::Little => self.program.write_u16::<LittleEndian>(delta).unwrap(),
            Endian::Big => self.program.write_u16::<BigEndian>(delta).unwrap(),
        }
        self
    }

    pub fn set_prologue_end(self) -> Self {
        self.raw(&[DW_LNS_SET_PROLOGUE_END])
    }

    pub fn set_epilogue_begin(self) -> Self {
        self.raw(&[DW_LNS_SET_EPILOGUE_BEGIN])
    }

    pub fn set_isa(mut self, isa: u64) -> Self {
        self.program.push(DW_LNS_SET_ISA);
        write_uleb128(&mut self.program, isa);
        self
    }

    /// Extended opcode with an arbitrary payload; the length is computed.
    pub fn extended(mut self, opcode: u8, payload: &[u8]) -> Self {
        self.program.push(0);
        write_uleb128(&mut self.program, payload.len() as u64 + 1);
        self.program.push(opcode);
        self.program.extend_from_slice(payload);
        self
    }

    pub fn end_sequence(self) -> Self {
        self.extended(DW_LNE_END_SEQUENCE, &[])
    }

    pub fn set_address(self, address: u64) -> Self {
        let mut payload = Vec::new();
        let size = usize::from(self.address_size);
        match self.endian {
            Endian::Little => payload.extend_from_slice(&address.to_le_bytes()[..size]),
            Endian::Big => payload.extend_from_slice(&address.to_be_bytes()[8 - size..]),
        }
        self.extended(DW_LNE_SET_ADDRESS, &payload)
    }

    pub fn define_file(self, name: &str, directory_index: u64, mtime: u64, length: u64) -> Self {
        let mut payload = name.as_bytes().to_vec();
        payload.push(0);
        write_uleb128(&mut payload, directory_index);
        write_uleb128(&mut payload, mtime);
        write_uleb128(&mut payload, length);
        self.extended(DW_LNE_DEFINE_FILE, &payload)
    }

    pub fn set_discriminator(self, discriminator: u64) -> Self {
        let mut payload = Vec::new();
        write_uleb128(&mut payload, discriminator);
        self.extended(DW_LNE_SET_DISCRIMINATOR, &payload)
    }

    /// Compile unit matching this program, with its table at `stmt_list`.
    pub fn unit(&self, stmt_list: u64) -> CompileUnit {
        CompileUnit::new(stmt_list, COMP_DIR)
            .with_address_size(self.address_size)
            .with_endian(self.endian)
    }

    /// Assemble the unit.
    pub fn build(&self) -> Vec<u8> {
        let mut body = vec![self.min_inst_length];
        if self.version >= 4 {
            body.push(self.max_ops);
        }
        body.push(u8::from(self.default_is_stmt));
        body.push(self.line_base as u8);
        body.push(self.line_range);
        body.push(self.opcode_base);
        match &self.opcode_lengths {
            Some(lengths) => body.extend_from_slice(lengths),
            None => {
                for opcode in 1..self.opcode_base {
                    let index = usize::from(opcode) - 1;
                    body.push(STANDARD_OPCODE_LENGTHS.get(index).copied().unwrap_or(0));
                }
            }
        }
        for directory in &self.directories {
            body.extend_from_slice(directory.as_bytes());
            body.push(0);
        }
        body.push(0);
        for (name, directory_index) in &self.files {
            body.extend_from_slice(name.as_bytes());
            body.push(0);
            write_uleb128(&mut body, *directory_index);
            write_uleb128(&mut body, 0);
            write_uleb128(&mut body, 0);
        }
        body.push(0);

        let mut unit = Vec::new();
        self.write_u16(&mut unit, self.version);
        self.write_offset(&mut unit, body.len() as u64);
        unit.extend_from_slice(&body);
        unit.extend_from_slice(&self.program);

        let mut out = Vec::new();
        if self.format == DwarfFormat::Dwarf64 {
            self.write_u32(&mut out, DWARF64_ESCAPE);
        }
        self.write_offset(&mut out, unit.len() as u64);
        out.extend_from_slice(&unit);
        out
    }

    fn write_u16(&self, out: &mut Vec<u8>, value: u16) {
        match self.endian {
            Endian::Little => out.write_u16::<LittleEndian>(value).unwrap(),
            Endian::Big => out.write_u16::<BigEndian>(value).unwrap(),
        }
    }

    fn write_u32(&self, out: &mut Vec<u8>, value: u32) {
        match self.endian {
            Endian::Little => out.write_u32::<LittleEndian>(value).unwrap(),
            Endian::Big => out.write_u32::<BigEndian>(value).unwrap(),
        }
    }

    /// Section offset or length in the unit's format.
    fn write_offset(&self, out: &mut Vec<u8>, value: u64) {
        match (self.format, self.endian) {
            (DwarfFormat::Dwarf32, _) => self.write_u32(out, value as u32),
            (DwarfFormat::Dwarf64, Endian::Little) => out.write_u64::<LittleEndian>(value).unwrap(),
            (DwarfFormat::Dwarf64, Endian::Big) => out.write_u64::<BigEndian>(value).unwrap(),
        }
    }
}

pub fn write_uleb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_sleb128(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
