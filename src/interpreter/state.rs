//! Line state machine registers.
//!
//! The register set has exactly the fields of an emitted row, so one type
//! serves both. Rows are half-open: a row covers the instructions from its
//! address up to the next row's address in the same sequence.

use super::opcode::LineInstruction;
use crate::parser::header::LineProgramHeader;

/// One line table row, and the register set it is copied from.
///
/// When `end_sequence` is set only `address` is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRow {
    /// Instruction address
    pub address: u64,
    /// Operation within a VLIW bundle; always 0 on other targets
    pub op_index: u64,
    /// 1-based index into the file table
    pub file_index: u64,
    /// 1-based source line, 0 if unattributable
    pub line: u64,
    /// 1-based column, 0 for the left edge
    pub column: u64,
    /// Recommended breakpoint location
    pub is_stmt: bool,
    /// Start of a basic block
    pub basic_block: bool,
    /// Where a function breakpoint should stop after the prologue
    pub prologue_end: bool,
    /// Where a breakpoint on function exit should stop
    pub epilogue_begin: bool,
    /// Instruction set architecture
    pub isa: u64,
    /// Distinguishes blocks sharing a file, line and column
    pub discriminator: u64,
    /// First address past the end of a sequence
    pub end_sequence: bool,
}

impl LineRow {
    /// Register values at the start of every sequence.
    pub fn new(default_is_stmt: bool) -> Self {
        Self {
            address: 0,
            op_index: 0,
            file_index: 1,
            line: 1,
            column: 0,
            is_stmt: default_is_stmt,
            basic_block: false,
            prologue_end: false,
            epilogue_begin: false,
            isa: 0,
            discriminator: 0,
            end_sequence: false,
        }
    }

    /// Advance the operation pointer by `operation_advance` operations.
    ///
    /// With one operation per instruction this adds
    /// `minimum_instruction_length * operation_advance` to the address and
    /// leaves `op_index` at 0.
    pub fn advance(&mut self, operation_advance: u64, header: &LineProgramHeader) {
        let min_length = u64::from(header.minimum_instruction_length);
        let max_ops = u64::from(header.maximum_operations_per_instruction);
        let op_index = self.op_index.wrapping_add(operation_advance);
        self.address = self
            .address
            .wrapping_add(min_length.wrapping_mul(op_index / max_ops));
        self.op_index = op_index % max_ops;
    }

    /// Copy the registers out as a row and clear the per-row flags.
    pub fn emit(&mut self) -> LineRow {
        let row = *self;
        self.basic_block = false;
        self.prologue_end = false;
        self.epilogue_begin = false;
        self.discriminator = 0;
        row
    }

    /// Apply one instruction, returning the row it emits, if any.
    pub fn execute(
        &mut self,
        instruction: &LineInstruction,
        header: &LineProgramHeader,
    ) -> Option<LineRow> {
        match *instruction {
            LineInstruction::Special(opcode) => {
                let adjusted = u64::from(opcode.saturating_sub(header.opcode_base));
                let line_range = u64::from(header.line_range);
                self.advance(adjusted / line_range, header);
                let line_delta = i64::from(header.line_base) + (adjusted % line_range) as i64;
                self.line = self.line.wrapping_add_signed(line_delta);
                return Some(self.emit());
            }

            LineInstruction::Copy => return Some(self.emit()),
            LineInstruction::AdvancePc(n) => self.advance(n, header),
            LineInstruction::AdvanceLine(delta) => {
                self.line = self.line.wrapping_add_signed(delta);
            }
            LineInstruction::SetFile(index) => self.file_index = index,
            LineInstruction::SetColumn(column) => self.column = column,
            LineInstruction::NegateStatement => self.is_stmt = !self.is_stmt,
            LineInstruction::SetBasicBlock => self.basic_block = true,
            LineInstruction::ConstAddPc => self.advance(header.const_add_pc_advance(), header),
            LineInstruction::FixedAddPc(delta) => {
                self.address = self.address.wrapping_add(u64::from(delta));
            }
            LineInstruction::SetPrologueEnd => self.prologue_end = true,
            LineInstruction::SetEpilogueBegin => self.epilogue_begin = true,
            LineInstruction::SetIsa(isa) => self.isa = isa,
            LineInstruction::UnknownStandard { .. } => {}

            LineInstruction::EndSequence => {
                self.end_sequence = true;
                let row = *self;
                *self = LineRow::new(header.default_is_stmt);
                return Some(row);
            }
            LineInstruction::SetAddress(address) => self.address = address,
            // The table grew; the file index itself is unchanged
            LineInstruction::DefineFile(_) => {}
            LineInstruction::SetDiscriminator(discriminator) => {
                self.discriminator = discriminator;
            }
            LineInstruction::UnknownExtended { .. } => {}
        }
        None
    }
}
