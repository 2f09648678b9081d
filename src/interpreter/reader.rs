//! Sequential line table reader.
//!
//! A [`LineReader`] owns the cursor, the register set and the file table for
//! one compile unit's line program. [`LineReader::next_row`] runs the state
//! machine until it emits a row; rows come out in program order, which is
//! address order within each sequence.

use super::opcode::LineInstruction;
use super::state::LineRow;
use crate::config::Config;
use crate::parser::cursor::Cursor;
use crate::parser::error::{LineError, Result};
use crate::parser::file::{FileEntry, FileTable};
use crate::parser::header::LineProgramHeader;
use crate::parser::unit::CompileUnit;

/// Line table reader for a single compile unit.
#[derive(Debug, Clone)]
pub struct LineReader<'a> {
    pub(super) cursor: Cursor<'a>,
    pub(super) header: LineProgramHeader,
    pub(super) files: FileTable,
    pub(super) state: LineRow,
}

impl<'a> LineReader<'a> {
    /// Create a reader for `unit`'s line program in the `.debug_line` bytes.
    ///
    /// Returns `Ok(None)` if the unit has no line program. Uses the built-in
    /// defaults; nothing is read from the environment.
    pub fn new(unit: &CompileUnit, section: &'a [u8]) -> Result<Option<Self>> {
        Self::with_config(unit, section, &Config::default())
    }

    /// Create a reader with an explicit configuration, such as the layered
    /// one from [`Config::get`].
    pub fn with_config(
        unit: &CompileUnit,
        section: &'a [u8],
        config: &Config,
    ) -> Result<Option<Self>> {
        let Some(stmt_list) = unit.stmt_list else {
            log::debug!("Compile unit has no line program");
            return Ok(None);
        };
        if !matches!(unit.address_size, 1 | 2 | 4 | 8) {
            return Err(LineError::UnsupportedAddressSize(unit.address_size));
        }

        let offset = usize::try_from(stmt_list).unwrap_or(usize::MAX);
        let mut cursor = Cursor::new(section, offset, unit.endian, unit.address_size);
        let mut files = FileTable::new(config.max_file_entries());
        let header = LineProgramHeader::parse(
            &mut cursor,
            unit.comp_dir(),
            &mut files,
            config.check_opcode_lengths(),
        )?;

        let mut reader = Self {
            cursor,
            state: LineRow::new(header.default_is_stmt),
            header,
            files,
        };
        reader.reset();
        Ok(Some(reader))
    }

    /// The decoded header.
    pub fn header(&self) -> &LineProgramHeader {
        &self.header
    }

    /// Include directories; entry 0 is the compilation directory.
    pub fn include_directories(&self) -> &[String] {
        &self.header.include_directories
    }

    /// The file table as of the current position.
    pub fn files(&self) -> &FileTable {
        &self.files
    }

    /// Look up a file by its 1-based index.
    pub fn file(&self, index: u64) -> Option<&FileEntry> {
        self.files.get(index)
    }

    /// Resolve a row's file against the current file table.
    ///
    /// Files defined mid-program disappear when the reader rewinds past their
    /// definition, so resolve rows while the reader is still positioned after
    /// them.
    pub fn row_file(&self, row: &LineRow) -> Option<&FileEntry> {
        self.files.get(row.file_index)
    }

    /// True once every instruction of the program has been executed.
    pub fn is_at_end(&self) -> bool {
        self.cursor.is_empty()
    }

    /// The failure that stopped this reader, if any.
    pub fn error(&self) -> Option<&LineError> {
        self.cursor.error()
    }

    /// Decode the next row.
    ///
    /// Returns `Ok(None)` once the program is exhausted. After a failure,
    /// every call returns the same error.
    pub fn next_row(&mut self) -> Result<Option<LineRow>> {
        self.cursor.check()?;
        while !self.cursor.is_empty() {
            if let Some(row) = self.step()? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    /// Execute a single instruction, returning the row it emits, if any.
    ///
    /// At the end of the program this does nothing and returns `Ok(None)`;
    /// use [`is_at_end`](Self::is_at_end) to tell that apart from an
    /// instruction that emits no row.
    pub fn step(&mut self) -> Result<Option<LineRow>> {
        self.cursor.check()?;
        if self.cursor.is_empty() {
            return Ok(None);
        }
        let instruction =
            LineInstruction::decode(&mut self.cursor, &self.header, &mut self.files)?;
        Ok(self.state.execute(&instruction, &self.header))
    }

    /// Iterate over the remaining rows.
    ///
    /// The iterator ends at the end of the table, or after yielding the
    /// first error.
    pub fn rows(&mut self) -> Rows<'_, 'a> {
        Rows {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over the rows of a [`LineReader`].
pub struct Rows<'r, 'a> {
    reader: &'r mut LineReader<'a>,
    done: bool,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<LineRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
