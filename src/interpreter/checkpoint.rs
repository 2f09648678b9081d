//! Saving and restoring reader positions.
//!
//! A position is the cursor offset, the file table length and the register
//! set. Restoring sets the file table back to that length in either
//! direction, so a resumed reader sees exactly the table it had when the
//! position was taken.

use super::reader::LineReader;
use super::state::LineRow;

/// Opaque snapshot of a [`LineReader`]'s progress.
///
/// Only meaningful for the reader that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePosition {
    offset: usize,
    file_count: usize,
    state: LineRow,
}

impl LineReader<'_> {
    /// Capture the current position.
    pub fn checkpoint(&self) -> LinePosition {
        LinePosition {
            offset: self.cursor.offset(),
            file_count: self.files.len(),
            state: self.state,
        }
    }

    /// Return to a position captured by [`checkpoint`](Self::checkpoint).
    ///
    /// A failure recorded by the reader is not cleared.
    pub fn restore(&mut self, position: LinePosition) {
        log::trace!(
            "Restoring line program position 0x{:X} ({} files)",
            position.offset,
            position.file_count
        );
        self.cursor.seek(position.offset, self.header.end_offset);
        self.files.set_len(position.file_count);
        self.state = position.state;
    }

    /// Rewind to the first instruction of the program.
    pub fn reset(&mut self) {
        self.cursor.seek(self.header.program_offset, self.header.end_offset);
        self.files.truncate(self.header.initial_file_count);
        self.state = LineRow::new(self.header.default_is_stmt);
    }
}
