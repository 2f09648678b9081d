//! Address lookup over the sequential reader.
//!
//! Line programs can only be scanned forward. The search continues from the
//! reader's current position and restarts from the program start once if the
//! first row it sees is already past the target, so ascending lookups reuse
//! earlier progress. Each lookup is linear in the worst case; callers that
//! query many addresses should build their own index from [`LineReader::rows`].

use super::reader::LineReader;
use super::state::LineRow;
use crate::parser::error::Result;

impl LineReader<'_> {
    /// Find the row whose address range covers `pc`.
    ///
    /// Returns `Ok(None)` if no sequence covers `pc`. On a hit the reader is
    /// left positioned at the row after the returned one, so `next_row`
    /// continues from there.
    pub fn seek_pc(&mut self, pc: u64) -> Result<Option<LineRow>> {
        let held = match self.next_row()? {
            Some(row) if row.address <= pc => row,
            _ => {
                log::debug!("Restarting line table search for 0x{:X}", pc);
                self.reset();
                match self.next_row()? {
                    Some(row) if row.address <= pc => row,
                    _ => {
                        // Before the first row of the table
                        self.reset();
                        return Ok(None);
                    }
                }
            }
        };
        self.scan_to(pc, held)
    }

    /// Scan forward from `held`, a row at or below `pc`, until the next row
    /// passes `pc`.
    fn scan_to(&mut self, pc: u64, mut held: LineRow) -> Result<Option<LineRow>> {
        loop {
            let position = self.checkpoint();
            let Some(next) = self.next_row()? else {
                return Ok(None);
            };
            if next.address > pc {
                self.restore(position);
                if held.end_sequence {
                    // Between two sequences
                    return Ok(None);
                }
                return Ok(Some(held));
            }
            held = next;
        }
    }
}
