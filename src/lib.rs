//! dwarf-line library
//!
//! Decoder for DWARF 2-4 line number programs (`.debug_line`). Given a
//! compile unit's line program offset and the raw section bytes, a
//! [`LineReader`] produces the address-to-source rows of that unit one at a
//! time, and can look up the row covering a given address.
//!
//! Object file loading and the other debug sections are left to the caller.

pub mod config;
pub mod interpreter;
pub mod parser;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use interpreter::{LineInstruction, LinePosition, LineReader, LineRow, Rows};
pub use parser::{CompileUnit, Endian, FileEntry, LineError, LineProgramHeader, Result};
