//! Line section parsers.
//!
//! This module decodes the fixed parts of a `.debug_line` unit:
//!
//! - [`cursor`] - Bounds-checked, sticky-error reader over the section bytes
//! - [`unit`] - Compile unit attributes that locate and shape a line program
//! - [`header`] - Line program header (prologue)
//! - [`file`] - Include directory and file tables
//! - [`error`] - Decode failures

pub mod cursor;
pub mod error;
pub mod file;
pub mod header;
pub mod unit;

pub use cursor::{Cursor, Endian};
pub use error::{LineError, Result};
pub use file::{FileEntry, FileTable};
pub use header::{DwarfFormat, LineProgramHeader};
pub use unit::CompileUnit;
