//! Line number program interpreter.
//!
//! Runs the opcode stream of one line program against a register set and
//! emits rows mapping addresses to source positions.
//!
//! # Architecture
//!
//! - [`opcode`]: Opcode constants and decoding into [`LineInstruction`]
//! - [`state`]: Register set, row emission and VLIW-aware address advance
//! - [`reader`]: Sequential row reader ([`LineReader`])
//! - [`checkpoint`]: Saving, restoring and resetting reader positions
//! - [`search`]: Address lookup built on forward scan and checkpoints
//!
//! # Example
//!
//! ```ignore
//! use dwarf_line::{CompileUnit, LineReader};
//!
//! let unit = CompileUnit::new(stmt_list, "/home/user/project");
//! if let Some(mut reader) = LineReader::new(&unit, debug_line)? {
//!     while let Some(row) = reader.next_row()? {
//!         let file = reader.row_file(&row).map_or("??", |f| f.path.as_str());
//!         println!("0x{:X} {}:{}", row.address, file, row.line);
//!     }
//! }
//! ```

pub mod checkpoint;
pub mod opcode;
pub mod reader;
pub mod search;
pub mod state;

pub use checkpoint::LinePosition;
pub use opcode::LineInstruction;
pub use reader::{LineReader, Rows};
pub use state::LineRow;
