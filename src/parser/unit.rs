//! Compile-unit attributes needed to locate and read a line program.
//!
//! These come from `.debug_info`, which is parsed elsewhere. The byte order
//! and address size are taken from the unit rather than assumed, so the same
//! decoder handles 32-bit and big-endian targets.

use super::cursor::Endian;

/// The parts of a compile unit a line program depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    /// `DW_AT_stmt_list`: offset of the line program in `.debug_line`
    pub stmt_list: Option<u64>,
    /// `DW_AT_comp_dir`: compilation directory, directory 0 of the table
    pub comp_dir: Option<String>,
    /// Size in bytes of a target address (`DW_LNE_set_address` operand)
    pub address_size: u8,
    /// Byte order of the object file
    pub endian: Endian,
}

impl CompileUnit {
    /// A little-endian, 64-bit unit with its line program at `stmt_list`.
    pub fn new(stmt_list: u64, comp_dir: impl Into<String>) -> Self {
        Self {
            stmt_list: Some(stmt_list),
            comp_dir: Some(comp_dir.into()),
            address_size: 8,
            endian: Endian::Little,
        }
    }

    /// Override the address size.
    pub fn with_address_size(mut self, address_size: u8) -> Self {
        self.address_size = address_size;
        self
    }

    /// Override the byte order.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Compilation directory, or the empty string if the unit has none.
    pub fn comp_dir(&self) -> &str {
        self.comp_dir.as_deref().unwrap_or("")
    }
}

impl Default for CompileUnit {
    fn default() -> Self {
        Self {
            stmt_list: None,
            comp_dir: None,
            address_size: 8,
            endian: Endian::Little,
        }
    }
}
