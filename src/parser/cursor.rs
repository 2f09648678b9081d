//! Bounds-checked reader over a line section.
//!
//! The cursor works on absolute section offsets so that positions can be
//! captured and replayed later. Reads are limited to `[offset, end)`, where
//! `end` is narrowed to the end of the current unit once its length is known.
//!
//! The first failed read is remembered. From then on every read returns a
//! clone of that error without touching the buffer, which keeps a corrupted
//! length field from cascading into a pile of unrelated out-of-bounds reads.

use super::error::{LineError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

const CONTINUATION_BIT: u8 = 0x80;
const SIGN_BIT: u8 = 0x40;

/// Byte order of the object file the section came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    fn read_u64(self, buf: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(buf),
            Endian::Big => BigEndian::read_u64(buf),
        }
    }
}

/// Sticky-error reader over a byte section.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Whole section; offsets are relative to its start
    section: &'a [u8],
    /// Next byte to read
    offset: usize,
    /// One past the last readable byte
    end: usize,
    endian: Endian,
    address_size: u8,
    /// First failure, if any
    error: Option<LineError>,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at `offset`, readable up to the end of the section.
    ///
    /// An offset past the end of the section is clamped, so the first read
    /// fails instead of panicking.
    pub fn new(section: &'a [u8], offset: usize, endian: Endian, address_size: u8) -> Self {
        let offset = offset.min(section.len());
        Self {
            section,
            offset,
            end: section.len(),
            endian,
            address_size,
            error: None,
        }
    }

    /// Current absolute offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute offset one past the last readable byte.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Size of the underlying section.
    pub fn section_len(&self) -> usize {
        self.section.len()
    }

    /// Bytes left before `end`.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.offset)
    }

    /// True when no readable bytes are left.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn address_size(&self) -> u8 {
        self.address_size
    }

    /// The recorded failure, if any.
    pub fn error(&self) -> Option<&LineError> {
        self.error.as_ref()
    }

    /// Return the recorded failure as an `Err`, or `Ok(())`.
    pub fn check(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record a failure and return the sticky error.
    ///
    /// Only the first failure is kept; later ones are dropped in favour of it.
    pub fn fail(&mut self, err: LineError) -> LineError {
        match &self.error {
            Some(first) => first.clone(),
            None => {
                log::warn!("Line program decode failed: {}", err);
                self.error = Some(err.clone());
                err
            }
        }
    }

    /// Reposition to `offset` with reads limited to `end`.
    ///
    /// The recorded failure, if any, survives the move.
    pub fn seek(&mut self, offset: usize, end: usize) {
        self.end = end.min(self.section.len());
        self.offset = offset.min(self.end);
    }

    /// Limit reads to `end` without moving.
    pub fn set_end(&mut self, end: usize) {
        self.end = end.min(self.section.len());
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check()?;
        if len > self.remaining() {
            let err = LineError::UnexpectedEof {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            };
            return Err(self.fail(err));
        }
        let bytes = &self.section[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(self.endian.read_u16(bytes))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(self.endian.read_u32(bytes))
    }

    pub fn u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(self.endian.read_u64(bytes))
    }

    /// Read an unsigned LEB128 value.
    pub fn uleb128(&mut self) -> Result<u64> {
        let start = self.offset;
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.u8()?;
            if shift == 63 && byte != 0x00 && byte != 0x01 {
                return Err(self.fail(LineError::Leb128Overflow { offset: start }));
            }
            result |= u64::from(byte & !CONTINUATION_BIT) << shift;
            if byte & CONTINUATION_BIT == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Read a signed LEB128 value.
    pub fn sleb128(&mut self) -> Result<i64> {
        let start = self.offset;
        let mut result = 0i64;
        let mut shift = 0u32;
        let mut byte;
        loop {
            byte = self.u8()?;
            if shift == 63 && byte != 0x00 && byte != 0x7F {
                return Err(self.fail(LineError::Leb128Overflow { offset: start }));
            }
            result |= i64::from(byte & !CONTINUATION_BIT) << shift;
            shift += 7;
            if byte & CONTINUATION_BIT == 0 {
                break;
            }
        }
        if shift < 64 && byte & SIGN_BIT != 0 {
            // Sign extend
            result |= !0i64 << shift;
        }
        Ok(result)
    }

    /// Read a NUL-terminated string. The terminator is consumed.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; path bytes in the
    /// wild are not always valid UTF-8.
    pub fn string(&mut self) -> Result<String> {
        self.check()?;
        let available = self.section.get(self.offset..self.end).unwrap_or(&[]);
        let Some(len) = available.iter().position(|&b| b == 0) else {
            let err = LineError::UnexpectedEof {
                offset: self.offset,
                needed: available.len() + 1,
                available: available.len(),
            };
            return Err(self.fail(err));
        };
        let bytes = self.take(len + 1)?;
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }

    /// Read a target address using the unit's address size.
    pub fn address(&mut self) -> Result<u64> {
        match self.address_size {
            1 => self.u8().map(u64::from),
            2 => self.u16().map(u64::from),
            4 => self.u32().map(u64::from),
            8 => self.u64(),
            other => Err(self.fail(LineError::UnsupportedAddressSize(other))),
        }
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.take(len).map(|_| ())
    }
}
