//! Fixed-capacity section buffers
//!
//! Both archive sections sit on top of the same primitive: a contiguous
//! byte buffer with a fixed capacity chosen at construction, an append
//! cursor for writes, and a separate cursor for sequential reads. Every
//! access is bounds-checked and reports [`FxsdError::CapacityExceeded`]
//! instead of growing or truncating.
//!
//! Multi-byte integers are big-endian. A 32-bit write goes through two
//! 16-bit halves; the net wire layout is a standard big-endian u32.

use crate::Result;
use crate::error::FxsdError;

/// Bounds-checked byte buffer with write and read cursors
#[derive(Debug)]
pub struct Section {
    buf: Vec<u8>,
    capacity: usize,
    cursor: usize,
}

impl Section {
    /// Create an empty section with a fixed capacity in bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Fixed capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current read cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Move the read cursor
    pub fn seek(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// All bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Replace the section contents with loaded bytes and rewind the
    /// read cursor. The incoming length must fit the fixed capacity.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.capacity {
            return Err(FxsdError::CapacityExceeded {
                needed: bytes.len(),
                capacity: self.capacity,
            });
        }
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.cursor = 0;
        Ok(())
    }

    /// Discard everything written past `len`, clamping the read cursor.
    /// Used to roll a failed multi-part write back to a clean frame
    /// boundary.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
        if self.cursor > self.buf.len() {
            self.cursor = self.buf.len();
        }
    }

    fn check_write(&self, extra: usize) -> Result<()> {
        let needed = self.buf.len() + extra;
        if needed > self.capacity {
            return Err(FxsdError::CapacityExceeded {
                needed,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Write functions
    // =========================================================================

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.check_write(1)?;
        self.buf.push(value);
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.check_write(2)?;
        self.buf.push((value >> 8) as u8);
        self.buf.push(value as u8);
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.check_write(4)?;
        self.write_u16((value >> 16) as u16)?;
        self.write_u16(value as u16)
    }

    /// Write a raw byte run
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_write(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    // =========================================================================
    // Read functions (sequential, from the read cursor)
    // =========================================================================

    fn check_read(&self, count: usize) -> Result<()> {
        let needed = self.cursor + count;
        if needed > self.buf.len() {
            return Err(FxsdError::CapacityExceeded {
                needed,
                capacity: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check_read(1)?;
        let value = self.buf[self.cursor];
        self.cursor += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.check_read(2)?;
        let hi = (self.buf[self.cursor] as u16) << 8;
        let lo = self.buf[self.cursor + 1] as u16;
        self.cursor += 2;
        Ok(hi | lo)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(((self.read_u16()? as u32) << 16) | self.read_u16()? as u32)
    }

    /// Read a raw byte run
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.check_read(count)?;
        let bytes = self.buf[self.cursor..self.cursor + count].to_vec();
        self.cursor += count;
        Ok(bytes)
    }
}

/// Stateless sequential reader over a byte slice
///
/// Schema scans walk the buffer without disturbing the owning section's
/// read cursor, so they run over a borrowed slice with local position.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn check(&self, count: usize) -> Result<()> {
        if self.pos + count > self.buf.len() {
            return Err(FxsdError::CapacityExceeded {
                needed: self.pos + count,
                capacity: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.check(2)?;
        let value = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(((self.read_u16()? as u32) << 16) | self.read_u16()? as u32)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.check(count)?;
        self.pos += count;
        Ok(())
    }
}
