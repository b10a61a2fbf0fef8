//! Data section: framed record values
//!
//! Records are framed `0x0B, TypeId:u16, NameHash:u32, <fields...>, 0xB0`.
//! The field bytes between header and footer carry no per-field framing;
//! reads are driven by the destination type's declared field order.
//!
//! Primitive codecs live here: fixed-width big-endian integers, f32 as its
//! IEEE-754 bit pattern in a u32 word, bool as one byte, and text as a u16
//! length prefix followed by the raw bytes with no terminator.

use crate::error::FxsdError;
use crate::hash::NameHash;
use crate::registry::TypeId;
use crate::section::Section;
use crate::{RECORD_END, RECORD_START, Result};

/// Parsed record frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub type_id: TypeId,
    pub name_hash: NameHash,
}

/// Data section buffer with record framing and primitive codecs
#[derive(Debug)]
pub struct DataSection {
    section: Section,
}

impl DataSection {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            section: Section::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.section.len()
    }

    pub fn is_empty(&self) -> bool {
        self.section.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.section.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.section.as_bytes()
    }

    /// Current read cursor position
    pub fn position(&self) -> usize {
        self.section.position()
    }

    /// Move the read cursor (records are decoded sequentially from it)
    pub fn seek(&mut self, pos: usize) {
        self.section.seek(pos);
    }

    /// Replace the section contents with loaded bytes
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.section.load_bytes(bytes)
    }

    /// Discard everything written past `len` (failed-write rollback)
    pub(crate) fn truncate(&mut self, len: usize) {
        self.section.truncate(len);
    }

    // =========================================================================
    // Record framing
    // =========================================================================

    pub fn write_record_header(&mut self, type_id: TypeId, name_hash: NameHash) -> Result<()> {
        self.section.write_u8(RECORD_START)?;
        self.section.write_u16(type_id.raw())?;
        self.section.write_u32(name_hash)
    }

    pub fn write_record_footer(&mut self) -> Result<()> {
        self.section.write_u8(RECORD_END)
    }

    /// Read and validate one record header at the read cursor
    pub fn read_record_header(&mut self) -> Result<RecordHeader> {
        let offset = self.section.position();
        let marker = self.section.read_u8()?;
        if marker != RECORD_START {
            return Err(FxsdError::FrameCorruption {
                expected: RECORD_START,
                found: marker,
                offset,
            });
        }

        let type_id = TypeId::from_raw(self.section.read_u16()?);
        let name_hash = self.section.read_u32()?;
        Ok(RecordHeader { type_id, name_hash })
    }

    /// Read and validate one record footer at the read cursor
    pub fn read_record_footer(&mut self) -> Result<()> {
        let offset = self.section.position();
        let marker = self.section.read_u8()?;
        if marker != RECORD_END {
            return Err(FxsdError::FrameCorruption {
                expected: RECORD_END,
                found: marker,
                offset,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Primitive codecs
    // =========================================================================

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.section.write_u32(value as u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.section.read_u32()? as i32)
    }

    /// f32 travels as its IEEE-754 bit pattern in a big-endian u32 word
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.section.write_u32(value.to_bits())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.section.read_u32()?))
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.section.write_u8(value as u8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.section.position();
        match self.section.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FxsdError::FrameCorruption {
                expected: 0x01,
                found: other,
                offset,
            }),
        }
    }

    /// Text: u16 length prefix, then the raw bytes, no terminator
    pub fn write_text(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(FxsdError::CapacityExceeded {
                needed: bytes.len(),
                capacity: u16::MAX as usize,
            });
        }
        self.section.write_u16(bytes.len() as u16)?;
        self.section.write_bytes(bytes)
    }

    /// No character-set validation is performed on the wire; bytes that
    /// are not valid UTF-8 decode lossily.
    pub fn read_text(&mut self) -> Result<String> {
        let len = self.section.read_u16()? as usize;
        let bytes = self.section.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
