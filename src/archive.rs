//! Archive container: owns both sections, frames them into a file
//!
//! The container holds one schema section and one data section, each a
//! fixed-capacity buffer sized at construction. `to_bytes` concatenates
//! the framed file image; `persist`/`load` move that image through the
//! filesystem. Loading stages and validates everything before touching
//! the in-memory sections, so a failed load leaves the archive unchanged.

use std::path::Path;

use crate::data::DataSection;
use crate::error::FxsdError;
use crate::hash::NameHash;
use crate::record::{self, Record};
use crate::schema::SchemaSection;
use crate::section::ByteReader;
use crate::{DATA_SIGNATURE, DEFAULT_SECTION_CAPACITY, FILE_SIGNATURE, Result};

/// Self-describing binary archive of typed records
#[derive(Debug)]
pub struct Archive {
    schema: SchemaSection,
    data: DataSection,
}

impl Archive {
    /// Archive with the default per-section capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SECTION_CAPACITY)
    }

    /// Archive with a caller-chosen per-section capacity in bytes.
    ///
    /// There is no implicit growth; callers expecting large record sets
    /// must size up front.
    pub fn with_capacity(section_capacity: usize) -> Self {
        Self {
            schema: SchemaSection::with_capacity(section_capacity),
            data: DataSection::with_capacity(section_capacity),
        }
    }

    /// Schema section, for tree resolution and diagnostics
    pub fn schema(&self) -> &SchemaSection {
        &self.schema
    }

    /// Data section, for cursor control and diagnostics
    pub fn data(&self) -> &DataSection {
        &self.data
    }

    /// Serialize one record: registers its schema tree (deduplicated),
    /// then appends a framed record to the data section.
    ///
    /// A failed write rolls both sections back to their previous lengths,
    /// so the archive stays readable after the error.
    pub fn write_record(&mut self, record: &dyn Record, name_hash: NameHash) -> Result<()> {
        record::write_record(record, name_hash, &mut self.schema, &mut self.data)
    }

    /// Decode the record at the data read cursor into `dest`.
    ///
    /// A non-zero `name_hash` must match the stored hash; zero disables
    /// the name check. The stored type id must match the destination's.
    /// On either validation failure the cursor stays at the frame start,
    /// so the record can be retried with different parameters.
    pub fn read_record(&mut self, dest: &mut dyn Record, name_hash: NameHash) -> Result<()> {
        record::read_record(dest, name_hash, &mut self.data)
    }

    /// Rewind the data read cursor to the first record
    pub fn rewind(&mut self) {
        self.data.seek(0);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Serialize the archive to its file image:
    /// `"FXSD", schema len:u32, schema bytes, ".DAT", data len:u32, data bytes`
    pub fn to_bytes(&self) -> Vec<u8> {
        let schema = self.schema.as_bytes();
        let data = self.data.as_bytes();

        let mut bytes = Vec::with_capacity(16 + schema.len() + data.len());
        bytes.extend_from_slice(FILE_SIGNATURE);
        bytes.extend_from_slice(&(schema.len() as u32).to_be_bytes());
        bytes.extend_from_slice(schema);
        bytes.extend_from_slice(DATA_SIGNATURE);
        bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(data);
        bytes
    }

    /// Validate a file image and replace both sections with its contents.
    ///
    /// Nothing is committed until both sections have been parsed and
    /// checked against the fixed capacities.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut reader = ByteReader::new(bytes);

        let schema_bytes = read_section(
            &mut reader,
            bytes,
            "file",
            FILE_SIGNATURE,
            self.schema.capacity(),
        )?;
        let data_bytes = read_section(
            &mut reader,
            bytes,
            "data",
            DATA_SIGNATURE,
            self.data.capacity(),
        )?;

        // Both sections validated; commit.
        self.schema.load_bytes(schema_bytes)?;
        self.data.load_bytes(data_bytes)?;
        Ok(())
    }

    /// Write the archive image to a file
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!(
            "persisting archive to {} (schema {} bytes, data {} bytes)",
            path.display(),
            self.schema.len(),
            self.data.len()
        );
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Load an archive image from a file.
    ///
    /// On any validation failure the in-memory sections are left as they
    /// were.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = std::fs::read(path.as_ref())?;
        self.load_bytes(&bytes)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Human-readable view of the record framed at `offset` in the data
    /// section, resolved against the schema section.
    ///
    /// Optional tooling; never required for correctness and never panics
    /// on corrupt input.
    pub fn describe_record(&self, offset: usize) -> Result<String> {
        use std::fmt::Write;

        let mut reader = ByteReader::at(self.data.as_bytes(), offset);

        let marker = reader.read_u8()?;
        if marker != crate::RECORD_START {
            return Err(FxsdError::FrameCorruption {
                expected: crate::RECORD_START,
                found: marker,
                offset,
            });
        }

        let type_id = crate::TypeId::from_raw(reader.read_u16()?);
        let name_hash = reader.read_u32()?;

        let tree = self.schema.read_schema_tree_for(type_id)?;
        let root = tree.root();

        let mut out = String::new();
        writeln!(&mut out, "record type {} name hash {:#010X}", type_id, name_hash).ok();
        writeln!(
            &mut out,
            "type {{ size: {}, members: {} }}",
            root.byte_size,
            root.children.len()
        )
        .ok();

        let mut total = 0usize;
        for &child in &root.children {
            if let Some(member) = tree.node(child) {
                writeln!(
                    &mut out,
                    "    member type {} ({} bytes)",
                    member.type_id, member.byte_size
                )
                .ok();
                total += member.byte_size as usize;
            }
        }
        writeln!(&mut out, "declared member bytes: {}", total).ok();
        Ok(out)
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one `signature, len:u32, bytes` frame from the file image
fn read_section<'a>(
    reader: &mut ByteReader<'_>,
    bytes: &'a [u8],
    section: &'static str,
    expected: &[u8; 4],
    capacity: usize,
) -> Result<&'a [u8]> {
    let mut found = [0u8; 4];
    for slot in &mut found {
        *slot = reader.read_u8()?;
    }
    if &found != expected {
        return Err(FxsdError::Format {
            section,
            expected: *expected,
            found,
        });
    }

    let len = reader.read_u32()? as usize;
    if len > capacity {
        return Err(FxsdError::SectionTooLarge {
            section,
            len,
            capacity,
        });
    }

    let start = reader.position();
    reader.skip(len)?;
    Ok(&bytes[start..start + len])
}
