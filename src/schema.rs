//! Schema section: type shape descriptors
//!
//! One entry per distinct type, framed as:
//!
//! ```text
//! 0xEF, TypeId:u16, ByteSize:u16, MemberCount:u8,
//!       (MemberByteSize:u16, MemberTypeId:u16) × MemberCount, 0xBE
//! ```
//!
//! Primitives are entries with zero members. Lookup by id is a linear
//! forward scan that revalidates frame markers at every entry, so a
//! corrupt section is reported as corruption instead of a bogus offset.
//! Write-time dedup goes through a side table and never rescans.

use hashbrown::HashMap;

use crate::error::FxsdError;
use crate::registry::TypeId;
use crate::section::{ByteReader, Section};
use crate::{MAX_SCHEMA_DEPTH, Result, SCHEMA_ENTRY_END, SCHEMA_ENTRY_START};

/// One member slot inside a schema entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub type_id: TypeId,
    pub byte_size: u16,
}

/// Parsed shape of one schema entry, members unresolved
#[derive(Debug, Clone)]
struct SchemaEntry {
    type_id: TypeId,
    byte_size: u16,
    members: Vec<MemberDescriptor>,
}

/// One node of a resolved schema tree
///
/// Children address other nodes in the owning [`SchemaTree`] arena.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub type_id: TypeId,
    pub byte_size: u16,
    pub children: Vec<usize>,
}

/// Recursively resolved shape of a type, arena-backed
#[derive(Debug, Clone)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
    root: usize,
}

impl SchemaTree {
    /// Root node of the tree
    pub fn root(&self) -> &SchemaNode {
        &self.nodes[self.root]
    }

    /// Node by arena index (as stored in [`SchemaNode::children`])
    pub fn node(&self, index: usize) -> Option<&SchemaNode> {
        self.nodes.get(index)
    }

    /// Total node count, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Schema section buffer plus a write-side id→offset table
#[derive(Debug)]
pub struct SchemaSection {
    section: Section,
    offsets: HashMap<TypeId, usize>,
}

impl SchemaSection {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            section: Section::with_capacity(capacity),
            offsets: HashMap::new(),
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

    /// Replace the section with loaded bytes and drop the write-side table
    /// (lookups on loaded data go through the byte scan).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.section.load_bytes(bytes)?;
        self.offsets.clear();
        Ok(())
    }

    /// Discard entries written past `len`, dropping their side-table
    /// offsets with them
    pub(crate) fn truncate(&mut self, len: usize) {
        self.section.truncate(len);
        self.offsets.retain(|_, offset| *offset < len);
    }

    /// Whether an entry for `type_id` exists in this section.
    ///
    /// A corrupt section propagates [`FxsdError::FrameCorruption`] rather
    /// than reading as "absent"; only a clean exhaustive scan is a `false`.
    pub fn contains(&self, type_id: TypeId) -> Result<bool> {
        if self.offsets.contains_key(&type_id) {
            return Ok(true);
        }
        match self.find_entry_offset(type_id) {
            Ok(_) => Ok(true),
            Err(FxsdError::TypeNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Append one schema entry; no-op if `type_id` already has one.
    ///
    /// Callers are responsible for registering member types first (the
    /// dispatcher recurses into nested aggregates before their parent).
    pub fn write_entry(
        &mut self,
        type_id: TypeId,
        byte_size: u16,
        members: &[MemberDescriptor],
    ) -> Result<()> {
        if self.contains(type_id)? {
            return Ok(());
        }
        if members.len() > u8::MAX as usize {
            return Err(FxsdError::TooManyMembers {
                count: members.len(),
            });
        }

        log::debug!(
            "writing schema entry for type {} ({} bytes, {} members)",
            type_id,
            byte_size,
            members.len()
        );

        let start = self.section.len();
        self.section.write_u8(SCHEMA_ENTRY_START)?;
        self.section.write_u16(type_id.raw())?;
        self.section.write_u16(byte_size)?;
        self.section.write_u8(members.len() as u8)?;
        for member in members {
            self.section.write_u16(member.byte_size)?;
            self.section.write_u16(member.type_id.raw())?;
        }
        self.section.write_u8(SCHEMA_ENTRY_END)?;

        self.offsets.insert(type_id, start);
        Ok(())
    }

    /// Linear scan for the entry byte offset of `type_id`.
    ///
    /// Every entry's frame markers are validated on the way; a mismatch
    /// stops the scan with [`FxsdError::FrameCorruption`], distinct from
    /// the clean-exhaustion [`FxsdError::TypeNotFound`].
    pub fn find_entry_offset(&self, type_id: TypeId) -> Result<usize> {
        let buf = self.section.as_bytes();
        let mut reader = ByteReader::new(buf);

        while reader.remaining() > 0 {
            let start = reader.position();

            let marker = reader.read_u8()?;
            if marker != SCHEMA_ENTRY_START {
                log::warn!(
                    "schema scan hit {:#04X} at offset {} while looking for type {}",
                    marker,
                    start,
                    type_id
                );
                return Err(FxsdError::FrameCorruption {
                    expected: SCHEMA_ENTRY_START,
                    found: marker,
                    offset: start,
                });
            }

            let entry_id = TypeId::from_raw(reader.read_u16()?);
            if entry_id == type_id {
                return Ok(start);
            }

            reader.skip(2)?; // byte size
            let member_count = reader.read_u8()?;
            reader.skip(member_count as usize * 4)?;

            let footer_offset = reader.position();
            let footer = reader.read_u8()?;
            if footer != SCHEMA_ENTRY_END {
                return Err(FxsdError::FrameCorruption {
                    expected: SCHEMA_ENTRY_END,
                    found: footer,
                    offset: footer_offset,
                });
            }
        }

        Err(FxsdError::TypeNotFound(type_id))
    }

    /// Parse the single entry framed at `offset`
    fn read_entry(&self, offset: usize) -> Result<SchemaEntry> {
        let mut reader = ByteReader::at(self.section.as_bytes(), offset);

        let marker = reader.read_u8()?;
        if marker != SCHEMA_ENTRY_START {
            return Err(FxsdError::FrameCorruption {
                expected: SCHEMA_ENTRY_START,
                found: marker,
                offset,
            });
        }

        let type_id = TypeId::from_raw(reader.read_u16()?);
        let byte_size = reader.read_u16()?;
        let member_count = reader.read_u8()?;

        let mut members = Vec::with_capacity(member_count as usize);
        for _ in 0..member_count {
            let member_size = reader.read_u16()?;
            let member_id = TypeId::from_raw(reader.read_u16()?);
            members.push(MemberDescriptor {
                type_id: member_id,
                byte_size: member_size,
            });
        }

        let footer_offset = reader.position();
        let footer = reader.read_u8()?;
        if footer != SCHEMA_ENTRY_END {
            return Err(FxsdError::FrameCorruption {
                expected: SCHEMA_ENTRY_END,
                found: footer,
                offset: footer_offset,
            });
        }

        Ok(SchemaEntry {
            type_id,
            byte_size,
            members,
        })
    }

    /// Resolve the full schema tree for the entry at `offset`.
    ///
    /// Each member's own entry is found by id scan and recursed into.
    /// This is how a consumer holding only a type id (read from a data
    /// record) recovers the field layout needed to decode that record.
    pub fn read_schema_tree(&self, offset: usize) -> Result<SchemaTree> {
        let mut nodes = Vec::new();
        let root = self.resolve_node(offset, 0, &mut nodes)?;
        Ok(SchemaTree { nodes, root })
    }

    /// Convenience: resolve the tree for a type id
    pub fn read_schema_tree_for(&self, type_id: TypeId) -> Result<SchemaTree> {
        let offset = self.find_entry_offset(type_id)?;
        self.read_schema_tree(offset)
    }

    fn resolve_node(
        &self,
        offset: usize,
        depth: usize,
        nodes: &mut Vec<SchemaNode>,
    ) -> Result<usize> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(FxsdError::SchemaTooDeep {
                max: MAX_SCHEMA_DEPTH,
            });
        }

        let entry = self.read_entry(offset)?;

        let mut children = Vec::with_capacity(entry.members.len());
        for member in &entry.members {
            let member_offset = self.find_entry_offset(member.type_id)?;
            children.push(self.resolve_node(member_offset, depth + 1, nodes)?);
        }

        nodes.push(SchemaNode {
            type_id: entry.type_id,
            byte_size: entry.byte_size,
            children,
        });
        Ok(nodes.len() - 1)
    }

    /// Human-readable listing of every entry in the section.
    ///
    /// Diagnostic tooling only; safe on corrupt input (stops with the
    /// error instead of printing garbage).
    pub fn describe(&self) -> Result<String> {
        use std::fmt::Write;

        let mut out = String::new();
        let mut reader = ByteReader::new(self.section.as_bytes());
        let mut count = 0usize;

        while reader.remaining() > 0 {
            let offset = reader.position();
            let entry = self.read_entry(offset)?;

            writeln!(
                &mut out,
                "type {} ({} bytes, {} members)",
                entry.type_id,
                entry.byte_size,
                entry.members.len()
            )
            .ok();
            for member in &entry.members {
                writeln!(
                    &mut out,
                    "    member type {} ({} bytes)",
                    member.type_id, member.byte_size
                )
                .ok();
            }

            reader.skip(6 + entry.members.len() * 4 + 1)?;
            count += 1;
        }

        writeln!(&mut out, "{} entries", count).ok();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, size: u16) -> MemberDescriptor {
        MemberDescriptor {
            type_id: TypeId::derive(name),
            byte_size: size,
        }
    }

    #[test]
    fn test_entry_byte_layout() {
        let mut schema = SchemaSection::with_capacity(64);
        let id = TypeId::from_raw(0x0102);
        schema
            .write_entry(
                id,
                8,
                &[MemberDescriptor {
                    type_id: TypeId::from_raw(0x0A0B),
                    byte_size: 4,
                }],
            )
            .unwrap();

        assert_eq!(
            schema.as_bytes(),
            &[
                0xEF, // entry start
                0x01, 0x02, // type id
                0x00, 0x08, // byte size
                0x01, // member count
                0x00, 0x04, // member byte size
                0x0A, 0x0B, // member type id
                0xBE, // entry end
            ]
        );
    }

    #[test]
    fn test_write_entry_dedup() {
        let mut schema = SchemaSection::with_capacity(128);
        let id = TypeId::derive("DedupType");

        schema.write_entry(id, 4, &[member("i32", 4)]).unwrap();
        let len_after_first = schema.len();

        schema.write_entry(id, 4, &[member("i32", 4)]).unwrap();
        schema.write_entry(id, 4, &[member("i32", 4)]).unwrap();
        assert_eq!(schema.len(), len_after_first);
    }

    #[test]
    fn test_find_entry_offset() {
        let mut schema = SchemaSection::with_capacity(128);
        let first = TypeId::derive("First");
        let second = TypeId::derive("Second");

        schema.write_entry(first, 4, &[]).unwrap();
        schema.write_entry(second, 8, &[member("i32", 4)]).unwrap();

        assert_eq!(schema.find_entry_offset(first).unwrap(), 0);
        // Zero-member entry is 7 bytes
        assert_eq!(schema.find_entry_offset(second).unwrap(), 7);

        let missing = TypeId::derive("Missing");
        assert!(matches!(
            schema.find_entry_offset(missing),
            Err(FxsdError::TypeNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_scan_reports_corruption() {
        let mut schema = SchemaSection::with_capacity(64);
        // Garbage where an entry marker should be
        schema.load_bytes(&[0x00, 0x01, 0x02]).unwrap();

        let result = schema.find_entry_offset(TypeId::derive("Anything"));
        assert!(matches!(
            result,
            Err(FxsdError::FrameCorruption {
                expected: 0xEF,
                found: 0x00,
                offset: 0
            })
        ));
    }

    #[test]
    fn test_write_into_corrupt_section_refused() {
        let mut schema = SchemaSection::with_capacity(64);
        schema.load_bytes(&[0x00, 0x01, 0x02]).unwrap();

        // Corruption must not read as "type absent": appending after the
        // damage would produce an entry no scan can ever reach.
        assert!(matches!(
            schema.contains(TypeId::derive("Anything")),
            Err(FxsdError::FrameCorruption { .. })
        ));
        let result = schema.write_entry(TypeId::derive("Anything"), 4, &[]);
        assert!(matches!(result, Err(FxsdError::FrameCorruption { .. })));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_truncate_forgets_entries() {
        let mut schema = SchemaSection::with_capacity(128);
        let id = TypeId::derive("First");
        schema.write_entry(id, 4, &[]).unwrap();

        schema.truncate(0);
        assert_eq!(schema.len(), 0);
        assert!(!schema.contains(id).unwrap());

        // A rolled-back entry can be written again
        schema.write_entry(id, 4, &[]).unwrap();
        assert!(schema.contains(id).unwrap());
    }

    #[test]
    fn test_read_schema_tree_nested() {
        let mut schema = SchemaSection::with_capacity(256);
        let i32_id = TypeId::derive("i32");
        let inner = TypeId::derive("Inner");
        let outer = TypeId::derive("Outer");

        schema.write_entry(i32_id, 4, &[]).unwrap();
        schema
            .write_entry(
                inner,
                8,
                &[member("i32", 4), member("i32", 4)],
            )
            .unwrap();
        schema
            .write_entry(
                outer,
                12,
                &[
                    member("i32", 4),
                    MemberDescriptor {
                        type_id: inner,
                        byte_size: 8,
                    },
                ],
            )
            .unwrap();

        let tree = schema.read_schema_tree_for(outer).unwrap();
        let root = tree.root();
        assert_eq!(root.type_id, outer);
        assert_eq!(root.byte_size, 12);
        assert_eq!(root.children.len(), 2);

        let nested = tree.node(root.children[1]).unwrap();
        assert_eq!(nested.type_id, inner);
        assert_eq!(nested.byte_size, 8);
        assert_eq!(nested.children.len(), 2);
    }

    #[test]
    fn test_tree_member_offsets_survive_reload() {
        let mut schema = SchemaSection::with_capacity(256);
        let i32_id = TypeId::derive("i32");
        let holder = TypeId::derive("Holder");

        schema.write_entry(i32_id, 4, &[]).unwrap();
        schema
            .write_entry(holder, 4, &[member("i32", 4)])
            .unwrap();

        // Round the bytes through load_bytes (as Archive::load does) and
        // resolve again with no side table.
        let bytes = schema.as_bytes().to_vec();
        let mut reloaded = SchemaSection::with_capacity(256);
        reloaded.load_bytes(&bytes).unwrap();

        let tree = reloaded.read_schema_tree_for(holder).unwrap();
        assert_eq!(tree.root().type_id, holder);
        assert_eq!(tree.node(tree.root().children[0]).unwrap().type_id, i32_id);
    }

    #[test]
    fn test_describe_lists_entries() {
        let mut schema = SchemaSection::with_capacity(128);
        schema.write_entry(TypeId::derive("i32"), 4, &[]).unwrap();
        schema
            .write_entry(TypeId::derive("Pair"), 8, &[member("i32", 4), member("i32", 4)])
            .unwrap();

        let listing = schema.describe().unwrap();
        assert!(listing.contains("2 entries"));
        assert!(listing.contains("2 members"));
    }
}
