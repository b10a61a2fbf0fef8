//! FXSD ("FoXtrot Serialized Data") self-describing binary archive format.
//!
//! Persists typed structured records into a single archive that carries both
//! a schema description and the encoded field values, so the schema tree and
//! the values can be reconstructed later without external metadata. Built for
//! compact application state (game saves, engine snapshots) with nested
//! aggregate support and optional name-based record discrimination.
//!
//! An archive holds two sections. The schema section stores one entry per
//! distinct type (primitives included), the data section stores one framed
//! entry per serialized record. Nested aggregates are written inline inside
//! their parent record; only the outermost record carries header/footer
//! framing.
//!
//! # File Layout
//!
//! All multi-byte integers are big-endian.
//!
//! ```text
//! ┌──────────── File Header ─────────────────────────────────────┐
//! │ "FXSD"      u8[4]   file signature, start of schema section  │
//! │ 0000 0000   u32     length of schema section in bytes        │
//! ├──────────── Schema Entry (one per type) ─────────────────────┤
//! │ EF          u8      entry start                              │
//! │ 0000        u16     type id                                  │
//! │ 0000        u16     size of type in bytes                    │
//! │ 00          u8      member count (0 for primitives)          │
//! │ 0000        u16     member byte size   ┐ repeated            │
//! │ 0000        u16     member type id     ┘ member count times  │
//! │ BE          u8      entry end                                │
//! ├──────────── Data Section Header ─────────────────────────────┤
//! │ ".DAT"      u8[4]   data section signature                   │
//! │ 0000 0000   u32     length of data section in bytes          │
//! ├──────────── Record (one per serialized value) ───────────────┤
//! │ 0B          u8      record start                             │
//! │ 0000        u16     type id                                  │
//! │ 0000 0000   u32     name hash (checks disabled if zero)      │
//! │ ...                 field data, declared order, undelimited  │
//! │ B0          u8      record end                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field data carries no per-field framing: the reader must issue exactly
//! the same sequence of typed reads, in exactly the same order, that the
//! writer used for that type. The schema section exists so a consumer
//! holding only a type id can recover that layout.
//!
//! # Usage
//!
//! ```ignore
//! use fxsd::{Archive, FieldMut, FieldRef, Record, hash_name};
//!
//! struct Player { health: i32, stamina: f32 }
//!
//! impl Record for Player {
//!     fn type_name(&self) -> &'static str { "Player" }
//!     fn fields(&self) -> Vec<FieldRef<'_>> {
//!         vec![FieldRef::I32(&self.health), FieldRef::F32(&self.stamina)]
//!     }
//!     fn fields_mut(&mut self) -> Vec<FieldMut<'_>> {
//!         vec![FieldMut::I32(&mut self.health), FieldMut::F32(&mut self.stamina)]
//!     }
//! }
//!
//! let mut archive = Archive::new();
//! let player = Player { health: 100, stamina: 0.5 };
//! archive.write_record(&player, hash_name("Player1"))?;
//! archive.persist("save.fxsd")?;
//! ```

mod archive;
mod data;
mod error;
mod hash;
mod record;
mod registry;
mod schema;
mod section;

pub use archive::Archive;
pub use data::{DataSection, RecordHeader};
pub use error::FxsdError;
pub use hash::{NameHash, hash_name};
pub use record::{FieldMut, FieldRef, Record};
pub use registry::TypeId;
pub use schema::{MemberDescriptor, SchemaNode, SchemaSection, SchemaTree};
pub use section::Section;

// =============================================================================
// Format Constants
// =============================================================================

/// Archive file signature ("FoXtrot Serialized Data")
pub const FILE_SIGNATURE: &[u8; 4] = b"FXSD";

/// Data section signature
pub const DATA_SIGNATURE: &[u8; 4] = b".DAT";

/// Schema entry start marker
pub const SCHEMA_ENTRY_START: u8 = 0xEF;

/// Schema entry end marker
pub const SCHEMA_ENTRY_END: u8 = 0xBE;

/// Record frame start marker
pub const RECORD_START: u8 = 0x0B;

/// Record frame end marker
pub const RECORD_END: u8 = 0xB0;

/// Default capacity of each section buffer in bytes
pub const DEFAULT_SECTION_CAPACITY: usize = 10_000;

/// Maximum nesting depth accepted when resolving a schema tree
///
/// The format does not permit recursive types, so any chain deeper than
/// this indicates a corrupt or adversarial schema section.
pub const MAX_SCHEMA_DEPTH: usize = 64;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FxsdError>;
