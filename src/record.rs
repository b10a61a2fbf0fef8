//! Record trait and value-level serialize/deserialize dispatch
//!
//! Serializable aggregates implement [`Record`], exposing a stable type
//! name and their fields as an ordered list. The dispatcher walks that
//! list, encoding primitives inline and recursing into nested aggregates.
//! The declared order is the contract: the reader issues the same typed
//! reads, in the same order, the writer issued, or every later read in
//! the section desynchronizes.

use crate::data::DataSection;
use crate::error::FxsdError;
use crate::hash::NameHash;
use crate::registry::{self, TypeId};
use crate::schema::{MemberDescriptor, SchemaSection};
use crate::Result;

/// Wire type names of the supported primitives
const NAME_I32: &str = "i32";
const NAME_F32: &str = "f32";
const NAME_BOOL: &str = "bool";
const NAME_TEXT: &str = "text";

/// Shared view of one field, in declared order
pub enum FieldRef<'a> {
    I32(&'a i32),
    F32(&'a f32),
    Bool(&'a bool),
    Text(&'a str),
    Nested(&'a dyn Record),
}

/// Mutable view of one field, in declared order
pub enum FieldMut<'a> {
    I32(&'a mut i32),
    F32(&'a mut f32),
    Bool(&'a mut bool),
    Text(&'a mut String),
    Nested(&'a mut dyn Record),
}

/// Field enumeration contract for serializable aggregates.
///
/// `fields` and `fields_mut` must enumerate the same fields in the same
/// order; `type_name` must be stable across builds and processes since
/// the wire type id is derived from it.
pub trait Record {
    /// Stable declared name of this type
    fn type_name(&self) -> &'static str;

    /// Ordered field views for writing
    fn fields(&self) -> Vec<FieldRef<'_>>;

    /// Ordered field views for reading into
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;
}

impl FieldRef<'_> {
    /// Declared byte size of this field as recorded in schema entries.
    ///
    /// Text is variable-length on the wire; its declared size is the u16
    /// length prefix. Nested aggregates report the sum of their own
    /// fields.
    fn byte_size(&self) -> u16 {
        match self {
            FieldRef::I32(_) | FieldRef::F32(_) => 4,
            FieldRef::Bool(_) => 1,
            FieldRef::Text(_) => 2,
            FieldRef::Nested(record) => byte_size_of(*record),
        }
    }
}

/// Declared byte size of an aggregate: sum of its members' declared sizes
pub(crate) fn byte_size_of(record: &dyn Record) -> u16 {
    record
        .fields()
        .iter()
        .map(|field| field.byte_size())
        .fold(0u16, u16::saturating_add)
}

/// Ensure the full schema tree for `record` is registered, nested member
/// types first (pre-order, depth-first), skipping already-present entries.
/// Returns the record's type id.
pub(crate) fn register_schema(record: &dyn Record, schema: &mut SchemaSection) -> Result<TypeId> {
    let type_id = registry::get_or_assign(record.type_name())?;
    if schema.contains(type_id)? {
        return Ok(type_id);
    }

    let fields = record.fields();
    let mut members = Vec::with_capacity(fields.len());

    for field in &fields {
        let member_id = match field {
            FieldRef::Nested(nested) => register_schema(*nested, schema)?,
            primitive => {
                let name = match primitive {
                    FieldRef::I32(_) => NAME_I32,
                    FieldRef::F32(_) => NAME_F32,
                    FieldRef::Bool(_) => NAME_BOOL,
                    FieldRef::Text(_) => NAME_TEXT,
                    FieldRef::Nested(_) => unreachable!(),
                };
                let id = registry::get_or_assign(name)?;
                schema.write_entry(id, primitive.byte_size(), &[])?;
                id
            }
        };
        members.push(MemberDescriptor {
            type_id: member_id,
            byte_size: field.byte_size(),
        });
    }

    schema.write_entry(type_id, byte_size_of(record), &members)?;
    Ok(type_id)
}

/// Write one framed record: schema registration, header, fields in
/// declared order, footer. Nested aggregates are written inline without
/// their own framing.
///
/// A failure mid-write rolls both sections back to their pre-call
/// lengths; a partial frame is never left behind to desynchronize later
/// reads.
pub(crate) fn write_record(
    record: &dyn Record,
    name_hash: NameHash,
    schema: &mut SchemaSection,
    data: &mut DataSection,
) -> Result<()> {
    let schema_mark = schema.len();
    let data_mark = data.len();

    let result = write_record_inner(record, name_hash, schema, data);
    if result.is_err() {
        schema.truncate(schema_mark);
        data.truncate(data_mark);
    }
    result
}

fn write_record_inner(
    record: &dyn Record,
    name_hash: NameHash,
    schema: &mut SchemaSection,
    data: &mut DataSection,
) -> Result<()> {
    let type_id = register_schema(record, schema)?;

    data.write_record_header(type_id, name_hash)?;
    write_fields(record, data)?;
    data.write_record_footer()
}

fn write_fields(record: &dyn Record, data: &mut DataSection) -> Result<()> {
    for field in record.fields() {
        match field {
            FieldRef::I32(value) => data.write_i32(*value)?,
            FieldRef::F32(value) => data.write_f32(*value)?,
            FieldRef::Bool(value) => data.write_bool(*value)?,
            FieldRef::Text(value) => data.write_text(value)?,
            FieldRef::Nested(nested) => write_fields(nested, data)?,
        }
    }
    Ok(())
}

/// Read one framed record into `dest`, mirroring the write order exactly.
///
/// Fails before touching any field if the header marker is wrong, the
/// stored type id differs from the destination's, or a non-zero
/// `name_hash` differs from the stored hash (zero disables that check).
/// On those validation failures the read cursor is restored to the start
/// of the frame so the same record can be retried.
pub(crate) fn read_record(
    dest: &mut dyn Record,
    name_hash: NameHash,
    data: &mut DataSection,
) -> Result<()> {
    let frame_start = data.position();
    let header = data.read_record_header()?;

    let expected_id = registry::get_or_assign(dest.type_name())?;
    if header.type_id != expected_id {
        data.seek(frame_start);
        return Err(FxsdError::TypeMismatch {
            expected: expected_id,
            found: header.type_id,
        });
    }

    if name_hash != 0 && header.name_hash != name_hash {
        data.seek(frame_start);
        return Err(FxsdError::NameMismatch {
            requested: name_hash,
            stored: header.name_hash,
        });
    }

    read_fields(dest, data)?;
    data.read_record_footer()
}

fn read_fields(dest: &mut dyn Record, data: &mut DataSection) -> Result<()> {
    for field in dest.fields_mut() {
        match field {
            FieldMut::I32(value) => *value = data.read_i32()?,
            FieldMut::F32(value) => *value = data.read_f32()?,
            FieldMut::Bool(value) => *value = data.read_bool()?,
            FieldMut::Text(value) => *value = data.read_text()?,
            FieldMut::Nested(nested) => read_fields(nested, data)?,
        }
    }
    Ok(())
}
