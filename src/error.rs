//! FXSD error types

use crate::registry::TypeId;

/// Error type for archive encode/decode and persistence.
#[derive(Debug, thiserror::Error)]
pub enum FxsdError {
    /// File or section signature did not match
    #[error("invalid {section} signature (expected {expected:?}, found {found:?})")]
    Format {
        section: &'static str,
        expected: [u8; 4],
        found: [u8; 4],
    },

    /// Unexpected marker byte where a frame header or footer was expected
    #[error("frame corruption at offset {offset}: expected marker {expected:#04X}, found {found:#04X}")]
    FrameCorruption {
        expected: u8,
        found: u8,
        offset: usize,
    },

    /// Stored name hash differs from the non-zero hash requested on read
    #[error("name hash mismatch (requested {requested:#010X}, stored {stored:#010X})")]
    NameMismatch { requested: u32, stored: u32 },

    /// Read or write would exceed a section buffer's capacity
    #[error("section capacity exceeded (needed {needed} bytes, capacity {capacity})")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// No schema entry exists for the requested type id
    #[error("type id {0} not found in schema section")]
    TypeNotFound(TypeId),

    /// Record's stored type id differs from the destination type's id
    #[error("type id mismatch (destination {expected}, record {found})")]
    TypeMismatch { expected: TypeId, found: TypeId },

    /// Two distinct type names derived the same type id
    #[error("type id {id} collision between \"{existing}\" and \"{new}\"")]
    TypeIdCollision {
        id: TypeId,
        existing: &'static str,
        new: &'static str,
    },

    /// A loaded section's length exceeds the destination buffer's capacity
    #[error("{section} section too large ({len} bytes, capacity {capacity})")]
    SectionTooLarge {
        section: &'static str,
        len: usize,
        capacity: usize,
    },

    /// Schema tree resolution exceeded the maximum nesting depth
    #[error("schema tree deeper than {max} levels (corrupt section?)")]
    SchemaTooDeep { max: usize },

    /// An aggregate declared more members than a schema entry can hold
    #[error("aggregate has {count} members (maximum 255)")]
    TooManyMembers { count: usize },

    /// IO error during persist/load
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FxsdError::FrameCorruption {
            expected: 0xEF,
            found: 0x00,
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "frame corruption at offset 12: expected marker 0xEF, found 0x00"
        );

        let err = FxsdError::CapacityExceeded {
            needed: 32,
            capacity: 16,
        };
        assert_eq!(
            err.to_string(),
            "section capacity exceeded (needed 32 bytes, capacity 16)"
        );
    }
}
