//! Type identity registry
//!
//! Every serializable type is identified on the wire by a small integer id.
//! Ids are derived deterministically from the type's declared name (FNV-1a
//! xor-folded to 16 bits), so a writer and a reader agree on what an id
//! means regardless of the order in which each process first touches the
//! type. Id 0 is reserved.
//!
//! The process-wide registry exists for bookkeeping: it remembers which
//! name produced each id and rejects a second, different name folding to
//! the same id. Registration is serialized behind a mutex; the table is
//! append-only and lives for the whole process.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use hashbrown::HashMap;

use crate::Result;
use crate::error::FxsdError;
use crate::hash::hash_name;

/// Wire identity of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u16);

impl TypeId {
    /// Reserved id, never assigned to a type
    pub const RESERVED: TypeId = TypeId(0);

    /// Derive the id for a type name.
    ///
    /// FNV-1a over the name, folded to 16 bits; a fold of zero is remapped
    /// so the reserved id is never produced.
    pub const fn derive(name: &str) -> TypeId {
        let hash = hash_name(name);
        let folded = ((hash >> 16) ^ (hash & 0xFFFF)) as u16;
        match folded {
            0 => TypeId(0xFFFF),
            id => TypeId(id),
        }
    }

    /// Reconstruct a type id from its wire encoding
    pub const fn from_raw(raw: u16) -> TypeId {
        TypeId(raw)
    }

    /// Wire encoding of this id
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name that produced each assigned id, for collision detection
struct TypeRegistry {
    names: HashMap<TypeId, &'static str>,
}

static REGISTRY: OnceLock<Mutex<TypeRegistry>> = OnceLock::new();

fn registry() -> &'static Mutex<TypeRegistry> {
    REGISTRY.get_or_init(|| {
        Mutex::new(TypeRegistry {
            names: HashMap::new(),
        })
    })
}

/// Return the id for `name`, registering it on first use.
///
/// Fails with [`FxsdError::TypeIdCollision`] if a different name already
/// owns the derived id.
pub fn get_or_assign(name: &'static str) -> Result<TypeId> {
    let id = TypeId::derive(name);

    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());
    match reg.names.get(&id) {
        Some(&existing) if existing != name => Err(FxsdError::TypeIdCollision {
            id,
            existing,
            new: name,
        }),
        Some(_) => Ok(id),
        None => {
            log::trace!("registered type \"{}\" as id {}", name, id);
            reg.names.insert(id, name);
            Ok(id)
        }
    }
}
