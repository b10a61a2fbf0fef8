//! FNV-1a name hashing
//!
//! Records carry a caller-chosen 32-bit discriminator so a read can verify
//! it is consuming the record it asked for. The core only ever compares the
//! value, so any 32-bit hash works; this module provides the default FNV-1a.
//!
//! Algorithm reference:
//! <http://www.isthe.com/chongo/tech/comp/fnv/index.html#FNV-param>

/// 32-bit record name discriminator (zero disables name checks on read)
pub type NameHash = u32;

const FNV1A_SEED: u32 = 0x811C_9DC5;
const FNV1A_PRIME: u32 = 0x0100_0193;

/// Hash a record name with FNV-1a.
///
/// Usable in const context so archive call sites can hash names at
/// compile time.
pub const fn hash_name(name: &str) -> NameHash {
    let bytes = name.as_bytes();
    let mut hash = FNV1A_SEED;

    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV1A_PRIME);
        i += 1;
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        // Published FNV-1a 32-bit test vectors
        assert_eq!(hash_name(""), 0x811C_9DC5);
        assert_eq!(hash_name("a"), 0xE40C_292C);
        assert_eq!(hash_name("foobar"), 0xBF9C_F968);
    }

    #[test]
    fn test_const_evaluation() {
        const HASH: NameHash = hash_name("Example");
        assert_eq!(HASH, hash_name("Example"));
        assert_ne!(HASH, 0);
    }

    #[test]
    fn test_distinct_names_differ() {
        assert_ne!(hash_name("PlayerState"), hash_name("WorldState"));
    }
}
