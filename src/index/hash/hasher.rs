use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// The hash capability consumed by the extendible hash table.
///
/// The table only ever looks at the low `global_depth` bits of the result,
/// so implementations should mix key bits into the low end of the word.
pub trait KeyHasher<K>: Send + Sync {
    fn hash_key(&self, key: &K) -> u32;
}

/// Hashes with the standard library's SipHash hasher, downcast to the 32 bits
/// extendible hashing works in.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyHasher;

impl<K: Hash> KeyHasher<K> for DefaultKeyHasher {
    fn hash_key(&self, key: &K) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as u32
    }
}
