//! Adapter for `papaya::HashMap`, a lock-free hash table.

use papaya::HashMap as PapayaMap;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, Key};

pub(super) const NAME: &str = "papaya";

/// Lock-free store backed by [`papaya::HashMap`].
///
/// Every call pins the map for its own duration; papaya guards are cheap
/// and thread-local.
pub struct PapayaStore {
    codec: Codec,
    map: PapayaMap<Key, Value, CodecBuildHasher>,
}

impl PapayaStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            map: PapayaMap::with_hasher(codec.build_hasher()),
        }
    }
}

impl Store for PapayaStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        self.map.pin().insert(key, value);
        Ok(())
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.map.pin().get(key).copied()
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        self.map.pin().remove(key);
        Ok(())
    }

    #[inline]
    fn hash_code(&self, key: &Key) -> u32 {
        self.codec.hash_code(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
