//! Adapter for `dashmap::DashMap`.

use dashmap::DashMap;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, Key};

pub(super) const NAME: &str = "dashmap";

/// Store backed by [`DashMap`], a map split into `RwLock`-guarded shards.
pub struct DashStore {
    codec: Codec,
    map: DashMap<Key, Value, CodecBuildHasher>,
}

impl DashStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            map: DashMap::with_hasher(codec.build_hasher()),
        }
    }
}

impl Store for DashStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        self.map.insert(key, value);
        Ok(())
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.map.get(key).map(|entry| *entry.value())
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        self.map.remove(key);
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
