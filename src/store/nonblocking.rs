//! Adapter for `scc::HashMap`.

use scc::HashMap as SccMap;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, Key};

pub(super) const NAME: &str = "scc";

/// Store backed by [`scc::HashMap`]: reads never block, writers lock a
/// single bucket.
pub struct SccStore {
    codec: Codec,
    map: SccMap<Key, Value, CodecBuildHasher>,
}

impl SccStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            map: SccMap::with_hasher(codec.build_hasher()),
        }
    }
}

impl Store for SccStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        let _ = self.map.upsert_sync(key, value);
        Ok(())
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.map.read_sync(key, |_, v| *v)
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        let _ = self.map.remove_sync(key);
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
