//! Built-in hash map behind a single reader-writer lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, Key};

pub(super) const NAME: &str = "locked";

/// `HashMap` guarded by one [`parking_lot::RwLock`].
///
/// Readers share the lock, writers take it exclusively. This is the
/// lock-protected baseline the lock-free stores are compared against.
#[derive(Debug)]
pub struct LockedStore {
    codec: Codec,
    map: RwLock<HashMap<Key, Value, CodecBuildHasher>>,
}

impl LockedStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self::with_capacity(codec, 0)
    }

    /// Create an empty store with room for `capacity` keys.
    #[must_use]
    pub fn with_capacity(codec: Codec, capacity: usize) -> Self {
        Self {
            codec,
            map: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                codec.build_hasher(),
            )),
        }
    }
}

impl Store for LockedStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        self.map.write().insert(key, value);
        Ok(())
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.map.read().get(key).copied()
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        self.map.write().remove(key);
        Ok(())
    }

    #[inline]
    fn hash_code(&self, key: &Key) -> u32 {
        self.codec.hash_code(key)
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}
