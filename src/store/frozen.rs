//! Built-in hash map read without any synchronization.
//!
//! The unsynchronized baseline: concurrent readers go straight to a plain
//! `HashMap`. Shared reads of an immutable map are sound, so the map is
//! built from the population up front and every write is refused. Racing
//! writers against unsynchronized readers is not something this store can
//! express.

use std::collections::HashMap;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, Key};
use crate::population::KeyPopulation;

pub(super) const NAME: &str = "frozen";

/// Read-only `HashMap` shared without locks.
#[derive(Debug)]
pub struct FrozenStore {
    codec: Codec,
    map: HashMap<Key, Value, CodecBuildHasher>,
}

impl FrozenStore {
    /// An empty store. It stays empty.
    #[must_use]
    pub fn empty(codec: Codec) -> Self {
        Self {
            codec,
            map: HashMap::with_hasher(codec.build_hasher()),
        }
    }

    /// Build the store holding `keys[i] -> i` for the whole population.
    #[must_use]
    pub fn from_population(codec: Codec, population: &KeyPopulation) -> Self {
        let mut map = HashMap::with_capacity_and_hasher(population.len(), codec.build_hasher());
        map.extend(
            population
                .iter()
                .enumerate()
                .map(|(i, key)| (*key, i as Value)),
        );
        Self { codec, map }
    }
}

impl Store for FrozenStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, _key: Key, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly { store: NAME })
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.map.get(key).copied()
    }

    fn delete(&self, _key: &Key) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly { store: NAME })
    }

    #[inline]
    fn hash_code(&self, key: &Key) -> u32 {
        self.codec.hash_code(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
