//! Built-in hash maps split across independently locked stripes.
//!
//! The stripe is chosen from the key's hash code, which makes this the store
//! where [`Store::get_hashed`] pays off: a caller holding a precomputed code
//! picks the stripe without hashing the key again.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Store, Value};
use crate::error::StoreError;
use crate::key::{Codec, CodecBuildHasher, CodecHasher, Key};

pub(super) const NAME: &str = "striped";

/// Stripe count used by [`StripedStore::new`].
pub const DEFAULT_STRIPES: usize = 64;

type Stripe = RwLock<HashMap<Key, Value, CodecBuildHasher>>;

/// `HashMap` stripes, each behind its own [`parking_lot::RwLock`].
#[derive(Debug)]
pub struct StripedStore {
    codec: Codec,
    stripes: Box<[Stripe]>,
    mask: usize,
}

impl StripedStore {
    /// Create an empty store with [`DEFAULT_STRIPES`] stripes.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self::with_stripes(codec, DEFAULT_STRIPES)
    }

    /// Create an empty store with `stripes` rounded up to a power of two.
    #[must_use]
    pub fn with_stripes(codec: Codec, stripes: usize) -> Self {
        let count = stripes.max(1).next_power_of_two();
        let stripes = (0..count)
            .map(|_| RwLock::new(HashMap::with_hasher(codec.build_hasher())))
            .collect();

        Self {
            codec,
            stripes,
            mask: count - 1,
        }
    }

    /// Number of stripes.
    #[must_use]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    // Middle bits of the spread code. The low bits pick the bucket inside a
    // stripe's table and the top bits feed its control bytes.
    #[inline]
    #[expect(clippy::cast_possible_truncation, clippy::indexing_slicing)]
    fn stripe(&self, hash: u32) -> &Stripe {
        // `mask` is `stripes.len() - 1`, so the index is always in range.
        let index = (CodecHasher::spread(hash) >> 32) as usize & self.mask;
        &self.stripes[index]
    }
}

impl Store for StripedStore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn put(&self, key: Key, value: Value) -> Result<(), StoreError> {
        self.stripe(self.hash_code(&key)).write().insert(key, value);
        Ok(())
    }

    #[inline]
    fn get(&self, key: &Key) -> Option<Value> {
        self.get_hashed(key, self.hash_code(key))
    }

    #[inline]
    fn get_hashed(&self, key: &Key, hash: u32) -> Option<Value> {
        self.stripe(hash).read().get(key).copied()
    }

    fn delete(&self, key: &Key) -> Result<(), StoreError> {
        self.stripe(self.hash_code(key)).write().remove(key);
        Ok(())
    }

    #[inline]
    fn hash_code(&self, key: &Key) -> u32 {
        self.codec.hash_code(key)
    }

    fn len(&self) -> usize {
        self.stripes.iter().map(|stripe| stripe.read().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_count_rounds_up() {
        assert_eq!(StripedStore::with_stripes(Codec::Fold, 0).stripe_count(), 1);
        assert_eq!(StripedStore::with_stripes(Codec::Fold, 5).stripe_count(), 8);
        assert_eq!(StripedStore::new(Codec::Fold).stripe_count(), DEFAULT_STRIPES);
    }

    #[test]
    fn test_sequential_keys_use_every_stripe() {
        let store = StripedStore::with_stripes(Codec::Fold, 8);
        for i in 0..1024 {
            store.put(Key::encode(i), i).unwrap();
        }
        assert!(store.stripes.iter().all(|stripe| !stripe.read().is_empty()));
        assert_eq!(store.len(), 1024);
    }

    #[test]
    fn test_get_hashed_with_precomputed_code() {
        let store = StripedStore::new(Codec::Crc32);
        let key = Key::encode(31);
        store.put(key, 7).unwrap();
        let code = Codec::Crc32.hash_code(&key);
        assert_eq!(store.get_hashed(&key, code), Some(7));
    }
}
