//! Filepath: src/population.rs
//!
//! The fixed key population shared by every worker.
//!
//! A [`KeyPopulation`] is generated once per run and never mutated. Clones
//! share the same `Arc<[Key]>`, so handing the population to each worker
//! copies a pointer, not the keys. The same holds for the precomputed
//! [`HashTable`].
//!
//! Workers map their unbounded iteration counter onto the population through
//! a [`Wrapper`], a bitmask that is only ever constructed from (or validated
//! against) the population it indexes.

use std::ops::Deref;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::ConfigError;
use crate::key::{Codec, Key};

/// Below this size keys are generated on the calling thread.
const PARALLEL_THRESHOLD: usize = 1 << 14;

// ============================================================================
//  KeyPopulation
// ============================================================================

/// Ordered keys `encode(0) .. encode(n - 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPopulation {
    keys: Arc<[Key]>,
}

impl KeyPopulation {
    /// Generate the population for the integer range `[0, n)`.
    ///
    /// Index `i` holds [`Key::encode(i)`](Key::encode). Large populations are
    /// built on the rayon pool; the indexed collect keeps them in order.
    #[must_use]
    pub fn generate(n: u32) -> Self {
        let len = n as usize;
        let keys: Vec<Key> = if len < PARALLEL_THRESHOLD {
            (0..u64::from(n)).map(Key::encode).collect()
        } else {
            (0..n)
                .into_par_iter()
                .map(|i| Key::encode(u64::from(i)))
                .collect()
        };

        tracing::debug!(len, "generated key population");
        Self { keys: keys.into() }
    }

    /// Generate a population of `2^bits` keys.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PopulationTooLarge`] if `2^bits` does not fit in a `u32`.
    pub fn with_bits(bits: u32) -> Result<Self, ConfigError> {
        let n = 1u32
            .checked_shl(bits)
            .ok_or(ConfigError::PopulationTooLarge { bits })?;
        Ok(Self::generate(n))
    }

    /// Number of keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the population has no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The key at `index`, if in range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    /// All keys in index order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Derive the wrapper mask `len - 1`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyPopulation`] or [`ConfigError::NotPowerOfTwo`].
    pub fn wrapper(&self) -> Result<Wrapper, ConfigError> {
        Wrapper::for_len(self.len())
    }

    /// Precompute the hash code of every key with `codec`.
    #[must_use]
    pub fn hash_table(&self, codec: Codec) -> HashTable {
        self.hash_table_with(|key| codec.hash_code(key))
    }

    /// Precompute `hash(key)` for every key, typically a store's
    /// [`hash_code`](crate::Store::hash_code).
    #[must_use]
    pub fn hash_table_with<F>(&self, hash: F) -> HashTable
    where
        F: Fn(&Key) -> u32 + Sync,
    {
        let codes: Vec<u32> = if self.len() < PARALLEL_THRESHOLD {
            self.keys.iter().map(&hash).collect()
        } else {
            self.keys.par_iter().map(&hash).collect()
        };

        HashTable {
            codes: codes.into(),
        }
    }
}

impl Deref for KeyPopulation {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.keys
    }
}

// ============================================================================
//  HashTable
// ============================================================================

/// Hash codes of a population, index-aligned with its keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashTable {
    codes: Arc<[u32]>,
}

impl HashTable {
    /// The code at `index`, if in range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.codes.get(index).copied()
    }

    /// Number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ============================================================================
//  Wrapper
// ============================================================================

/// Bitmask mapping an iteration counter onto a power-of-two population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wrapper {
    mask: usize,
}

impl Wrapper {
    /// Build the mask for a population of `len` keys.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyPopulation`] when `len == 0`,
    /// [`ConfigError::NotPowerOfTwo`] otherwise if `len` is not a power of two.
    pub fn for_len(len: usize) -> Result<Self, ConfigError> {
        if len == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !len.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { len });
        }
        Ok(Self { mask: len - 1 })
    }

    /// Validate an explicitly chosen `mask` against a population of `len` keys.
    ///
    /// # Errors
    ///
    /// Any error of [`Wrapper::for_len`], or [`ConfigError::WrapperMismatch`]
    /// when `mask != len - 1`.
    pub fn checked(mask: usize, len: usize) -> Result<Self, ConfigError> {
        match Self::for_len(len) {
            Ok(wrapper) if wrapper.mask == mask => Ok(wrapper),
            Ok(_) => Err(ConfigError::WrapperMismatch { mask, len }),
            Err(e) => Err(e),
        }
    }

    /// The raw mask.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> usize {
        self.mask
    }

    /// Population size covered by the mask.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.mask + 1
    }

    /// `(iteration + offset) & mask`.
    #[inline]
    #[must_use]
    pub const fn index(self, iteration: usize, offset: usize) -> usize {
        iteration.wrapping_add(offset) & self.mask
    }
}
