//! Filepath: src/store.rs
//!
//! The capability interface every candidate store is benchmarked through.
//!
//! The harness never looks inside a store. It calls [`Store::put`],
//! [`Store::get`], [`Store::delete`] and [`Store::hash_code`], plus the
//! hash-accelerated [`Store::get_hashed`] when a scenario supplies a
//! precomputed code. Each submodule adapts one concrete map to this trait.
//!
//! | Adapter | Backing map | Concurrency control |
//! |---------|-------------|---------------------|
//! | [`LockedStore`] | `std::collections::HashMap` | one `parking_lot::RwLock` |
//! | [`StripedStore`] | `std::collections::HashMap` per stripe | one `RwLock` per stripe |
//! | [`PapayaStore`] | `papaya::HashMap` | lock-free |
//! | [`SccStore`] | `scc::HashMap` | non-blocking reads, bucket locks |
//! | [`DashStore`] | `dashmap::DashMap` | sharded `RwLock`s |
//! | [`FrozenStore`] | `std::collections::HashMap` | none, read-only |

use std::fmt as StdFmt;
use std::time::Instant;

use crate::error::StoreError;
use crate::key::{Codec, Key};
use crate::population::KeyPopulation;

mod frozen;
mod locked;
mod lockfree;
mod nonblocking;
mod sharded;
mod striped;

pub use frozen::FrozenStore;
pub use locked::LockedStore;
pub use lockfree::PapayaStore;
pub use nonblocking::SccStore;
pub use sharded::DashStore;
pub use striped::StripedStore;

/// Value stored under each key. Every scenario stores the key's population index.
pub type Value = u64;

// ============================================================================
//  Store
// ============================================================================

/// A key-value store under test.
///
/// Implementations must be safe to call from many threads at once. The
/// harness only adds its own locking when a scenario asks for it.
pub trait Store: Send + Sync {
    /// Short, stable name used in reports.
    fn name(&self) -> &'static str;

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    ///
    /// Whatever the store reports. The harness treats any error as fatal.
    fn put(&self, key: Key, value: Value) -> Result<(), StoreError>;

    /// Look up `key`. An absent key is `None`, never an error.
    fn get(&self, key: &Key) -> Option<Value>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Whatever the store reports. The harness treats any error as fatal.
    fn delete(&self, key: &Key) -> Result<(), StoreError>;

    /// The hash code this store uses for `key`.
    ///
    /// Must be a pure function of the key bytes so callers can compute it
    /// once, outside the store, and pass it to [`Store::get_hashed`].
    fn hash_code(&self, key: &Key) -> u32;

    /// Look up `key` whose hash code was computed ahead of time.
    ///
    /// `hash` must equal `self.hash_code(key)`. Stores that cannot use the
    /// code fall back to [`Store::get`].
    #[inline]
    fn get_hashed(&self, key: &Key, hash: u32) -> Option<Value> {
        let _ = hash;
        self.get(key)
    }

    /// Number of keys currently stored.
    fn len(&self) -> usize;

    /// Whether the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insert `keys[i] -> i` for every key in `population`.
///
/// Runs before any timed region.
///
/// # Errors
///
/// The first error returned by [`Store::put`].
pub fn prepopulate<S: Store + ?Sized>(
    store: &S,
    population: &KeyPopulation,
) -> Result<(), StoreError> {
    let start = Instant::now();
    for (i, key) in population.iter().enumerate() {
        store.put(*key, i as Value)?;
    }

    tracing::debug!(
        store = store.name(),
        keys = population.len(),
        elapsed = ?start.elapsed(),
        "prepopulated store"
    );
    Ok(())
}

// ============================================================================
//  StoreKind
// ============================================================================

/// Selector for the candidate stores shipped with the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum StoreKind {
    /// Unsynchronized built-in map, read-only baseline.
    Frozen,
    /// `papaya::HashMap`.
    Papaya,
    /// `scc::HashMap`.
    Scc,
    /// Built-in map behind one reader-writer lock.
    Locked,
    /// Built-in maps behind per-stripe reader-writer locks.
    Striped,
    /// `dashmap::DashMap`.
    Dashmap,
}

impl StoreKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 6] = [
        Self::Frozen,
        Self::Papaya,
        Self::Scc,
        Self::Locked,
        Self::Striped,
        Self::Dashmap,
    ];

    /// Name of the store this kind builds.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frozen => frozen::NAME,
            Self::Papaya => lockfree::NAME,
            Self::Scc => nonblocking::NAME,
            Self::Locked => locked::NAME,
            Self::Striped => striped::NAME,
            Self::Dashmap => sharded::NAME,
        }
    }

    /// Whether the store accepts writes.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Frozen)
    }

    /// Build an empty store.
    ///
    /// An empty [`FrozenStore`] stays empty: it cannot be written.
    #[must_use]
    pub fn empty(self, codec: Codec) -> Box<dyn Store> {
        match self {
            Self::Frozen => Box::new(FrozenStore::empty(codec)),
            Self::Papaya => Box::new(PapayaStore::new(codec)),
            Self::Scc => Box::new(SccStore::new(codec)),
            Self::Locked => Box::new(LockedStore::new(codec)),
            Self::Striped => Box::new(StripedStore::new(codec)),
            Self::Dashmap => Box::new(DashStore::new(codec)),
        }
    }

    /// Build a store holding `keys[i] -> i` for the whole population.
    ///
    /// # Errors
    ///
    /// The first error returned while prepopulating.
    pub fn populated(
        self,
        codec: Codec,
        population: &KeyPopulation,
    ) -> Result<Box<dyn Store>, StoreError> {
        if let Self::Frozen = self {
            return Ok(Box::new(FrozenStore::from_population(codec, population)));
        }

        let store = self.empty(codec);
        prepopulate(&*store, population)?;
        Ok(store)
    }
}

impl StdFmt::Display for StoreKind {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.write_str(self.name())
    }
}
