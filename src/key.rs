//! Filepath: src/key.rs
//!
//! Fixed-width keys and the codecs that produce them.
//!
//! A [`Key`] is a 16-byte value wrapping a `u64`: the integer is written
//! little-endian into the first [`IKEY_SIZE`] bytes and the remaining bytes
//! are zero padding. Stores compare keys byte-wise, so the padding takes part
//! in equality but never carries meaning.
//!
//! [`Codec`] turns a key into a 32-bit hash code. Two variants exist and they
//! are not expected to agree with each other, only to be stable within a run.

use std::fmt as StdFmt;
use std::hash::{BuildHasher, Hash, Hasher};

/// Total key width in bytes.
pub const KEY_SIZE: usize = 16;

/// Number of leading key bytes that carry the encoded integer.
pub const IKEY_SIZE: usize = 8;

/// Multiplier used to spread a 32-bit code across a 64-bit table hash.
///
/// Hash tables such as `hashbrown` take their control bits from the top of
/// the hash, which a bare 32-bit code leaves at zero.
const SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

/// A fixed-width benchmark key.
///
/// # Example
///
/// ```rust
/// use mapbench::key::Key;
///
/// let key = Key::encode(42);
/// assert_eq!(key.decode(), 42);
/// assert_eq!(&key.as_bytes()[8..], &[0u8; 8]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Encode `value` into a fresh key.
    #[inline]
    #[must_use]
    pub fn encode(value: u64) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        bytes[..IKEY_SIZE].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// Encode `value` into a caller-owned scratch buffer and return the key.
    ///
    /// Workers reuse one buffer for every iteration. The padding bytes are
    /// cleared on each call so a buffer that was written by other code still
    /// yields the same key as [`Key::encode`].
    #[inline]
    pub fn encode_into(value: u64, buf: &mut [u8; KEY_SIZE]) -> Self {
        let (ikey, padding) = buf.split_at_mut(IKEY_SIZE);
        ikey.copy_from_slice(&value.to_le_bytes());
        padding.fill(0);
        Self(*buf)
    }

    /// Recover the integer committed to the first [`IKEY_SIZE`] bytes.
    #[inline]
    #[must_use]
    pub fn decode(&self) -> u64 {
        let mut ikey = [0u8; IKEY_SIZE];
        ikey.copy_from_slice(&self.0[..IKEY_SIZE]);
        u64::from_le_bytes(ikey)
    }

    /// Wrap raw key bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Hash for Key {
    // One `write` of the full key so `CodecHasher` sees exactly the key bytes.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.0);
    }
}

impl StdFmt::Debug for Key {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "Key({:#018x})", self.decode())
    }
}

impl From<u64> for Key {
    #[inline]
    fn from(value: u64) -> Self {
        Self::encode(value)
    }
}

// ============================================================================
//  Codec
// ============================================================================

/// Hash-code algorithm applied to key bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Codec {
    /// Fold the committed integer into 32 bits (`lo ^ hi`).
    ///
    /// Identity for integers below `2^32`, so it is reversible over every
    /// population the harness builds.
    #[default]
    Fold,

    /// CRC-32 (IEEE) over all 16 key bytes.
    Crc32,
}

impl Codec {
    /// Compute the hash code of `key`.
    #[inline]
    #[must_use]
    pub fn hash_code(self, key: &Key) -> u32 {
        match self {
            Self::Fold => fold(key.decode()),
            Self::Crc32 => crc32fast::hash(key.as_bytes()),
        }
    }

    /// Hash arbitrary bytes the way [`Codec::hash_code`] hashes a key.
    ///
    /// Inputs of exactly [`KEY_SIZE`] bytes hash identically to the
    /// corresponding [`Key`]. `Fold` zero-extends shorter inputs.
    #[must_use]
    pub fn hash_bytes(self, bytes: &[u8]) -> u32 {
        match self {
            Self::Fold => {
                let mut ikey = [0u8; IKEY_SIZE];
                for (dst, src) in ikey.iter_mut().zip(bytes) {
                    *dst = *src;
                }
                fold(u64::from_le_bytes(ikey))
            }
            Self::Crc32 => crc32fast::hash(bytes),
        }
    }

    /// Build a [`BuildHasher`] that indexes tables by this codec.
    #[must_use]
    pub const fn build_hasher(self) -> CodecBuildHasher {
        CodecBuildHasher { codec: self }
    }
}

impl StdFmt::Display for Codec {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.write_str(match self {
            Self::Fold => "fold",
            Self::Crc32 => "crc32",
        })
    }
}

#[inline]
#[expect(clippy::cast_possible_truncation)]
const fn fold(value: u64) -> u32 {
    (value as u32) ^ ((value >> 32) as u32)
}

// ============================================================================
//  Table hashing
// ============================================================================

/// [`BuildHasher`] for tables keyed by [`Key`].
///
/// The 64-bit table hash is the codec's 32-bit code spread by a multiplier,
/// so a store that reports [`Codec::hash_code`] indexes its table by the same
/// value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodecBuildHasher {
    codec: Codec,
}

impl CodecBuildHasher {
    /// The codec backing this hasher.
    #[must_use]
    pub const fn codec(&self) -> Codec {
        self.codec
    }
}

impl BuildHasher for CodecBuildHasher {
    type Hasher = CodecHasher;

    #[inline]
    fn build_hasher(&self) -> CodecHasher {
        CodecHasher {
            codec: self.codec,
            state: 0,
        }
    }
}

/// Hasher produced by [`CodecBuildHasher`].
#[derive(Clone, Copy, Debug)]
pub struct CodecHasher {
    codec: Codec,
    state: u64,
}

impl CodecHasher {
    /// Spread a 32-bit hash code into a 64-bit table hash.
    #[inline]
    #[must_use]
    pub const fn spread(code: u32) -> u64 {
        (code as u64).wrapping_mul(SPREAD)
    }
}

impl Hasher for CodecHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let code = Self::spread(self.codec.hash_bytes(bytes));
        self.state = self.state.rotate_left(5) ^ code;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}
