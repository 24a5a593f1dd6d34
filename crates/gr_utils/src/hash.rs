//! Hash containers, built on *hashbrown* and *foldhash*.
//!
//! `FixedHashState` yields hash results that depend only on the input,
//! through a fixed hash seed. `NoOpHashState` passes `u64`-shaped keys
//! through unchanged and is meant for keys that are already good hashes,
//! such as `TypeId`.

use core::fmt::Debug;
use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0xD34B_9C6F_21A7_55E3);

/// A hasher whose results only depend on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`], created through
/// [`FixedHashState::build_hasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state based upon a random but fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::{Hash, Hasher, BuildHasher};
/// use gr_utils::hash::FixedHashState;
///
/// let mut hasher = FixedHashState.build_hasher();
/// 3.hash(&mut hasher);
/// let result = hasher.finish(); // Fixed result across runs.
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher that directly passes the value through as `u64`.
///
/// Created through [`NoOpHashState::build_hasher`].
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Usually `write_u64` is used directly. The byte path folds the
        // input into the accumulator so shorter writes still terminate
        // with a usable value.
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state for [`NoOpHasher`].
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher::default()
    }
}

// -----------------------------------------------------------------------------
// Container aliases

/// A [`hashbrown::HashMap`] with a fixed-seed hash state.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] with a fixed-seed hash state.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hasher};

    use super::{FixedHashState, NoOpHashState};

    #[test]
    fn fixed_state_is_deterministic() {
        let a = FixedHashState.hash_one("grain");
        let b = FixedHashState.hash_one("grain");
        assert_eq!(a, b);
    }

    #[test]
    fn noop_passes_u64_through() {
        let mut hasher = NoOpHashState.build_hasher();
        hasher.write_u64(0xABCD);
        assert_eq!(hasher.finish(), 0xABCD);
    }
}
