//! A fixed-capacity, word-packed bit set.
//!
//! Stores one presence flag per dense id, either a cache slot or a compacted node id.
//! Words are `u64`; the number of set bits is tracked incrementally so `count` is
//! \(O(1)\).

/// A fixed-capacity bit set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceBits {
    words: Vec<u64>,
    capacity: usize,
    len: usize,
}

impl PresenceBits {
    /// Creates an all-clear set able to hold ids `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
            len: 0,
        }
    }

    /// Number of ids the set can hold.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of set bits.
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.len
    }

    /// Returns `true` if `bit` is set. Ids beyond the capacity are never set.
    #[inline]
    pub fn contains(&self, bit: usize) -> bool {
        if bit >= self.capacity {
            return false;
        }
        self.words[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// Sets `bit`. Returns `true` if it was previously clear.
    ///
    /// # Panics
    /// Panics if `bit >= self.capacity()`.
    #[inline]
    pub fn insert(&mut self, bit: usize) -> bool {
        assert!(bit < self.capacity, "bit {bit} out of bounds for capacity {}", self.capacity);
        let word = &mut self.words[bit / 64];
        let mask = 1u64 << (bit % 64);
        if *word & mask == 0 {
            *word |= mask;
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.len = 0;
    }

    /// Iterates over set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            core::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + tz)
            })
        })
    }
}
