//! value <-> bucket key mapping.
//!
//! values are bucketed like floating point numbers with a `sigbits`-wide
//! mantissa. the key keeps the mantissa's leading bit, which adds one to the
//! exponent of every normal value, so there are no gaps and no branches.
//! values below `2 << sigbits` each get an exact bucket of their own.

use crate::error::{Error, Result};

/// smallest supported precision.
pub const MIN_SIGBITS: u32 = 1;

/// largest supported precision.
pub const MAX_SIGBITS: u32 = 15;

/// bins per histogram. one bin per exponent at `sigbits = 1`; larger
/// precisions leave the top bins unused.
pub const BINS: usize = 64;

/// bucket geometry for one `sigbits` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codec {
    sigbits: u32,
}

impl Codec {
    /// creates a codec, rejecting `sigbits` outside `1..=15`.
    pub fn new(sigbits: u32) -> Result<Self> {
        if !(MIN_SIGBITS..=MAX_SIGBITS).contains(&sigbits) {
            return Err(Error::InvalidSigbits { sigbits });
        }
        Ok(Self { sigbits })
    }

    #[inline(always)]
    pub const fn sigbits(&self) -> u32 {
        self.sigbits
    }

    /// keys per bin.
    #[inline(always)]
    pub const fn mantissas(&self) -> u32 {
        1 << self.sigbits
    }

    /// bins that can hold values.
    #[inline(always)]
    pub const fn exponents(&self) -> u32 {
        64 - (self.sigbits - 1)
    }

    /// bins in use at this precision, as an index bound.
    #[inline(always)]
    pub const fn bins(&self) -> usize {
        self.exponents() as usize
    }

    /// total number of keys. valid keys are `0..keys()`.
    #[inline(always)]
    pub const fn keys(&self) -> u32 {
        self.exponents() * self.mantissas()
    }

    #[inline(always)]
    pub const fn bin_of(&self, key: u32) -> usize {
        (key >> self.sigbits) as usize
    }

    /// position of `key` inside its bin.
    #[inline(always)]
    pub const fn offset_of(&self, key: u32) -> usize {
        (key & (self.mantissas() - 1)) as usize
    }

    #[inline(always)]
    pub const fn first_key(&self, bin: usize) -> u32 {
        (bin as u32) << self.sigbits
    }

    /// maps a value to its bucket key.
    #[inline(always)]
    pub fn key_of(&self, value: u64) -> u32 {
        // the forced bit puts all small values in the lowest exponent
        let binned = value | (1u64 << self.sigbits);
        let exponent = 63 - self.sigbits - binned.leading_zeros();
        let mantissa = (value >> exponent) as u32;
        (exponent << self.sigbits) + mantissa
    }

    /// smallest value in the bucket. `key` must be below `keys()`.
    #[inline(always)]
    pub fn min_of(&self, key: u32) -> u64 {
        debug_assert!(key < self.keys(), "key {} out of range", key);
        let bin = key >> self.sigbits;
        let leading = ((bin != 0) as u64) << self.sigbits;
        let mantissa = (key & (self.mantissas() - 1)) as u64 | leading;
        mantissa << bin.saturating_sub(1)
    }

    /// largest value in the bucket, inclusive. `key` must be below `keys()`.
    #[inline(always)]
    pub fn max_of(&self, key: u32) -> u64 {
        let exponent = (key >> self.sigbits).saturating_sub(1);
        // pre-shifted so the top exponent never shifts by 64
        let range = (u64::MAX >> 1) >> (63 - exponent);
        self.min_of(key) + range
    }

    /// checks that the keys partition the whole `u64` range in order.
    ///
    /// panics on the first violation.
    pub fn validate(&self) {
        let keys = self.keys();
        assert_eq!(self.min_of(0), 0, "first bucket must start at zero");
        assert_eq!(
            self.max_of(keys - 1),
            u64::MAX,
            "last bucket must end at u64::MAX"
        );
        for key in 0..keys {
            let min = self.min_of(key);
            let max = self.max_of(key);
            assert!(min <= max, "key {} has min {} > max {}", key, min, max);
            assert_eq!(self.key_of(min), key, "min of key {} maps elsewhere", key);
            assert_eq!(self.key_of(max), key, "max of key {} maps elsewhere", key);
            if key > 0 {
                assert_eq!(
                    self.max_of(key - 1) + 1,
                    min,
                    "gap or overlap before key {}",
                    key
                );
            }
        }
    }
}
