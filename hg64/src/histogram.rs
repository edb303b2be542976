//! concurrent histogram.

use crate::codec::{Codec, BINS};
use crate::config::HistogramConfig;
use crate::distribution::Distribution;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::store::Store;
use std::fmt;
use std::sync::atomic::Ordering;

/// approximate histogram of `u64` values.
///
/// any number of threads may record into one histogram through a shared
/// reference; there is no lock. reads of a histogram that is still being
/// written can see some keys ahead of others; take a [`Snapshot`] for a
/// consistent view.
pub struct Histogram {
    codec: Codec,
    store: Store,
}

impl Histogram {
    /// creates an empty histogram keeping `sigbits` significant bits of each
    /// value. fails unless `1 <= sigbits <= 15`.
    pub fn new(sigbits: u32) -> Result<Self> {
        Self::with_config(HistogramConfig::new().with_sigbits(sigbits))
    }

    pub fn with_config(config: HistogramConfig) -> Result<Self> {
        config.validate()?;
        let codec = config.codec()?;
        Ok(Self {
            codec,
            store: Store::new(codec),
        })
    }

    /// records one occurrence of `value`.
    #[inline(always)]
    pub fn increment(&self, value: u64) {
        self.add(value, 1);
    }

    /// records `count` occurrences of `value`. a zero count allocates nothing.
    #[inline(always)]
    pub fn add(&self, value: u64, count: u64) {
        self.store.increment(self.codec.key_of(value), count);
    }

    /// adds `count` directly to `key`.
    #[inline(always)]
    pub(crate) fn add_key(&self, key: u32, count: u64) {
        self.store.increment(key, count);
    }

    /// key after `key`, jumping over bins that have never been written.
    ///
    /// returns `codec().keys()` or more when there are no further keys.
    pub fn next_key(&self, key: u32) -> u32 {
        let keys = self.codec.keys();
        let mut key = key.saturating_add(1);
        while key < keys {
            let bin = self.codec.bin_of(key);
            if self.store.counters(bin).is_some() {
                break;
            }
            key = self.codec.first_key(bin + 1);
        }
        key
    }

    /// bytes used, headers included.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.store.header_bytes() + self.store.allocated_bytes()
    }

    /// number of bins with counter storage.
    pub fn allocated_bins(&self) -> usize {
        self.store.allocated_bins()
    }

    /// copies the counters into an immutable [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.codec, &self.store)
    }

    /// checks that every bin total matches the sum of its counters.
    ///
    /// only meaningful while no other thread is writing. panics on the first
    /// violation.
    pub fn validate(&self) {
        let mut population = 0u64;
        for bin in 0..BINS {
            let total = self.store.total(bin);
            match self.store.counters(bin) {
                None => assert_eq!(total, 0, "bin {} has a total but no counters", bin),
                Some(counters) => {
                    assert!(
                        bin < self.codec.bins(),
                        "bin {} is beyond the last exponent",
                        bin
                    );
                    let sum: u64 = counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
                    assert_eq!(sum, total, "bin {} total does not match its counters", bin);
                }
            }
            population += total;
        }
        assert_eq!(population, self.population(), "population drifted");
    }
}

impl Distribution for Histogram {
    #[inline(always)]
    fn codec(&self) -> Codec {
        self.codec
    }

    #[inline(always)]
    fn bin_total(&self, bin: usize) -> u64 {
        self.store.total(bin)
    }

    #[inline(always)]
    fn count(&self, key: u32) -> u64 {
        self.store
            .counter(key)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("sigbits", &self.codec.sigbits())
            .field("population", &self.population())
            .field("allocated_bins", &self.allocated_bins())
            .finish()
    }
}
