//! immutable copies of a histogram for consistent multi-query reads.
//!
//! a snapshot reads the bin pointers once, then copies every counter of
//! every bin it saw. bins allocated after that first read are left out;
//! a bin that is in is copied whole, and its total is recomputed from the
//! copied counters so the snapshot always agrees with itself.

use crate::codec::{Codec, BINS};
use crate::distribution::Distribution;
use crate::store::Store;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// point-in-time copy of a [`Histogram`](crate::Histogram).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    codec: Codec,
    /// bit `n` set when bin `n` has counters
    bitmap: u64,
    totals: [u64; BINS],
    population: u64,
    /// counter arrays of present bins, packed in bin order
    counters: Vec<u64>,
}

impl Snapshot {
    pub(crate) fn capture(codec: Codec, store: &Store) -> Self {
        let arrays: [Option<&[AtomicU64]>; BINS] = std::array::from_fn(|bin| store.counters(bin));
        let bitmap = arrays
            .iter()
            .enumerate()
            .filter(|(_, array)| array.is_some())
            .fold(0u64, |bitmap, (bin, _)| bitmap | 1 << bin);

        let width = codec.mantissas() as usize;
        let mut counters = Vec::with_capacity(bitmap.count_ones() as usize * width);
        let mut totals = [0u64; BINS];
        for (bin, array) in arrays.iter().enumerate() {
            if let Some(array) = array {
                let start = counters.len();
                counters.extend(array.iter().map(|c| c.load(Ordering::Relaxed)));
                totals[bin] = counters[start..].iter().sum();
            }
        }
        let population = totals.iter().sum();

        debug!(
            "snapshot: sigbits={} bins={} population={}",
            codec.sigbits(),
            bitmap.count_ones(),
            population
        );

        Self {
            codec,
            bitmap,
            totals,
            population,
            counters,
        }
    }

    /// bins present in the snapshot, one bit per bin.
    pub fn bitmap(&self) -> u64 {
        self.bitmap
    }

    /// counters of `bin`, or `None` if it was not allocated when captured.
    pub fn bin_counters(&self, bin: usize) -> Option<&[u64]> {
        if bin >= BINS || self.bitmap & (1 << bin) == 0 {
            return None;
        }
        let width = self.codec.mantissas() as usize;
        let index = (self.bitmap & ((1 << bin) - 1)).count_ones() as usize;
        Some(&self.counters[index * width..(index + 1) * width])
    }

    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.counters.len() * std::mem::size_of::<u64>()
    }

    /// checks internal consistency. panics on the first violation.
    pub fn validate(&self) {
        let width = self.codec.mantissas() as usize;
        let bins = self.codec.bins();
        if bins < BINS {
            assert_eq!(
                self.bitmap >> bins,
                0,
                "bitmap marks bins past {} at sigbits {}",
                bins,
                self.codec.sigbits()
            );
        }
        assert_eq!(
            self.counters.len(),
            self.bitmap.count_ones() as usize * width,
            "packed counters do not match the bitmap"
        );
        for bin in 0..bins {
            if let Some(counters) = self.bin_counters(bin) {
                assert_eq!(counters.len(), width, "bin {} counter width", bin);
            }
        }
        for bin in bins..BINS {
            assert_eq!(self.totals[bin], 0, "unused bin {} has a total", bin);
        }
        for bin in 0..BINS {
            let sum: u64 = self.bin_counters(bin).map_or(0, |c| c.iter().sum());
            assert_eq!(sum, self.totals[bin], "bin {} total mismatch", bin);
        }
        assert_eq!(
            self.totals.iter().sum::<u64>(),
            self.population,
            "population mismatch"
        );
    }
}

impl Distribution for Snapshot {
    #[inline]
    fn codec(&self) -> Codec {
        self.codec
    }

    #[inline]
    fn bin_total(&self, bin: usize) -> u64 {
        self.totals.get(bin).copied().unwrap_or(0)
    }

    #[inline]
    fn count(&self, key: u32) -> u64 {
        self.bin_counters(self.codec.bin_of(key))
            .map_or(0, |counters| counters[self.codec.offset_of(key)])
    }

    #[inline]
    fn population(&self) -> u64 {
        self.population
    }
}
