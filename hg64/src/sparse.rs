//! compact single-threaded histogram.
//!
//! uses the same buckets as [`Histogram`](crate::Histogram) but stores only
//! non-zero counters. each bin keeps a presence bitmap and a packed vector of
//! counters; a key's slot is the number of present keys below it, and a new
//! key is inserted by shifting the tail of the vector up by one.
//!
//! this trades insertion cost for memory on sparse data. it needs `&mut self`
//! to record and is not meant to be shared between writer threads.

use crate::codec::{Codec, BINS};
use crate::config::HistogramConfig;
use crate::distribution::Distribution;
use crate::error::Result;
use crate::merge::redistribute;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Pack {
    total: u64,
    bitmap: Vec<u64>,
    counts: Vec<u64>,
}

impl Pack {
    /// packed slot of `offset` and whether it is present.
    #[inline]
    fn position(&self, offset: usize) -> (usize, bool) {
        if self.bitmap.is_empty() {
            return (0, false);
        }
        let word = offset / 64;
        let bit = 1u64 << (offset % 64);
        let below: u32 = self.bitmap[..word].iter().map(|w| w.count_ones()).sum();
        let slot = below + (self.bitmap[word] & (bit - 1)).count_ones();
        (slot as usize, self.bitmap[word] & bit != 0)
    }

    fn get(&self, offset: usize) -> u64 {
        match self.position(offset) {
            (slot, true) => self.counts[slot],
            _ => 0,
        }
    }

    /// returns true when a new counter had to be inserted.
    fn add(&mut self, offset: usize, count: u64, width: usize) -> bool {
        if self.bitmap.is_empty() {
            self.bitmap = vec![0; width.div_ceil(64)];
        }
        let (slot, present) = self.position(offset);
        self.total += count;
        if present {
            self.counts[slot] += count;
            return false;
        }
        self.bitmap[offset / 64] |= 1 << (offset % 64);
        self.counts.insert(slot, count);
        true
    }
}

/// histogram with packed, allocation-on-demand counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseHistogram {
    codec: Codec,
    population: u64,
    buckets: usize,
    packs: Vec<Pack>,
}

impl SparseHistogram {
    pub fn new(sigbits: u32) -> Result<Self> {
        Self::with_config(HistogramConfig::new().with_sigbits(sigbits))
    }

    pub fn with_config(config: HistogramConfig) -> Result<Self> {
        config.validate()?;
        let codec = config.codec()?;
        Ok(Self {
            codec,
            population: 0,
            buckets: 0,
            packs: vec![Pack::default(); codec.bins()],
        })
    }

    pub fn increment(&mut self, value: u64) {
        self.add(value, 1);
    }

    /// records `count` occurrences of `value`. zero counts are ignored so
    /// that no zero counter is ever stored.
    pub fn add(&mut self, value: u64, count: u64) {
        self.add_key(self.codec.key_of(value), count);
    }

    fn add_key(&mut self, key: u32, count: u64) {
        if count == 0 {
            return;
        }
        let width = self.codec.mantissas() as usize;
        let pack = &mut self.packs[self.codec.bin_of(key)];
        if pack.add(self.codec.offset_of(key), count, width) {
            self.buckets += 1;
        }
        self.population += count;
    }

    /// adds every count of `source`, redistributing across precisions like
    /// [`Histogram::merge`](crate::Histogram::merge).
    pub fn merge<D: Distribution + ?Sized>(&mut self, source: &D) {
        let mut pending = Vec::new();
        redistribute(self.codec, source, |key, count| pending.push((key, count)));
        for (key, count) in pending {
            self.add_key(key, count);
        }
    }

    /// number of stored (non-zero) counters.
    pub fn bucket_count(&self) -> usize {
        self.buckets
    }

    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .packs
                .iter()
                .map(|pack| {
                    std::mem::size_of::<Pack>()
                        + (pack.bitmap.capacity() + pack.counts.capacity())
                            * std::mem::size_of::<u64>()
                })
                .sum::<usize>()
    }

    /// checks the packed representation. panics on the first violation.
    pub fn validate(&self) {
        let mut population = 0u64;
        let mut buckets = 0usize;
        for (bin, pack) in self.packs.iter().enumerate() {
            let present: u32 = pack.bitmap.iter().map(|w| w.count_ones()).sum();
            assert_eq!(
                present as usize,
                pack.counts.len(),
                "bin {} bitmap disagrees with its counters",
                bin
            );
            assert!(
                pack.counts.iter().all(|&count| count != 0),
                "bin {} stores a zero counter",
                bin
            );
            let subtotal: u64 = pack.counts.iter().sum();
            assert_eq!(subtotal, pack.total, "bin {} total mismatch", bin);
            assert_eq!(subtotal == 0, pack.counts.is_empty());
            population += subtotal;
            buckets += pack.counts.len();
        }
        assert_eq!(population, self.population, "population mismatch");
        assert_eq!(buckets, self.buckets, "bucket count mismatch");
    }
}

impl Distribution for SparseHistogram {
    #[inline]
    fn codec(&self) -> Codec {
        self.codec
    }

    #[inline]
    fn bin_total(&self, bin: usize) -> u64 {
        debug_assert!(bin < BINS);
        self.packs.get(bin).map_or(0, |pack| pack.total)
    }

    #[inline]
    fn count(&self, key: u32) -> u64 {
        self.packs[self.codec.bin_of(key)].get(self.codec.offset_of(key))
    }

    #[inline]
    fn population(&self) -> u64 {
        self.population
    }
}
