//! read-side view shared by live histograms, snapshots and the sparse variant.
//!
//! implementors only say how to read a bin total and a key's count; bucket
//! enumeration, ranks, quantiles and summary statistics are written once here
//! and behave the same over every representation.

use crate::codec::{Codec, BINS};
use crate::error::Result;
use crate::{rank, stats};

/// one bucket: an inclusive value range and its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub key: u32,
    pub min: u64,
    pub max: u64,
    pub count: u64,
}

/// mean and variance of the recorded values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVariance {
    pub mean: f64,
    pub variance: f64,
}

impl MeanVariance {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// recorded counts readable by key.
pub trait Distribution {
    /// bucket geometry.
    fn codec(&self) -> Codec;

    /// sum of counts in `bin`. zero for bins that hold nothing.
    fn bin_total(&self, bin: usize) -> u64;

    /// count recorded for `key`, which must be below `codec().keys()`.
    fn count(&self, key: u32) -> u64;

    fn sigbits(&self) -> u32 {
        self.codec().sigbits()
    }

    /// total number of recorded values.
    ///
    /// scans bin totals rather than keys.
    fn population(&self) -> u64 {
        (0..BINS).map(|bin| self.bin_total(bin)).sum()
    }

    /// bucket for `key`, or `None` past the last key.
    ///
    /// empty buckets are returned with a zero count, so iterating from key
    /// zero until `None` visits the whole value range.
    fn get(&self, key: u32) -> Option<Bucket> {
        let codec = self.codec();
        if key >= codec.keys() {
            return None;
        }
        Some(Bucket {
            key,
            min: codec.min_of(key),
            max: codec.max_of(key),
            count: self.count(key),
        })
    }

    /// every bucket in key order, empty ones included.
    fn buckets(&self) -> Buckets<'_, Self>
    where
        Self: Sized,
    {
        Buckets {
            dist: self,
            key: 0,
            skip_empty: false,
        }
    }

    /// buckets with a non-zero count, skipping empty bins wholesale.
    fn populated(&self) -> Buckets<'_, Self>
    where
        Self: Sized,
    {
        Buckets {
            dist: self,
            key: 0,
            skip_empty: true,
        }
    }

    /// approximate value at `rank`, which must be below the population.
    fn value_at_rank(&self, rank: u64) -> Result<u64> {
        rank::value_at_rank(self, rank)
    }

    /// approximate number of recorded values less than or equal to `value`.
    fn rank_of_value(&self, value: u64) -> u64 {
        rank::rank_of_value(self, value)
    }

    /// approximate value at `quantile`, clamped to `[0, 1]`.
    fn value_at_quantile(&self, quantile: f64) -> Result<u64> {
        rank::value_at_quantile(self, quantile)
    }

    /// approximate fraction of recorded values less than or equal to `value`.
    fn quantile_of_value(&self, value: u64) -> Result<f64> {
        rank::quantile_of_value(self, value)
    }

    /// mean and variance, using each bucket's midpoint.
    fn mean_variance(&self) -> Result<MeanVariance> {
        stats::mean_variance(self)
    }
}

/// iterator over the buckets of a [`Distribution`].
#[derive(Debug)]
pub struct Buckets<'a, D> {
    dist: &'a D,
    key: u32,
    skip_empty: bool,
}

impl<D: Distribution> Iterator for Buckets<'_, D> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        loop {
            let codec = self.dist.codec();
            if self.skip_empty && self.key < codec.keys() {
                let bin = codec.bin_of(self.key);
                if self.dist.bin_total(bin) == 0 {
                    self.key = codec.first_key(bin + 1);
                    continue;
                }
            }
            let bucket = self.dist.get(self.key)?;
            self.key += 1;
            if !self.skip_empty || bucket.count > 0 {
                return Some(bucket);
            }
        }
    }
}
