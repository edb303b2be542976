//! folding one histogram's counts into another, across precisions.
//!
//! each populated source bucket is mapped onto the run of target keys that
//! its value range overlaps. the count is split evenly over that run and the
//! remainder goes one unit at a time to the lowest keys, so the total is
//! preserved exactly and the result is deterministic. with equal precision
//! every run is a single key and the merge is exact.

use crate::codec::Codec;
use crate::distribution::Distribution;
use crate::histogram::Histogram;
use crate::snapshot::Snapshot;
use log::debug;

/// walks the populated buckets of `source` and hands `(target_key, count)`
/// pairs for a `target`-geometry histogram to `add`.
pub(crate) fn redistribute<D, F>(target: Codec, source: &D, mut add: F)
where
    D: Distribution + ?Sized,
    F: FnMut(u32, u64),
{
    let codec = source.codec();
    let mut keys = 0u64;
    let mut moved = 0u64;

    for bin in 0..codec.bins() {
        if source.bin_total(bin) == 0 {
            continue;
        }
        let first = codec.first_key(bin);
        for key in first..first + codec.mantissas() {
            let count = source.count(key);
            if count == 0 {
                continue;
            }
            let low = target.key_of(codec.min_of(key));
            let high = target.key_of(codec.max_of(key));
            let spread = (high - low + 1) as u64;
            let share = count / spread;
            let extra = count % spread;
            for (i, target_key) in (low..=high).enumerate() {
                add(target_key, share + ((i as u64) < extra) as u64);
            }
            keys += 1;
            moved += count;
        }
    }

    debug!(
        "merged {} keys ({} values) from sigbits {} into sigbits {}",
        keys,
        moved,
        codec.sigbits(),
        target.sigbits()
    );
}

impl Histogram {
    /// adds every count recorded in `source` to this histogram.
    ///
    /// `source` may use any precision and may be a live histogram, a
    /// snapshot or a sparse histogram. merging a live source that is still
    /// being written folds in whatever counts are visible at the time.
    pub fn merge<D: Distribution + ?Sized>(&self, source: &D) {
        redistribute(self.codec(), source, |key, count| self.add_key(key, count));
    }

    /// adds the counts frozen in `snapshot`.
    pub fn merge_snapshot(&self, snapshot: &Snapshot) {
        self.merge(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SparseHistogram;
    use rand::Rng;

    fn random_histogram(sigbits: u32, samples: usize) -> Histogram {
        let mut rng = rand::thread_rng();
        let hist = Histogram::new(sigbits).unwrap();
        for _ in 0..samples {
            let value = rng.gen::<u64>() >> rng.gen_range(0..64);
            hist.add(value, rng.gen_range(1..10));
        }
        hist
    }

    #[test]
    fn test_same_precision_is_exact() {
        let a = Histogram::new(6).unwrap();
        let b = Histogram::new(6).unwrap();
        for value in 0..5_000u64 {
            if value % 2 == 0 {
                a.add(value * 1_000, 2);
            } else {
                b.add(value * 1_000, 3);
            }
        }
        let before: Vec<_> = a.buckets().map(|bucket| bucket.count).collect();
        let other: Vec<_> = b.buckets().map(|bucket| bucket.count).collect();

        a.merge(&b);
        a.validate();

        for (key, bucket) in a.buckets().enumerate() {
            assert_eq!(bucket.count, before[key] + other[key], "key {}", key);
        }
        assert_eq!(b.population(), other.iter().sum::<u64>());
    }

    #[test]
    fn test_conservation_across_precisions() {
        for source_bits in [1, 4, 6, 9, 15] {
            let source = random_histogram(source_bits, 2_000);
            for target_bits in [1, 3, 6, 10, 15] {
                let target = random_histogram(target_bits, 500);
                let before = target.population();
                target.merge(&source);
                assert_eq!(
                    target.population(),
                    before + source.population(),
                    "sigbits {} into {}",
                    source_bits,
                    target_bits
                );
                target.validate();
            }
        }
    }

    #[test]
    fn test_fine_into_coarse_keeps_buckets() {
        let fine = Histogram::new(10).unwrap();
        fine.add(123_456_789, 7);
        let coarse = Histogram::new(3).unwrap();
        coarse.merge(&fine);
        let key = coarse.codec().key_of(123_456_789);
        assert_eq!(coarse.count(key), 7);
        assert_eq!(coarse.populated().count(), 1);
    }

    #[test]
    fn test_coarse_into_fine_spreads_evenly() {
        let coarse = Histogram::new(2).unwrap();
        let codec = coarse.codec();
        let key = codec.key_of(1 << 20);
        coarse.add(1 << 20, 10);

        let fine = Histogram::new(4).unwrap();
        fine.merge(&coarse);

        // the coarse bucket covers four fine buckets: 3, 3, 2, 2
        let counts: Vec<_> = fine.populated().map(|bucket| bucket.count).collect();
        assert_eq!(counts, vec![3, 3, 2, 2]);
        let low = fine.codec().key_of(codec.min_of(key));
        assert_eq!(fine.count(low), 3);
    }

    #[test]
    fn test_merge_snapshot_and_sparse() {
        let live = random_histogram(5, 1_000);
        let snap = live.snapshot();

        let mut sparse = SparseHistogram::new(8).unwrap();
        sparse.add(42, 5);
        sparse.add(1 << 33, 9);

        let target = Histogram::new(7).unwrap();
        target.merge(&snap);
        target.merge(&sparse);
        assert_eq!(target.population(), snap.population() + 14);
        target.validate();
    }

    #[test]
    fn test_merge_snapshot_matches_live_source() {
        let live = random_histogram(9, 2_000);
        let snap = live.snapshot();

        let from_live = Histogram::new(4).unwrap();
        from_live.merge(&live);
        let from_snap = Histogram::new(4).unwrap();
        from_snap.merge_snapshot(&snap);

        assert_eq!(from_snap.population(), snap.population());
        assert_eq!(from_snap.snapshot(), from_live.snapshot());
        from_snap.validate();
    }

    #[test]
    fn test_merge_into_self_doubles() {
        let hist = random_histogram(6, 1_000);
        let before: Vec<_> = hist.buckets().map(|bucket| bucket.count).collect();
        hist.merge(&hist);
        for (key, bucket) in hist.buckets().enumerate() {
            assert_eq!(bucket.count, before[key] * 2);
        }
    }

    #[test]
    fn test_empty_source_allocates_nothing() {
        let source = Histogram::new(4).unwrap();
        let target = Histogram::new(9).unwrap();
        target.merge(&source);
        assert_eq!(target.allocated_bins(), 0);
        assert_eq!(target.population(), 0);
    }
}
