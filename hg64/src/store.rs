//! lazily allocated counter storage.
//!
//! each bin starts without a counter array. the first writer to touch a bin
//! allocates a zeroed array and publishes it with one compare-and-swap. a
//! writer that loses the race frees its own array and adopts the winner's,
//! so there is never more than one array per bin and no count is lost.
//!
//! publication is release/acquire: anyone who sees a non-null bin pointer
//! also sees the zeroed counters behind it. counter updates are relaxed,
//! only the final sums are meaningful.

use crate::codec::{Codec, BINS};
use log::trace;
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

/// one exponent's worth of counters plus their running total.
///
/// aligned to a cache line so writers on neighbouring bins do not
/// invalidate each other's totals.
#[repr(C, align(64))]
struct Bin {
    total: AtomicU64,
    counters: AtomicPtr<AtomicU64>,
}

impl Bin {
    const fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            counters: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// # safety
    ///
    /// `len` must be the length every array of this bin is allocated with.
    #[inline(always)]
    unsafe fn counters(&self, len: usize) -> Option<&[AtomicU64]> {
        let ptr = self.counters.load(Ordering::Acquire);
        if ptr.is_null() {
            None
        } else {
            // safety: non-null pointers are only stored by `allocate`, which
            // publishes a fully zeroed `len`-element array
            Some(unsafe { slice::from_raw_parts(ptr, len) })
        }
    }

    /// # safety
    ///
    /// same contract as `counters`.
    #[cold]
    unsafe fn allocate(&self, len: usize) -> &[AtomicU64] {
        let fresh: Box<[AtomicU64]> = (0..len).map(|_| AtomicU64::new(0)).collect();
        let fresh = Box::into_raw(fresh) as *mut AtomicU64;

        match self.counters.compare_exchange(
            ptr::null_mut(),
            fresh,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                trace!("published counter array of {} keys", len);
                // safety: we just published it and it lives until `release`
                unsafe { slice::from_raw_parts(fresh, len) }
            }
            Err(winner) => {
                trace!("lost bin allocation race, adopting winner");
                // safety: `fresh` was never shared
                drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(fresh, len)) });
                // safety: the winner published a `len`-element array
                unsafe { slice::from_raw_parts(winner, len) }
            }
        }
    }

    /// # safety
    ///
    /// same contract as `counters`.
    unsafe fn release(&mut self, len: usize) {
        let ptr = std::mem::replace(self.counters.get_mut(), ptr::null_mut());
        if !ptr.is_null() {
            // safety: `ptr` came from `Box::into_raw` on a `len`-element slice
            // and `&mut self` means no reader can still hold it
            drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)) });
        }
    }
}

/// counter store for one histogram: a fixed array of lazily filled bins.
pub(crate) struct Store {
    codec: Codec,
    bins: Box<[Bin; BINS]>,
}

impl Store {
    pub(crate) fn new(codec: Codec) -> Self {
        Self {
            codec,
            bins: Box::new(std::array::from_fn(|_| Bin::new())),
        }
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.codec.mantissas() as usize
    }

    /// counter array of `bin`, if any key in it has been written.
    #[inline(always)]
    pub(crate) fn counters(&self, bin: usize) -> Option<&[AtomicU64]> {
        // safety: every array in this store has `mantissas()` elements
        unsafe { self.bins[bin].counters(self.len()) }
    }

    /// running total of `bin`.
    #[inline(always)]
    pub(crate) fn total(&self, bin: usize) -> u64 {
        self.bins[bin].total.load(Ordering::Relaxed)
    }

    /// counter for `key`, or `None` while its bin has never been written.
    #[inline(always)]
    pub(crate) fn counter(&self, key: u32) -> Option<&AtomicU64> {
        let offset = self.codec.offset_of(key);
        self.counters(self.codec.bin_of(key))
            .map(|counters| &counters[offset])
    }

    /// counter for `key`, allocating its bin on first use.
    #[inline(always)]
    fn counter_or_allocate(&self, key: u32) -> &AtomicU64 {
        let bin = self.codec.bin_of(key);
        let offset = self.codec.offset_of(key);
        let counters = match self.counters(bin) {
            Some(counters) => counters,
            // safety: as in `counters`
            None => unsafe { self.bins[bin].allocate(self.len()) },
        };
        &counters[offset]
    }

    /// adds `delta` to `key`, then to its bin total.
    #[inline(always)]
    pub(crate) fn increment(&self, key: u32, delta: u64) {
        if delta == 0 {
            return;
        }
        self.counter_or_allocate(key)
            .fetch_add(delta, Ordering::Relaxed);
        self.bins[self.codec.bin_of(key)]
            .total
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// number of bins with a counter array.
    pub(crate) fn allocated_bins(&self) -> usize {
        (0..BINS).filter(|&bin| self.counters(bin).is_some()).count()
    }

    /// bytes used by counter arrays.
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.allocated_bins() * self.len() * std::mem::size_of::<AtomicU64>()
    }

    /// bytes used by the bin headers.
    pub(crate) fn header_bytes(&self) -> usize {
        std::mem::size_of::<[Bin; BINS]>()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let len = self.len();
        for bin in self.bins.iter_mut() {
            // safety: every array in this store has `len` elements
            unsafe { bin.release(len) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn store(sigbits: u32) -> Store {
        Store::new(Codec::new(sigbits).unwrap())
    }

    #[test]
    fn test_bin_alignment() {
        assert_eq!(std::mem::align_of::<Bin>(), 64);
        assert_eq!(std::mem::size_of::<Bin>(), 64);
    }

    #[test]
    fn test_lazy_allocation() {
        let store = store(4);
        assert_eq!(store.allocated_bins(), 0);
        assert!(store.counter(100).is_none());

        store.increment(100, 3);
        let bin = store.codec.bin_of(100);
        assert_eq!(store.allocated_bins(), 1);
        assert_eq!(store.total(bin), 3);
        assert_eq!(store.counter(100).unwrap().load(Ordering::Relaxed), 3);

        // neighbours in the same bin share the array and start at zero
        let neighbour = store.codec.first_key(bin);
        assert_eq!(
            store.counter(neighbour).unwrap().load(Ordering::Relaxed),
            0
        );
        assert_eq!(store.allocated_bytes(), 16 * 8);
    }

    #[test]
    fn test_totals_match_counters_on_first_write() {
        let store = store(3);
        let codec = store.codec;
        // first write to every bin goes through allocation
        for bin in 0..codec.bins() {
            let key = codec.first_key(bin) + codec.mantissas() - 1;
            assert!(store.counter(key).is_none());
            store.increment(key, bin as u64 + 1);
        }
        assert_eq!(store.allocated_bins(), codec.bins());

        for bin in 0..codec.bins() {
            let counters = store.counters(bin).unwrap();
            let sum: u64 = counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
            assert_eq!(sum, store.total(bin), "bin {}", bin);
            assert_eq!(sum, bin as u64 + 1);
        }

        // the allocating and the reading path hand out the same counter
        let key = codec.first_key(5) + 2;
        let allocated: *const AtomicU64 = store.counter_or_allocate(key);
        let read: *const AtomicU64 = store.counter(key).unwrap();
        assert_eq!(allocated, read);
    }

    #[test]
    fn test_zero_delta_does_not_allocate() {
        let store = store(8);
        store.increment(4000, 0);
        assert_eq!(store.allocated_bins(), 0);
        assert_eq!(store.total(store.codec.bin_of(4000)), 0);
    }

    #[test]
    fn test_concurrent_first_write() {
        const THREADS: usize = 8;
        const ROUNDS: u64 = 10_000;

        let store = Arc::new(store(10));
        let barrier = Arc::new(Barrier::new(THREADS));
        let key = store.codec.first_key(20) + 7;

        let writers: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // all threads race to allocate the same bin
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        store.increment(key, 1);
                    }
                })
            })
            .collect();

        for w in writers {
            w.join().unwrap();
        }

        let expected = THREADS as u64 * ROUNDS;
        assert_eq!(store.allocated_bins(), 1);
        assert_eq!(store.total(20), expected);
        let counters = store.counters(20).unwrap();
        let sum: u64 = counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
        assert_eq!(sum, expected);
        assert_eq!(counters[7].load(Ordering::Relaxed), expected);
    }

    #[test]
    fn test_concurrent_many_bins() {
        const THREADS: u32 = 4;

        let store = Arc::new(store(3));
        let keys = store.codec.keys();

        let writers: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for key in 0..keys {
                        store.increment(key, (t + 1) as u64);
                    }
                })
            })
            .collect();

        for w in writers {
            w.join().unwrap();
        }

        let per_key: u64 = (1..=THREADS as u64).sum();
        for key in 0..keys {
            let count = store.counter(key).unwrap().load(Ordering::Relaxed);
            assert_eq!(count, per_key);
        }
        assert_eq!(store.allocated_bins(), store.codec.bins());
    }
}
