//! hg64: approximate histograms of 64-bit values.
//!
//! values are grouped into buckets whose width grows with magnitude, like
//! floating point numbers with a `sigbits`-wide mantissa, so the relative
//! error of any bucket stays below `2^-sigbits`. small values are counted
//! exactly.
//!
//! # types
//!
//! - [`Histogram`]: lock-free recording from any number of threads
//! - [`Snapshot`]: immutable copy for consistent multi-query reads
//! - [`SparseHistogram`]: single-threaded, stores only non-zero counters
//!
//! all three implement [`Distribution`], which provides bucket iteration,
//! ranks, quantiles and mean/variance.
//!
//! # example
//!
//! ```
//! use hg64::{Distribution, Histogram};
//!
//! let hist = Histogram::new(6).unwrap();
//! for latency in [120u64, 250, 250, 250, 15_000] {
//!     hist.increment(latency);
//! }
//!
//! let snapshot = hist.snapshot();
//! let median = snapshot.value_at_quantile(0.5).unwrap();
//! assert!((250..=251).contains(&median));
//! assert_eq!(snapshot.population(), 5);
//! ```

mod codec;
mod config;
mod distribution;
mod error;
mod histogram;
mod merge;
mod rank;
mod snapshot;
mod sparse;
mod stats;
mod store;

pub use {
    codec::{Codec, BINS, MAX_SIGBITS, MIN_SIGBITS},
    config::{bits_to_digits, convert_significance, digits_to_bits, HistogramConfig, DEFAULT_SIGBITS},
    distribution::{Bucket, Buckets, Distribution, MeanVariance},
    error::{Error, Result},
    histogram::Histogram,
    snapshot::Snapshot,
    sparse::SparseHistogram,
};
