//! low overhead latency timing backed by hg64 histograms
//!
//! timers read a monotonic clock and record elapsed nanoseconds into a shared
//! `hg64::Histogram`. `LatencyStats` summarises any recorded distribution.

pub mod timer;

pub use timer::{ScopedTimer, Timer, TimerGuard};

use hg64::{Distribution, Error, Result};
use std::time::Instant;

/// timing measurement point
#[derive(Debug, Clone, Copy)]
pub struct TimePoint {
    instant: Instant,
}

impl TimePoint {
    /// creates a new time point at current time
    #[inline(always)]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    /// calculates elapsed time since this point in nanoseconds
    #[inline(always)]
    pub fn elapsed_ns(&self) -> u64 {
        u64::try_from(self.instant.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// macro for timing a block of code
///
/// usage:
/// ```
/// let (sum, elapsed) = hg64_timing::time_block!({
///     (0..1000u64).sum::<u64>()
/// });
/// assert_eq!(sum, 499500);
/// ```
#[macro_export]
macro_rules! time_block {
    ($block:block) => {{
        let __start = $crate::TimePoint::now();
        let __result = $block;
        (__result, __start.elapsed_ns())
    }};
}

/// macro for timing a block and recording it into a histogram
///
/// usage:
/// ```
/// let hist = hg64::Histogram::new(5).unwrap();
/// let sum = hg64_timing::time_into!(hist, {
///     (0..1000u64).sum::<u64>()
/// });
/// assert_eq!(sum, 499500);
/// ```
#[macro_export]
macro_rules! time_into {
    ($histogram:expr, $block:block) => {{
        let __start = $crate::TimePoint::now();
        let __result = $block;
        $histogram.increment(__start.elapsed_ns());
        __result
    }};
}

/// latency statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub mean: u64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p999: u64,
    pub p9999: u64,
    pub count: u64,
}

impl LatencyStats {
    /// summarises a distribution of nanosecond samples.
    ///
    /// take a snapshot first when the histogram is still being written.
    pub fn from_distribution<D: Distribution>(dist: &D) -> Result<Self> {
        let count = dist.population();
        if count == 0 {
            return Err(Error::Empty);
        }
        Ok(Self {
            min: dist.value_at_rank(0)?,
            max: dist.value_at_rank(count - 1)?,
            mean: dist.mean_variance()?.mean as u64,
            p50: dist.value_at_quantile(0.5)?,
            p90: dist.value_at_quantile(0.9)?,
            p99: dist.value_at_quantile(0.99)?,
            p999: dist.value_at_quantile(0.999)?,
            p9999: dist.value_at_quantile(0.9999)?,
            count,
        })
    }

    /// formats the stats as a string
    pub fn format(&self) -> String {
        format!(
            "count={} min={}ns p50={}ns p99={}ns p999={}ns max={}ns",
            self.count, self.min, self.p50, self.p99, self.p999, self.max
        )
    }

    /// formats with microsecond units
    pub fn format_micros(&self) -> String {
        format!(
            "count={} min={}μs p50={}μs p99={}μs p999={}μs max={}μs",
            self.count,
            self.min / 1000,
            self.p50 / 1000,
            self.p99 / 1000,
            self.p999 / 1000,
            self.max / 1000
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hg64::Histogram;

    #[test]
    fn test_time_point() {
        let start = TimePoint::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(start.elapsed_ns() >= 1_000_000);
    }

    #[test]
    fn test_time_block_macro() {
        let (result, elapsed) = time_block!({
            let mut sum = 0u64;
            for i in 0..1000 {
                sum = sum.wrapping_add(i);
            }
            std::hint::black_box(sum)
        });

        assert_eq!(result, 499500);
        assert!(elapsed < 1_000_000_000);
    }

    #[test]
    fn test_time_into_macro() {
        let hist = Histogram::new(5).unwrap();
        for _ in 0..10 {
            time_into!(hist, {
                std::hint::black_box(1 + 1);
            });
        }
        assert_eq!(hist.population(), 10);
    }

    #[test]
    fn test_stats_from_histogram() {
        let hist = Histogram::new(7).unwrap();
        for i in 1..=100u64 {
            hist.increment(i * 1000);
        }
        let stats = LatencyStats::from_distribution(&hist.snapshot()).unwrap();

        assert_eq!(stats.count, 100);
        assert!(stats.min <= 1000 && stats.min >= 992);
        assert!(stats.max <= 100_000 && stats.max >= 99_000);
        assert!((49_000..=52_000).contains(&stats.p50), "p50 {}", stats.p50);
        assert!(stats.p99 >= stats.p90 && stats.p999 >= stats.p99);
        assert!((49_000..=52_000).contains(&stats.mean), "mean {}", stats.mean);
    }

    #[test]
    fn test_stats_empty() {
        let hist = Histogram::new(5).unwrap();
        assert_eq!(LatencyStats::from_distribution(&hist), Err(Error::Empty));
    }

    #[test]
    fn test_format() {
        let stats = LatencyStats {
            count: 3,
            min: 1500,
            p50: 2500,
            max: 9000,
            ..Default::default()
        };
        assert!(stats.format().starts_with("count=3 min=1500ns"));
        assert!(stats.format_micros().contains("max=9μs"));
    }
}
