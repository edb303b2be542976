//! timers that record elapsed nanoseconds into hg64 histograms.
//!
//! `Timer` is started and stopped by hand. `ScopedTimer` names one code
//! section: every closure it runs, and every guard it hands out, adds a sample
//! to the section's histogram, and samples over the threshold are logged.

use crate::{LatencyStats, TimePoint};
use hg64::{Distribution, Histogram, Result};
use log::warn;
use std::sync::Arc;

/// default threshold above which a timed section is reported as slow
pub const DEFAULT_SLOW_THRESHOLD_NS: u64 = 1_000_000;

/// manual timer, optionally recording every stop and lap
#[derive(Debug)]
pub struct Timer {
    start: TimePoint,
    histogram: Option<Arc<Histogram>>,
}

impl Timer {
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: TimePoint::now(),
            histogram: None,
        }
    }

    /// starts a timer whose stops and laps land in `histogram`
    #[inline(always)]
    pub fn start_with_histogram(histogram: Arc<Histogram>) -> Self {
        Self {
            start: TimePoint::now(),
            histogram: Some(histogram),
        }
    }

    #[inline(always)]
    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed_ns()
    }

    #[inline(always)]
    fn record(&self, elapsed: u64) {
        if let Some(histogram) = &self.histogram {
            histogram.increment(elapsed);
        }
    }

    /// elapsed time since start, recorded when a histogram is attached
    #[inline(always)]
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ns();
        self.record(elapsed);
        elapsed
    }

    /// records the time since start or the previous lap, then starts over
    #[inline(always)]
    pub fn lap(&mut self) -> u64 {
        let elapsed = self.elapsed_ns();
        self.record(elapsed);
        self.start = TimePoint::now();
        elapsed
    }
}

/// named section timed into one histogram
#[derive(Debug, Clone)]
pub struct ScopedTimer {
    name: &'static str,
    histogram: Arc<Histogram>,
    threshold_ns: u64,
}

impl ScopedTimer {
    pub fn new(name: &'static str, histogram: Arc<Histogram>) -> Self {
        Self {
            name,
            histogram,
            threshold_ns: DEFAULT_SLOW_THRESHOLD_NS,
        }
    }

    /// samples above `threshold_ns` are logged at warn
    pub fn with_threshold(mut self, threshold_ns: u64) -> Self {
        self.threshold_ns = threshold_ns;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// number of samples recorded so far
    pub fn samples(&self) -> u64 {
        self.histogram.population()
    }

    /// runs `f` as one sample of this section
    #[inline(always)]
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.guard();
        f()
    }

    /// starts a sample that ends when the guard drops
    #[inline(always)]
    pub fn guard(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            start: TimePoint::now(),
        }
    }

    /// latency summary of the samples recorded so far
    pub fn stats(&self) -> Result<LatencyStats> {
        LatencyStats::from_distribution(&self.histogram.snapshot())
    }

    fn record(&self, elapsed: u64) {
        self.histogram.increment(elapsed);
        if elapsed > self.threshold_ns {
            warn!(
                "slow {}: {}μs (threshold {}μs)",
                self.name,
                elapsed / 1000,
                self.threshold_ns / 1000
            );
        }
    }
}

/// one in-flight sample of a [`ScopedTimer`], recorded on drop
#[derive(Debug)]
#[must_use = "the sample is recorded when the guard is dropped"]
pub struct TimerGuard<'a> {
    timer: &'a ScopedTimer,
    start: TimePoint,
}

impl TimerGuard<'_> {
    #[inline(always)]
    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed_ns()
    }
}

impl Drop for TimerGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed_ns());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn section(name: &'static str) -> ScopedTimer {
        ScopedTimer::new(name, Arc::new(Histogram::new(6).unwrap()))
    }

    #[test]
    fn test_timer_without_histogram() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(1));
        assert!(timer.elapsed_ns() >= 1_000_000);
        assert!(timer.stop() >= 1_000_000);
    }

    #[test]
    fn test_timer_records_stop_and_laps() {
        let histogram = Arc::new(Histogram::new(6).unwrap());
        let mut timer = Timer::start_with_histogram(Arc::clone(&histogram));
        thread::sleep(Duration::from_millis(2));
        let first = timer.lap();
        let second = timer.lap();
        timer.stop();

        assert!(first >= 2_000_000);
        // lap restarts the clock
        assert!(second < first);
        assert_eq!(histogram.population(), 3);
    }

    #[test]
    fn test_guard_records_on_drop() {
        let timer = section("sleep");
        {
            let guard = timer.guard();
            thread::sleep(Duration::from_millis(2));
            assert!(guard.elapsed_ns() >= 2_000_000);
            assert_eq!(timer.samples(), 0);
        }
        assert_eq!(timer.samples(), 1);
        // bucket lower bound is within 2^-6 of the real value
        assert!(timer.stats().unwrap().min > 1_900_000);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let timer = section("sum").with_threshold(u64::MAX);
        let result = timer.time(|| (1..=10u64).sum::<u64>());
        assert_eq!(result, 55);
        assert_eq!(timer.samples(), 1);
        assert_eq!(timer.name(), "sum");
    }

    #[test]
    fn test_slow_sample_is_still_recorded() {
        let timer = section("slow").with_threshold(0);
        timer.time(|| thread::sleep(Duration::from_micros(50)));
        assert_eq!(timer.stats().unwrap().count, 1);
    }

    #[test]
    fn test_stats_empty_section() {
        assert_eq!(section("idle").stats(), Err(hg64::Error::Empty));
    }

    #[test]
    fn test_shared_across_threads() {
        let timer = section("spin");
        thread::scope(|scope| {
            for _ in 0..4 {
                let timer = timer.clone();
                scope.spawn(move || {
                    for _ in 0..100 {
                        timer.time(|| std::hint::black_box(7 * 6));
                    }
                });
            }
        });
        assert_eq!(timer.samples(), 400);
    }
}
