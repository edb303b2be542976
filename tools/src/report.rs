//! benchmark reporting: histogram summaries, data vs histogram quantiles and
//! merge conservation checks.

use hg64::{Distribution, Error, Histogram, Result};
use std::fmt;

/// shape of a loaded histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub bytes: usize,
    /// buckets with a non-zero count.
    pub buckets: usize,
    /// largest single bucket count.
    pub largest: u64,
    pub samples: u64,
    pub mean: f64,
    pub sigma: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} bytes", self.bytes)?;
        writeln!(f, "{} buckets", self.buckets)?;
        writeln!(f, "{} largest", self.largest)?;
        writeln!(f, "{} samples", self.samples)?;
        writeln!(f, "{:.6} mu", self.mean)?;
        write!(f, "{:.6} sigma", self.sigma)
    }
}

/// summarises `dist`. `bytes` is whatever memory figure the caller reports.
pub fn summarize<D: Distribution>(dist: &D, bytes: usize) -> Result<Summary> {
    let stats = dist.mean_variance()?;
    let (buckets, largest) = dist
        .populated()
        .fold((0, 0), |(n, max), b| (n + 1, max.max(b.count)));
    Ok(Summary {
        bytes,
        buckets,
        largest,
        samples: dist.population(),
        mean: stats.mean,
        sigma: stats.std_dev(),
    })
}

/// 0% to 80% in tenths, 90% to 98% in hundredths, 99% to 99.8% in
/// thousandths, then 99.9%, 99.99% and 99.999%.
pub fn standard_quantiles() -> Vec<f64> {
    let mut quantiles = Vec::with_capacity(30);
    let mut q = 0.0;
    for exponent in 1..=3 {
        let step = 10f64.powi(-exponent);
        for _ in 0..9 {
            quantiles.push(q);
            q += step;
        }
    }
    quantiles.extend([0.999, 0.9999, 0.99999]);
    quantiles
}

/// one quantile measured on the raw data and on the histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileRow {
    pub quantile: f64,
    /// exact value at this quantile of the sorted data.
    pub data: u64,
    /// histogram's quantile estimate for `data`.
    pub rank_quantile: f64,
    /// histogram's value estimate at `quantile`.
    pub histogram: u64,
    /// `(data - histogram) / data`.
    pub error: f64,
}

impl fmt::Display for QuantileRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data  {:5.1}% {:<10}  histo {:5.1}% {:<10}  error {:+.6}",
            self.quantile * 100.0,
            self.data,
            self.rank_quantile * 100.0,
            self.histogram,
            self.error
        )
    }
}

/// compares exact quantiles of `sorted` with the estimates from `dist`.
pub fn compare_quantiles<D: Distribution>(
    sorted: &[u64],
    dist: &D,
    quantiles: &[f64],
) -> Result<Vec<QuantileRow>> {
    let last = sorted.len().checked_sub(1).ok_or(Error::Empty)?;
    quantiles
        .iter()
        .map(|&quantile| {
            let index = ((quantile * sorted.len() as f64) as usize).min(last);
            let data = sorted[index];
            let histogram = dist.value_at_quantile(quantile)?;
            let error = if data == 0 {
                0.0
            } else {
                (data as f64 - histogram as f64) / data as f64
            };
            Ok(QuantileRow {
                quantile,
                data,
                rank_quantile: dist.quantile_of_value(data)?,
                histogram,
                error,
            })
        })
        .collect()
}

/// outcome of merging a source into a fresh histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCheck {
    pub sigbits: u32,
    pub source_population: u64,
    pub merged_population: u64,
    pub buckets: usize,
}

impl MergeCheck {
    pub fn conserved(&self) -> bool {
        self.source_population == self.merged_population
    }
}

impl fmt::Display for MergeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merge into {} sigbits: {} of {} samples in {} buckets ({})",
            self.sigbits,
            self.merged_population,
            self.source_population,
            self.buckets,
            if self.conserved() { "ok" } else { "LOST" }
        )
    }
}

/// merges `source` into a new histogram with `sigbits` and validates it.
pub fn check_merge<D: Distribution>(source: &D, sigbits: u32) -> Result<MergeCheck> {
    let target = Histogram::new(sigbits)?;
    target.merge(source);
    target.validate();
    Ok(MergeCheck {
        sigbits,
        source_population: source.population(),
        merged_population: target.population(),
        buckets: target.populated().count(),
    })
}
