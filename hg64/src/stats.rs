//! summary statistics.

use crate::distribution::{Distribution, MeanVariance};
use crate::error::{Error, Result};

/// weighted streaming mean and variance over bucket midpoints.
///
/// updates the running mean per bucket (west's weighted variant of welford)
/// instead of summing `value * count` and `value^2 * count`, which lose
/// precision badly across the full `u64` range.
pub(crate) fn mean_variance<D: Distribution + ?Sized>(dist: &D) -> Result<MeanVariance> {
    let codec = dist.codec();
    let mut weight = 0.0f64;
    let mut mean = 0.0f64;
    let mut squares = 0.0f64;

    for bin in 0..codec.bins() {
        if dist.bin_total(bin) == 0 {
            continue;
        }
        let first = codec.first_key(bin);
        for key in first..first + codec.mantissas() {
            let count = dist.count(key);
            if count == 0 {
                continue;
            }
            let min = codec.min_of(key);
            let max = codec.max_of(key);
            let value = min as f64 + (max - min) as f64 / 2.0;
            let count = count as f64;

            weight += count;
            let delta = value - mean;
            mean += delta * count / weight;
            squares += count * delta * (value - mean);
        }
    }

    if weight == 0.0 {
        return Err(Error::Empty);
    }
    Ok(MeanVariance {
        mean,
        variance: squares / weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Histogram;

    #[test]
    fn test_empty_is_undefined() {
        let hist = Histogram::new(4).unwrap();
        assert_eq!(hist.mean_variance(), Err(Error::Empty));
    }

    #[test]
    fn test_exact_buckets() {
        let hist = Histogram::new(6).unwrap();
        hist.add(10, 1);
        hist.add(20, 1);
        hist.add(30, 2);
        let mv = hist.mean_variance().unwrap();
        assert!((mv.mean - 22.5).abs() < 1e-9);
        // ((12.5^2) + (2.5^2) + 2 * (7.5^2)) / 4
        assert!((mv.variance - 68.75).abs() < 1e-9);
        assert!((mv.std_dev() - 68.75f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_value() {
        let hist = Histogram::new(5).unwrap();
        hist.add(1 << 40, 1000);
        let mv = hist.mean_variance().unwrap();
        assert!(mv.variance.abs() < 1e-3);
        let rel = (mv.mean - (1u64 << 40) as f64).abs() / (1u64 << 40) as f64;
        assert!(rel < 1.0 / 32.0);
    }

    #[test]
    fn test_uniform_million() {
        let hist = Histogram::new(4).unwrap();
        for value in 0..1_000_000u64 {
            hist.increment(value);
        }
        assert_eq!(hist.population(), 1_000_000);

        let first = hist.get(0).unwrap();
        assert_eq!((first.min, first.max, first.count), (0, 0, 1));

        let mv = hist.mean_variance().unwrap();
        let true_mean = 499_999.5;
        assert!((mv.mean - true_mean).abs() / true_mean < 0.001, "mean {}", mv.mean);

        let true_variance = (1e12 - 1.0) / 12.0;
        assert!(
            (mv.variance - true_variance).abs() / true_variance < 0.01,
            "variance {}",
            mv.variance
        );
    }

    #[test]
    fn test_huge_values_stay_finite() {
        let hist = Histogram::new(10).unwrap();
        hist.add(u64::MAX, 5);
        hist.add(1, 5);
        let mv = hist.mean_variance().unwrap();
        assert!(mv.mean.is_finite());
        assert!(mv.variance.is_finite());
        assert!(mv.variance > 0.0);
    }
}
