//! rank and quantile estimation.
//!
//! ranks are found with a two level scan: whole bins are skipped using their
//! totals, then keys inside the chosen bin are walked. the position inside a
//! bucket is linearly interpolated between its min and max.

use crate::codec::BINS;
use crate::distribution::Distribution;
use crate::error::{Error, Result};

/// `range * mul / div` in floating point, truncated.
///
/// a zero `div` counts as the whole range.
#[inline]
fn interpolate(range: u64, mul: u64, div: u64) -> u64 {
    let frac = if div == 0 {
        1.0
    } else {
        (mul as f64 / div as f64).min(1.0)
    };
    // f64 rounding can step past `range` near 2^64
    ((range as f64 * frac) as u64).min(range)
}

pub(crate) fn value_at_rank<D: Distribution + ?Sized>(dist: &D, rank: u64) -> Result<u64> {
    let codec = dist.codec();

    // read each total once so the bin scan agrees with the bounds check
    let totals: [u64; BINS] = std::array::from_fn(|bin| dist.bin_total(bin));
    let population: u64 = totals.iter().sum();
    if rank >= population {
        return Err(Error::RankOutOfRange { rank, population });
    }

    let mut rank = rank;
    let mut bin = 0;
    while rank >= totals[bin] {
        rank -= totals[bin];
        bin += 1;
    }

    let last = codec.first_key(bin) + codec.mantissas() - 1;
    let mut key = codec.first_key(bin);
    let mut count = dist.count(key);
    // a live histogram can show a total ahead of its counters; the scan
    // then stops at the bin's last key and lands on its max
    while rank >= count && key < last {
        rank -= count;
        key += 1;
        count = dist.count(key);
    }

    let min = codec.min_of(key);
    let max = codec.max_of(key);
    Ok(min + interpolate(max - min, rank, count))
}

pub(crate) fn rank_of_value<D: Distribution + ?Sized>(dist: &D, value: u64) -> u64 {
    let codec = dist.codec();
    let key = codec.key_of(value);
    let bin = codec.bin_of(key);

    let below_bin: u64 = (0..bin).map(|b| dist.bin_total(b)).sum();
    let below_key: u64 = (codec.first_key(bin)..key).map(|k| dist.count(k)).sum();

    let min = codec.min_of(key);
    let max = codec.max_of(key);
    let within = interpolate(dist.count(key), value - min, max - min);

    below_bin + below_key + within
}

pub(crate) fn value_at_quantile<D: Distribution + ?Sized>(dist: &D, quantile: f64) -> Result<u64> {
    if quantile.is_nan() {
        return Err(Error::InvalidQuantile);
    }
    let population = dist.population();
    if population == 0 {
        return Err(Error::Empty);
    }
    let quantile = quantile.clamp(0.0, 1.0);
    // quantile 1.0 means the largest recorded value
    let rank = ((quantile * population as f64).round() as u64).min(population - 1);
    value_at_rank(dist, rank)
}

pub(crate) fn quantile_of_value<D: Distribution + ?Sized>(dist: &D, value: u64) -> Result<f64> {
    let population = dist.population();
    if population == 0 {
        return Err(Error::Empty);
    }
    let rank = rank_of_value(dist, value);
    Ok((rank as f64 / population as f64).min(1.0))
}
