//! bucket geometry dump: every key's range and relative error as csv.

use hg64::{Bucket, Distribution};
use std::io::{self, Write};

/// a bucket and its relative width in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketError {
    pub bucket: Bucket,
    pub percent: f64,
}

/// what the csv dump found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExploreSummary {
    /// buckets lying entirely inside the range.
    pub keys: u32,
    /// highest in-range bucket that holds exactly one value.
    pub last_exact: Option<Bucket>,
    /// narrowest in-range bucket holding more than one value.
    pub min_error: Option<BucketError>,
    /// widest in-range bucket.
    pub max_error: Option<BucketError>,
}

/// `(max - min) * 100 / min`, zero for single-value buckets.
pub fn error_percent(bucket: &Bucket) -> f64 {
    let width = bucket.max - bucket.min;
    if width == 0 {
        0.0
    } else {
        width as f64 * 100.0 / bucket.min as f64
    }
}

/// writes `key,pmin,pmax,error,error_percent` for each bucket inside
/// `[min, max]`.
pub fn dump_csv<W, D>(out: &mut W, dist: &D, min: u64, max: u64) -> io::Result<ExploreSummary>
where
    W: Write,
    D: Distribution,
{
    let mut summary = ExploreSummary::default();
    writeln!(out, "key,pmin,pmax,error,error_percent")?;

    for bucket in dist.buckets() {
        if bucket.min < min || bucket.max > max {
            continue;
        }
        summary.keys += 1;

        let percent = error_percent(&bucket);
        if bucket.max == bucket.min {
            summary.last_exact = Some(bucket);
        } else {
            let entry = BucketError { bucket, percent };
            if summary.max_error.map_or(true, |e| percent > e.percent) {
                summary.max_error = Some(entry);
            }
            if summary.min_error.map_or(true, |e| percent < e.percent) {
                summary.min_error = Some(entry);
            }
        }

        writeln!(
            out,
            "{},{},{},{},{:.2}",
            bucket.key,
            bucket.min,
            bucket.max,
            bucket.max - bucket.min,
            percent
        )?;
    }
    Ok(summary)
}

/// human readable lines describing `summary`.
pub fn write_summary<W: Write>(
    out: &mut W,
    sigbits: u32,
    min: u64,
    max: u64,
    summary: &ExploreSummary,
) -> io::Result<()> {
    writeln!(
        out,
        "{sigbits} sigbits: {} keys within range ({min} - {max})",
        summary.keys
    )?;
    if let Some(b) = summary.last_exact {
        writeln!(out, "last value with 0 error: {}, key {}", b.min, b.key)?;
    }
    if let Some(e) = summary.min_error {
        writeln!(
            out,
            "min error for non-precise bucket: {:.2} % (range {} - {}, key {})",
            e.percent, e.bucket.min, e.bucket.max, e.bucket.key
        )?;
    }
    if let Some(e) = summary.max_error {
        writeln!(
            out,
            "max error: {:.2} % (range {} - {}, key {})",
            e.percent, e.bucket.min, e.bucket.max, e.bucket.key
        )?;
    }
    Ok(())
}
