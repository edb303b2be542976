//! hg64-bench: concurrent load benchmark and accuracy report.
//!
//! generate -> load (threads) -> validate -> summarize -> compare -> merge

use hg64::{Distribution, Histogram, SparseHistogram, MAX_SIGBITS, MIN_SIGBITS};
use hg64_timing::{LatencyStats, ScopedTimer, TimePoint, Timer};
use hg64_tools::config::BenchConfig;
use hg64_tools::data::generate;
use hg64_tools::report::{check_merge, compare_quantiles, standard_quantiles, summarize};
use log::{debug, info};
use std::env;
use std::sync::Arc;
use std::thread;

fn usage() -> ! {
    eprintln!(
        "usage: hg64-bench [--sigbits N] [--threads N] [--samples N] [--dist NAME] \
         [--seed N] [--batch N]"
    );
    eprintln!(
        "distributions: uniform exponential pareto gamma normal lognormal chisquared"
    );
    std::process::exit(2);
}

fn fail(what: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("[bench] {} failed: {}", what, e);
    std::process::exit(1);
}

/// snapshot captures timed per run.
const SNAPSHOT_ROUNDS: usize = 16;

fn section(name: &'static str) -> ScopedTimer {
    let histogram =
        Histogram::new(hg64::DEFAULT_SIGBITS).unwrap_or_else(|e| fail("create", e));
    ScopedTimer::new(name, Arc::new(histogram))
}

fn main() {
    hg64_tools::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
    }
    let config = match BenchConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[bench] {}", e);
            usage();
        }
    };
    let seed = config.seed.unwrap_or_else(rand::random);

    eprintln!("[bench] starting");
    eprintln!("[bench] sigbits={}", config.histogram.sigbits);
    eprintln!("[bench] threads={}", config.threads);
    eprintln!("[bench] samples={}", config.samples);
    eprintln!("[bench] dist={} seed={}", config.distribution, seed);

    let mut data = generate(config.distribution, config.samples, seed)
        .unwrap_or_else(|e| fail("generate", e));

    let hist = Histogram::with_config(config.histogram).unwrap_or_else(|e| fail("create", e));
    // per-batch load latency, itself an hg64 histogram
    let batches = Arc::new(Histogram::new(hg64::DEFAULT_SIGBITS).unwrap_or_else(|e| fail("create", e)));

    let chunk = config.samples.div_ceil(config.threads);
    let start = TimePoint::now();
    thread::scope(|scope| {
        for (id, slice) in data.chunks(chunk).enumerate() {
            let hist = &hist;
            let batches = Arc::clone(&batches);
            let batch = config.batch;
            scope.spawn(move || {
                let mut timer = Timer::start_with_histogram(batches);
                for values in slice.chunks(batch) {
                    for &value in values {
                        hist.increment(value);
                    }
                    timer.lap();
                }
                debug!("loader {} done with {} samples", id, slice.len());
            });
        }
    });
    let nanos = start.elapsed_ns();
    println!(
        "{:.6} load time {:.2} ns per item",
        nanos as f64 / 1e9,
        nanos as f64 / config.samples as f64
    );

    let validating = section("validate");
    let snapshotting = section("snapshot");
    let merging = section("merge").with_threshold(100_000_000);

    validating.time(|| hist.validate());
    info!("histogram valid after load");

    let mut snapshot = snapshotting.time(|| hist.snapshot());
    for _ in 1..SNAPSHOT_ROUNDS {
        snapshot = snapshotting.time(|| hist.snapshot());
    }
    match summarize(&snapshot, hist.size_in_bytes()) {
        Ok(summary) => println!("{summary}"),
        Err(e) => fail("summarize", e),
    }

    match LatencyStats::from_distribution(&batches.snapshot()) {
        Ok(stats) => println!("batch of {}: {}", config.batch, stats.format()),
        Err(e) => fail("batch stats", e),
    }

    data.sort_unstable();
    let rows = compare_quantiles(&data, &snapshot, &standard_quantiles())
        .unwrap_or_else(|e| fail("compare", e));
    for row in rows {
        println!("{row}");
    }

    let sigbits = config.histogram.sigbits;
    let coarse = sigbits.saturating_sub(2).max(MIN_SIGBITS);
    let fine = (sigbits + 2).min(MAX_SIGBITS);
    let mut lost = false;
    for target in [coarse, fine] {
        let check = merging
            .time(|| check_merge(&snapshot, target))
            .unwrap_or_else(|e| fail("merge", e));
        lost |= !check.conserved();
        println!("{check}");
    }

    // single threaded sparse load for comparison
    let mut sparse = SparseHistogram::with_config(config.histogram)
        .unwrap_or_else(|e| fail("create", e));
    let loading = Timer::start();
    for &value in &data {
        sparse.increment(value);
    }
    let nanos = loading.stop();
    {
        let guard = validating.guard();
        sparse.validate();
        debug!("sparse validated in {}ns", guard.elapsed_ns());
    }
    println!(
        "sparse: {} bytes, {} buckets, load {:.2} ns per item (sorted)",
        sparse.size_in_bytes(),
        sparse.bucket_count(),
        nanos as f64 / config.samples as f64
    );
    if sparse.population() != snapshot.population() {
        lost = true;
        eprintln!(
            "[bench] sparse population {} != {}",
            sparse.population(),
            snapshot.population()
        );
    }

    for timer in [&validating, &snapshotting, &merging] {
        match timer.stats() {
            Ok(stats) => println!("{}: {}", timer.name(), stats.format()),
            Err(e) => fail(timer.name(), e),
        }
    }

    if lost {
        eprintln!("[bench] samples lost");
        std::process::exit(1);
    }
    eprintln!("[bench] done");
}
