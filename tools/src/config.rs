//! configuration for the command line tools.
//!
//! flags take `--name value` form and fall back to environment variables.

use crate::data::DataDistribution;
use hg64::HistogramConfig;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing argument: {0}")]
    Missing(&'static str),

    #[error("invalid value for {flag}: {value:?}")]
    Invalid { flag: &'static str, value: String },

    #[error("unknown distribution: {0}")]
    UnknownDistribution(String),

    #[error("range is empty: min {min} must be below max {max}")]
    EmptyRange { min: u64, max: u64 },

    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error("distribution parameters rejected: {0}")]
    Distribution(String),

    #[error(transparent)]
    Histogram(#[from] hg64::Error),
}

/// value following `flag` in `args`.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn lookup(args: &[String], flag: &str, var: &str) -> Option<String> {
    arg_value(args, flag).or_else(|| env::var(var).ok())
}

fn parse<T: FromStr>(flag: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        flag,
        value: value.to_string(),
    })
}

/// configuration for `hg64-explore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreConfig {
    /// significant bits of the histogram to explore.
    pub sigbits: u32,
    /// only buckets entirely at or above this value are listed.
    pub min: u64,
    /// only buckets entirely at or below this value are listed.
    pub max: u64,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            sigbits: hg64::DEFAULT_SIGBITS,
            min: 0,
            max: u64::MAX,
        }
    }
}

impl ExploreConfig {
    /// parses `sigbits [min] [max]` positional arguments. `sigbits` may
    /// come from `HG64_SIGBITS` instead.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let mut positional = args.iter().skip(1).map(String::as_str);

        let sigbits = match positional.next() {
            Some(value) => parse("sigbits", value)?,
            None => match env::var("HG64_SIGBITS") {
                Ok(value) => parse("sigbits", &value)?,
                Err(_) => return Err(ConfigError::Missing("sigbits")),
            },
        };

        let mut config = Self::default().with_sigbits(sigbits);
        if let Some(value) = positional.next() {
            config.min = parse("min", value)?;
        }
        if let Some(value) = positional.next() {
            config.max = parse("max", value)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_sigbits(mut self, sigbits: u32) -> Self {
        self.sigbits = sigbits;
        self
    }

    pub fn with_range(mut self, min: u64, max: u64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        HistogramConfig::new().with_sigbits(self.sigbits).validate()?;
        if self.min >= self.max {
            return Err(ConfigError::EmptyRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// configuration for `hg64-bench`.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// histogram precision.
    pub histogram: HistogramConfig,
    /// writer threads sharing one histogram.
    pub threads: usize,
    /// total samples across all threads.
    pub samples: usize,
    /// shape of the generated data.
    pub distribution: DataDistribution,
    /// rng seed, random when absent.
    pub seed: Option<u64>,
    /// samples per timed batch.
    pub batch: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            histogram: HistogramConfig::default(),
            threads: std::thread::available_parallelism().map_or(4, |n| n.get()),
            samples: 1_000_000,
            distribution: DataDistribution::Exponential,
            seed: None,
            batch: 1024,
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// parses `--sigbits`, `--threads`, `--samples`, `--dist`, `--seed` and
    /// `--batch`, falling back to `HG64_*` environment variables.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(args, "--sigbits", "HG64_SIGBITS") {
            config = config.with_sigbits(parse("--sigbits", &value)?);
        }
        if let Some(value) = lookup(args, "--threads", "HG64_THREADS") {
            config = config.with_threads(parse("--threads", &value)?);
        }
        if let Some(value) = lookup(args, "--samples", "HG64_SAMPLES") {
            config = config.with_samples(parse("--samples", &value)?);
        }
        if let Some(value) = lookup(args, "--dist", "HG64_DIST") {
            config = config.with_distribution(value.parse()?);
        }
        if let Some(value) = lookup(args, "--seed", "HG64_SEED") {
            config = config.with_seed(parse("--seed", &value)?);
        }
        if let Some(value) = lookup(args, "--batch", "HG64_BATCH") {
            config.batch = parse("--batch", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_sigbits(mut self, sigbits: u32) -> Self {
        self.histogram = self.histogram.with_sigbits(sigbits);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_distribution(mut self, distribution: DataDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.histogram.validate()?;
        if self.threads == 0 {
            return Err(ConfigError::Zero("threads"));
        }
        if self.samples == 0 {
            return Err(ConfigError::Zero("samples"));
        }
        if self.batch == 0 {
            return Err(ConfigError::Zero("batch"));
        }
        Ok(())
    }
}
