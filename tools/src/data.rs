//! synthetic sample data for benchmarks.
//!
//! draws are unit scale and multiplied by `SCALE`, so samples look like
//! nanosecond latencies around a millisecond. all but pareto and lognormal
//! have mean `SCALE`.

use crate::config::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{ChiSquared, Distribution as _, Exp, Gamma, LogNormal, Normal, Pareto};
use std::fmt;
use std::str::FromStr;

/// multiplier applied to unit-mean samples.
pub const SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataDistribution {
    Uniform,
    Exponential,
    Pareto,
    Gamma,
    Normal,
    LogNormal,
    ChiSquared,
}

impl DataDistribution {
    pub const ALL: [DataDistribution; 7] = [
        DataDistribution::Uniform,
        DataDistribution::Exponential,
        DataDistribution::Pareto,
        DataDistribution::Gamma,
        DataDistribution::Normal,
        DataDistribution::LogNormal,
        DataDistribution::ChiSquared,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DataDistribution::Uniform => "uniform",
            DataDistribution::Exponential => "exponential",
            DataDistribution::Pareto => "pareto",
            DataDistribution::Gamma => "gamma",
            DataDistribution::Normal => "normal",
            DataDistribution::LogNormal => "lognormal",
            DataDistribution::ChiSquared => "chisquared",
        }
    }
}

impl fmt::Display for DataDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataDistribution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownDistribution(s.to_string()))
    }
}

enum Shape {
    Uniform,
    Exponential(Exp<f64>),
    Pareto(Pareto<f64>),
    Gamma(Gamma<f64>),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    ChiSquared(ChiSquared<f64>),
}

fn rejected<E: fmt::Debug>(err: E) -> ConfigError {
    ConfigError::Distribution(format!("{err:?}"))
}

/// seeded source of `u64` samples.
pub struct Sampler {
    rng: StdRng,
    shape: Shape,
}

impl Sampler {
    pub fn new(distribution: DataDistribution, seed: u64) -> Result<Self, ConfigError> {
        let shape = match distribution {
            DataDistribution::Uniform => Shape::Uniform,
            DataDistribution::Exponential => Shape::Exponential(Exp::new(1.0).map_err(rejected)?),
            // shape 1.5 keeps the mean finite (3.0) with a heavy tail
            DataDistribution::Pareto => Shape::Pareto(Pareto::new(1.0, 1.5).map_err(rejected)?),
            DataDistribution::Gamma => Shape::Gamma(Gamma::new(4.0, 0.25).map_err(rejected)?),
            DataDistribution::Normal => Shape::Normal(Normal::new(10.0, 1.0).map_err(rejected)?),
            DataDistribution::LogNormal => {
                Shape::LogNormal(LogNormal::new(0.0, 1.0).map_err(rejected)?)
            }
            DataDistribution::ChiSquared => {
                Shape::ChiSquared(ChiSquared::new(4.0).map_err(rejected)?)
            }
        };
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            shape,
        })
    }

    /// next sample. negative draws clamp to zero, huge ones to `u64::MAX`.
    pub fn next_value(&mut self) -> u64 {
        let unit = match &self.shape {
            Shape::Uniform => return self.rng.gen_range(0..2 * SCALE as u64),
            Shape::Exponential(d) => d.sample(&mut self.rng),
            Shape::Pareto(d) => d.sample(&mut self.rng),
            Shape::Gamma(d) => d.sample(&mut self.rng),
            Shape::Normal(d) => d.sample(&mut self.rng) / 10.0,
            Shape::LogNormal(d) => d.sample(&mut self.rng),
            Shape::ChiSquared(d) => d.sample(&mut self.rng) / 4.0,
        };
        // float to int casts saturate
        (unit * SCALE) as u64
    }
}

/// `count` samples from `distribution`.
pub fn generate(
    distribution: DataDistribution,
    count: usize,
    seed: u64,
) -> Result<Vec<u64>, ConfigError> {
    let mut sampler = Sampler::new(distribution, seed)?;
    Ok((0..count).map(|_| sampler.next_value()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for dist in DataDistribution::ALL {
            assert_eq!(dist.name().parse::<DataDistribution>().unwrap(), dist);
            assert_eq!(dist.to_string(), dist.name());
        }
        assert_eq!("LogNormal".parse::<DataDistribution>().unwrap(), DataDistribution::LogNormal);
        assert!("zipf".parse::<DataDistribution>().is_err());
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let a = generate(DataDistribution::Gamma, 1000, 42).unwrap();
        let b = generate(DataDistribution::Gamma, 1000, 42).unwrap();
        let c = generate(DataDistribution::Gamma, 1000, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_means_near_scale() {
        for dist in [
            DataDistribution::Uniform,
            DataDistribution::Exponential,
            DataDistribution::Gamma,
            DataDistribution::Normal,
            DataDistribution::ChiSquared,
        ] {
            let data = generate(dist, 100_000, 7).unwrap();
            let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64;
            let ratio = mean / SCALE;
            assert!((0.9..1.1).contains(&ratio), "{dist}: mean ratio {ratio}");
        }
    }

    #[test]
    fn test_pareto_floor() {
        let data = generate(DataDistribution::Pareto, 10_000, 3).unwrap();
        assert!(data.iter().all(|&v| v >= SCALE as u64));
    }
}
