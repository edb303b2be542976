use thiserror::Error;

/// errors returned by histogram construction and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("sigbits must be between 1 and 15, got {sigbits}")]
    InvalidSigbits { sigbits: u32 },

    #[error("rank {rank} is out of range for population {population}")]
    RankOutOfRange { rank: u64, population: u64 },

    #[error("histogram is empty")]
    Empty,

    #[error("quantile is not a number")]
    InvalidQuantile,
}

pub type Result<T> = std::result::Result<T, Error>;
