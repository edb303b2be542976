//! histogram precision configuration.

use crate::codec::{Codec, MAX_SIGBITS, MIN_SIGBITS};
use crate::error::{Error, Result};

/// precision used by `HistogramConfig::default()`, about 3% worst-case error.
pub const DEFAULT_SIGBITS: u32 = 5;

/// configuration for a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramConfig {
    /// significant bits kept from each value.
    pub sigbits: u32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            sigbits: DEFAULT_SIGBITS,
        }
    }
}

impl HistogramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// set significant bits.
    pub fn with_sigbits(mut self, sigbits: u32) -> Self {
        self.sigbits = sigbits;
        self
    }

    /// set precision from a number of significant decimal digits.
    ///
    /// rounds up, so the histogram is at least as precise as asked.
    pub fn with_significant_digits(mut self, digits: u32) -> Self {
        self.sigbits = digits_to_bits(digits as f64).ceil() as u32;
        self
    }

    /// worst-case relative error of a bucket.
    pub fn relative_error(&self) -> f64 {
        1.0 / (1u64 << self.sigbits.min(63)) as f64
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SIGBITS..=MAX_SIGBITS).contains(&self.sigbits) {
            return Err(Error::InvalidSigbits {
                sigbits: self.sigbits,
            });
        }
        Ok(())
    }

    pub(crate) fn codec(&self) -> Result<Codec> {
        Codec::new(self.sigbits)
    }
}

/// converts a count of significant digits between number bases.
///
/// returns NaN for bases below 2 or fewer than one digit.
pub fn convert_significance(digits: f64, from_base: u32, to_base: u32) -> f64 {
    if from_base < 2 || to_base < 2 || digits < 1.0 {
        return f64::NAN;
    }
    let factor = (from_base as f64).ln() / (to_base as f64).ln();
    1.0 - (1.0 - digits) * factor
}

/// significant decimal digits to significant bits.
pub fn digits_to_bits(digits: f64) -> f64 {
    convert_significance(digits, 10, 2)
}

/// significant bits to significant decimal digits.
pub fn bits_to_digits(bits: f64) -> f64 {
    convert_significance(bits, 2, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HistogramConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sigbits, DEFAULT_SIGBITS);
        assert_eq!(config.relative_error(), 1.0 / 32.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = HistogramConfig::new().with_sigbits(9);
        assert_eq!(config.sigbits, 9);
        assert_eq!(config.codec().unwrap().mantissas(), 512);
    }

    #[test]
    fn test_invalid_sigbits() {
        assert_eq!(
            HistogramConfig::new().with_sigbits(0).validate(),
            Err(Error::InvalidSigbits { sigbits: 0 })
        );
        assert!(HistogramConfig::new().with_sigbits(16).validate().is_err());
    }

    #[test]
    fn test_significant_digits() {
        // one decimal digit needs exactly one bit
        assert_eq!(HistogramConfig::new().with_significant_digits(1).sigbits, 1);
        // 2 digits = 4.32 bits, 3 digits = 7.64 bits
        assert_eq!(HistogramConfig::new().with_significant_digits(2).sigbits, 5);
        assert_eq!(HistogramConfig::new().with_significant_digits(3).sigbits, 8);
        assert!(HistogramConfig::new()
            .with_significant_digits(6)
            .validate()
            .is_err());
    }

    #[test]
    fn test_convert_significance() {
        assert!(convert_significance(0.5, 10, 2).is_nan());
        assert!(convert_significance(3.0, 1, 2).is_nan());
        let bits = digits_to_bits(4.0);
        assert!((bits_to_digits(bits) - 4.0).abs() < 1e-9);
    }
}
