//! Volatility classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Average absolute 24h change (in percent) below which a market is calm.
pub const LOW_THRESHOLD: f64 = 1.5;
/// Average absolute 24h change (in percent) below which a market is moderate.
pub const MODERATE_THRESHOLD: f64 = 3.0;

/// Coarse volatility level of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityBand {
    Low,
    Moderate,
    High,
}

impl VolatilityBand {
    /// Band for a volatility index.
    pub fn from_index(index: f64) -> Self {
        if index < LOW_THRESHOLD {
            VolatilityBand::Low
        } else if index < MODERATE_THRESHOLD {
            VolatilityBand::Moderate
        } else {
            VolatilityBand::High
        }
    }
}

impl fmt::Display for VolatilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolatilityBand::Low => "Low",
            VolatilityBand::Moderate => "Moderate",
            VolatilityBand::High => "High",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(VolatilityBand::from_index(0.0), VolatilityBand::Low);
        assert_eq!(VolatilityBand::from_index(1.49), VolatilityBand::Low);
        assert_eq!(VolatilityBand::from_index(1.5), VolatilityBand::Moderate);
        assert_eq!(VolatilityBand::from_index(2.99), VolatilityBand::Moderate);
        assert_eq!(VolatilityBand::from_index(3.0), VolatilityBand::High);
        assert_eq!(VolatilityBand::High.to_string(), "High");
    }
}
