//! Strategy parameter types.
//!
//! Parameters form a tagged sum type with per-variant construction-time
//! validation. Adding a strategy means adding a variant plus a registry
//! entry; invariants are enforced by constructors, so fields stay private.

use binance_core::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Parameters for one of the registered strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyParams {
    DualEma(DualEmaParams),
}

impl fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyParams::DualEma(p) => write!(f, "{}", p),
        }
    }
}

/// Fast/slow EMA spans for the dual-EMA crossover strategy.
///
/// Invariant: `1 <= fast < slow`, checked at construction. A violating pair
/// never yields a usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DualEmaParams {
    fast: usize,
    slow: usize,
}

impl DualEmaParams {
    pub fn new(fast: usize, slow: usize) -> Result<Self> {
        if fast < 1 {
            return Err(Error::InvalidParams(format!(
                "fast span must be at least 1, got {}",
                fast
            )));
        }
        if fast >= slow {
            return Err(Error::InvalidParams(format!(
                "fast must be < slow, got fast={} slow={}",
                fast, slow
            )));
        }
        Ok(Self { fast, slow })
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }
}

impl fmt::Display for DualEmaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fast={} slow={}", self.fast, self.slow)
    }
}

impl StrategyParams {
    /// The dual-EMA variant, or an error for strategies expecting other
    /// parameters.
    pub fn as_dual_ema(&self) -> Result<&DualEmaParams> {
        match self {
            StrategyParams::DualEma(p) => Ok(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        let params = DualEmaParams::new(20, 50).unwrap();
        assert_eq!(params.fast(), 20);
        assert_eq!(params.slow(), 50);
    }

    #[test]
    fn test_fast_equal_slow_fails() {
        assert!(DualEmaParams::new(20, 20).is_err());
    }

    #[test]
    fn test_fast_greater_than_slow_fails() {
        assert!(DualEmaParams::new(50, 20).is_err());
    }

    #[test]
    fn test_zero_fast_fails() {
        assert!(DualEmaParams::new(0, 10).is_err());
    }

    #[test]
    fn test_display() {
        let params = DualEmaParams::new(2, 5).unwrap();
        assert_eq!(params.to_string(), "fast=2 slow=5");
    }
}
