//! Name-keyed strategy registry.
//!
//! A capability lookup, not inheritance: each named strategy is a pure
//! function from candles and parameters to signal records. The mapping is
//! built once per process and read-only afterwards.

use crate::dual_ema;
use crate::params::StrategyParams;
use crate::signal::SignalRecord;
use binance_core::types::Candle;
use binance_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A registered signal function.
pub type SignalFn = fn(&[Candle], &StrategyParams) -> Result<Vec<SignalRecord>>;

static REGISTRY: OnceLock<BTreeMap<&'static str, SignalFn>> = OnceLock::new();

fn registry() -> &'static BTreeMap<&'static str, SignalFn> {
    REGISTRY.get_or_init(|| {
        let mut map: BTreeMap<&'static str, SignalFn> = BTreeMap::new();
        map.insert("dual_ema", dual_ema::dual_ema_signal as SignalFn);
        map
    })
}

/// Look up a strategy by name.
///
/// An absent name fails fast with the list of available strategies.
pub fn get(name: &str) -> Result<SignalFn> {
    registry()
        .get(name)
        .copied()
        .ok_or_else(|| Error::UnknownStrategy {
            name: name.to_string(),
            available: list().join(", "),
        })
}

/// Names of all registered strategies, sorted.
pub fn list() -> Vec<&'static str> {
    registry().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DualEmaParams;

    #[test]
    fn test_lookup_registered_strategy() {
        let signal_fn = get("dual_ema").unwrap();
        let params = StrategyParams::DualEma(DualEmaParams::new(2, 5).unwrap());
        let records = signal_fn(&[], &params).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unknown_strategy_lists_available() {
        let err = get("golden_cross").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("golden_cross"));
        assert!(message.contains("dual_ema"));
    }

    #[test]
    fn test_list_contains_builtin() {
        assert!(list().contains(&"dual_ema"));
    }
}
