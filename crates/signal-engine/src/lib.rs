//! Signal Engine
//!
//! Maps candle series and strategy parameters to position series and
//! transition labels. Strategies are pure functions registered by name; the
//! backtester and the live trader drive the same computation.

pub mod dual_ema;
pub mod params;
pub mod registry;
pub mod signal;

pub use params::{DualEmaParams, StrategyParams};
pub use registry::SignalFn;
pub use signal::{Position, SignalRecord, TradeSignal};
