//! Trading Engine
//!
//! Live strategy execution against Binance USDⓈ-M futures: consumes closed
//! klines, recomputes the active strategy over the rolling candle buffer, and
//! routes market orders on every position flip.

pub mod executor;
pub mod live_trader;

pub use executor::{OrderRouter, TradeMode};
pub use live_trader::{LivePhase, LiveTrader, LiveTraderConfig, PositionTransition};
