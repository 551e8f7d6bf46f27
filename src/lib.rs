//! EMA-Bot: Dual-EMA Crossover Trading for Binance USDⓈ-M Futures
//!
//! This is the root crate that wires the workspace together for the CLI
//! binary. For library use, depend on the individual crates directly:
//!
//! - `binance-core`: Shared types, configuration, REST/WebSocket clients
//! - `signal-engine`: Strategy registry and signal computation
//! - `backtester`: Historical simulation and parameter search
//! - `trading-engine`: Live execution controller and order routing

pub use backtester;
pub use binance_core as core;
pub use signal_engine as signals;
pub use trading_engine as trading;
