//! Backtester
//!
//! Converts a strategy's position series into a fee-adjusted equity curve
//! and searches parameter space for the most profitable configuration.
//!
//! # Example
//!
//! ```ignore
//! use backtester::{grid_search, run_backtest};
//! use signal_engine::{DualEmaParams, StrategyParams};
//!
//! let params = StrategyParams::DualEma(DualEmaParams::new(20, 50)?);
//! let report = run_backtest(&candles, "dual_ema", &params, 0.0004)?;
//! println!("PnL: {:.2}%", report.pnl * 100.0);
//!
//! let best = grid_search(&candles, "dual_ema", &[10, 15, 20], &[40, 50, 60], 0.0004)?;
//! ```

pub mod engine;
pub mod tuner;

pub use engine::{evaluate, run_backtest, BacktestReport};
pub use tuner::{bayes_search, grid_search, BayesConfig};
