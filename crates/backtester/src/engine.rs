//! Backtest engine: position series to fee-adjusted equity curve.

use binance_core::types::Candle;
use binance_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signal_engine::{registry, Position, SignalRecord, StrategyParams};
use tracing::info;

/// Result of one backtest run. Immutable, owned by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub params: StrategyParams,
    /// Fractional profit-and-loss (0.05 = +5%).
    pub pnl: f64,
    /// Count of position changes, in units of |Δposition|.
    pub trades: u32,
    /// Cumulative equity per bar, starting from 1.0.
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
    /// The full annotated series the positions came from.
    pub records: Vec<SignalRecord>,
}

/// Evaluate a position series against a candle series.
///
/// Per-bar price return is the percentage change of close (zero for the
/// first bar). The strategy return at bar `t` applies the position held
/// through the bar (`position[t-1]`, already lagged by the signal engine)
/// to the realized return, minus `fee_pct` per unit of position change.
/// Deterministic; an all-flat series yields zero PnL and zero trades.
pub fn evaluate(
    candles: &[Candle],
    positions: &[Position],
    fee_pct: f64,
) -> Result<(Vec<(DateTime<Utc>, f64)>, f64, u32)> {
    if candles.len() != positions.len() {
        return Err(Error::InvalidData(format!(
            "position series length {} does not match candle series length {}",
            positions.len(),
            candles.len()
        )));
    }

    let mut equity = 1.0_f64;
    let mut curve = Vec::with_capacity(candles.len());
    let mut trade_units = 0u32;

    for t in 0..candles.len() {
        let strat_ret = if t == 0 {
            0.0
        } else {
            let ret = candles[t].close / candles[t - 1].close - 1.0;
            let held = positions[t - 1].as_i8() as f64;
            let delta = (positions[t].as_i8() - positions[t - 1].as_i8()).unsigned_abs() as u32;
            trade_units += delta;
            held * ret - fee_pct * delta as f64
        };
        equity *= 1.0 + strat_ret;
        curve.push((candles[t].open_time, equity));
    }

    Ok((curve, equity - 1.0, trade_units))
}

/// Run a strategy over a candle series and evaluate it net of fees.
pub fn run_backtest(
    candles: &[Candle],
    strategy: &str,
    params: &StrategyParams,
    fee_pct: f64,
) -> Result<BacktestReport> {
    let signal_fn = registry::get(strategy)?;
    if candles.is_empty() {
        return Err(Error::InvalidData(
            "no candles available for the requested range".to_string(),
        ));
    }

    let records = signal_fn(candles, params)?;
    let positions: Vec<Position> = records.iter().map(|r| r.position).collect();
    let (equity_curve, pnl, trades) = evaluate(candles, &positions, fee_pct)?;

    info!(
        strategy = strategy,
        params = %params,
        pnl = pnl,
        trades = trades,
        bars = candles.len(),
        "Backtest completed"
    );

    Ok(BacktestReport {
        params: *params,
        pnl,
        trades,
        equity_curve,
        records,
    })
}
