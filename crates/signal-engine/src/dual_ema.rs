//! Dual-EMA crossover signal computation.

use crate::params::{DualEmaParams, StrategyParams};
use crate::signal::{Position, SignalRecord, TradeSignal};
use binance_core::types::Candle;
use binance_core::Result;

/// Exponential moving average of the closes, smoothing `2 / (span + 1)`,
/// seeded from the first value with no warm-up bias correction.
fn ema(closes: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(closes.len());
    let mut prev = match closes.first() {
        Some(first) => *first,
        None => return out,
    };
    out.push(prev);
    for close in &closes[1..] {
        prev = alpha * close + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Annotate a candle series with dual-EMA crossover signals.
///
/// Pure and deterministic. The raw crossover direction at bar `t` becomes
/// the tradable position at bar `t + 1` (decide at close, act at next
/// open); the first bar holds no prior signal and is flat. An empty series
/// yields an empty result.
pub fn compute(candles: &[Candle], params: &DualEmaParams) -> Vec<SignalRecord> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast_ema = ema(&closes, params.fast());
    let slow_ema = ema(&closes, params.slow());

    let mut records = Vec::with_capacity(candles.len());
    let mut prev_direction = None;
    let mut prev_position = Position::Flat;

    for (idx, candle) in candles.iter().enumerate() {
        let direction = Position::from_crossover(fast_ema[idx], slow_ema[idx]);
        // One-bar lag: hold the direction decided at the previous close.
        let position = prev_direction.unwrap_or(Position::Flat);
        records.push(SignalRecord {
            open_time: candle.open_time,
            close: candle.close,
            fast_ema: fast_ema[idx],
            slow_ema: slow_ema[idx],
            direction,
            position,
            signal: TradeSignal::from_transition(prev_position, position),
        });
        prev_direction = Some(direction);
        prev_position = position;
    }

    records
}

/// Registry adapter for [`compute`].
pub fn dual_ema_signal(candles: &[Candle], params: &StrategyParams) -> Result<Vec<SignalRecord>> {
    Ok(compute(candles, params.as_dual_ema()?))
}
