//! Position and transition-label types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Directional exposure held during a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i8)]
pub enum Position {
    Short = -1,
    Flat = 0,
    Long = 1,
}

impl Position {
    pub fn as_i8(&self) -> i8 {
        *self as i8
    }

    /// Raw crossover direction: fast above slow is long, otherwise short.
    ///
    /// Ties (`fast == slow`) resolve to short, including the always-tied
    /// first bar of a series. Downstream sequences depend on this.
    pub fn from_crossover(fast_ema: f64, slow_ema: f64) -> Self {
        if fast_ema > slow_ema {
            Position::Long
        } else {
            Position::Short
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Transition label derived from an adjacent (previous, current) position
/// pair. Pairs outside the 6-row table (including no change) carry no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSignal {
    Buy,
    Sell,
    SellBuy,
    BuySell,
    None,
}

impl TradeSignal {
    pub fn from_transition(prev: Position, curr: Position) -> Self {
        use Position::*;
        match (prev, curr) {
            (Flat, Long) => TradeSignal::Buy,
            (Long, Flat) => TradeSignal::Sell,
            (Long, Short) => TradeSignal::SellBuy,
            (Flat, Short) => TradeSignal::Sell,
            (Short, Flat) => TradeSignal::Buy,
            (Short, Long) => TradeSignal::BuySell,
            _ => TradeSignal::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSignal::Buy => "BUY",
            TradeSignal::Sell => "SELL",
            TradeSignal::SellBuy => "SELL+BUY",
            TradeSignal::BuySell => "BUY+SELL",
            TradeSignal::None => "",
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotated bar produced by a signal function.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SignalRecord {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub fast_ema: f64,
    pub slow_ema: f64,
    /// Raw crossover direction at this bar (not lagged).
    pub direction: Position,
    /// Tradable position for this bar: the direction from the previous bar.
    pub position: Position,
    /// Label for the (previous position, position) transition.
    pub signal: TradeSignal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(TradeSignal::from_transition(Flat, Long), TradeSignal::Buy);
        assert_eq!(TradeSignal::from_transition(Long, Flat), TradeSignal::Sell);
        assert_eq!(
            TradeSignal::from_transition(Long, Short),
            TradeSignal::SellBuy
        );
        assert_eq!(TradeSignal::from_transition(Flat, Short), TradeSignal::Sell);
        assert_eq!(TradeSignal::from_transition(Short, Flat), TradeSignal::Buy);
        assert_eq!(
            TradeSignal::from_transition(Short, Long),
            TradeSignal::BuySell
        );
    }

    #[test]
    fn test_no_change_has_no_label() {
        for pos in [Short, Flat, Long] {
            assert_eq!(TradeSignal::from_transition(pos, pos), TradeSignal::None);
            assert_eq!(TradeSignal::from_transition(pos, pos).as_str(), "");
        }
    }

    #[test]
    fn test_crossover_tie_resolves_short() {
        assert_eq!(Position::from_crossover(100.0, 100.0), Short);
        assert_eq!(Position::from_crossover(100.1, 100.0), Long);
        assert_eq!(Position::from_crossover(99.9, 100.0), Short);
    }
}
