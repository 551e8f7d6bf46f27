//! Candle (kline) types shared by backtesting and live trading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed OHLCV bar.
///
/// Candle series are ordered by `open_time` (strictly increasing, unique).
/// Everything downstream relies on that ordering and never re-sorts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A kline update from the streaming API.
///
/// Only events with `is_closed == true` represent final bars; in-progress
/// updates for the current bar are delivered with `is_closed == false` and
/// are ignored by consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlineEvent {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

impl KlineEvent {
    /// The closed bar carried by this event.
    pub fn to_candle(&self) -> Candle {
        Candle {
            open_time: self.open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Insert a bar into an ordered series, replacing any existing bar with the
/// same `open_time`. The common case (newest bar) is O(1).
pub fn upsert_candle(series: &mut Vec<Candle>, candle: Candle) {
    match series.last() {
        None => series.push(candle),
        Some(last) if candle.open_time > last.open_time => series.push(candle),
        _ => match series.binary_search_by_key(&candle.open_time, |c| c.open_time) {
            Ok(idx) => series[idx] = candle,
            Err(idx) => series.insert(idx, candle),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(minute: u32, close: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_upsert_appends_newest() {
        let mut series = vec![candle(0, 100.0), candle(1, 101.0)];
        upsert_candle(&mut series, candle(2, 102.0));
        assert_eq!(series.len(), 3);
        assert_eq!(series[2].close, 102.0);
    }

    #[test]
    fn test_upsert_replaces_duplicate_timestamp() {
        let mut series = vec![candle(0, 100.0), candle(1, 101.0)];
        upsert_candle(&mut series, candle(1, 150.0));
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].close, 150.0);
    }

    #[test]
    fn test_upsert_keeps_ordering_for_backfill() {
        let mut series = vec![candle(0, 100.0), candle(2, 102.0)];
        upsert_candle(&mut series, candle(1, 101.0));
        let times: Vec<_> = series.iter().map(|c| c.open_time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(series.len(), 3);
    }
}
