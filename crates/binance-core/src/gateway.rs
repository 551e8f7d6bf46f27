//! Exchange collaborator interface.
//!
//! The signal, backtest, and live-trading engines never talk to Binance
//! directly; they go through this trait so tests can substitute stubs and
//! paper runs can skip the exchange entirely.

use crate::types::{Candle, MarketOrder, OrderAck};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ExchangeGateway: Send + Sync + 'static {
    /// Fetch closed klines for `[start, end)`, ordered by open time and
    /// deduplicated. Pagination is handled internally; gaps are tolerated.
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>>;

    /// Apply leverage and one-way position mode for the symbol.
    async fn configure_futures(&self, symbol: &str, leverage: u32) -> Result<()>;

    /// Submit a market order. The returned ack is not inspected for fill
    /// details by callers.
    async fn submit_market_order(&self, order: &MarketOrder) -> Result<OrderAck>;
}
