//! Order routing for live and paper execution.

use std::sync::Arc;

use binance_core::types::MarketOrder;
use binance_core::{ExchangeGateway, Result};
use tracing::info;

/// Whether orders reach the exchange or are only simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMode {
    /// Log a simulated fill, never touch the exchange.
    Paper,
    /// Submit real market orders through the gateway.
    Live,
}

impl TradeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::Paper => "paper",
            TradeMode::Live => "live",
        }
    }
}

/// Routes market orders to the exchange gateway, or simulates them in
/// paper mode.
pub struct OrderRouter<G> {
    gateway: Arc<G>,
    mode: TradeMode,
}

impl<G: ExchangeGateway> OrderRouter<G> {
    pub fn new(gateway: Arc<G>, mode: TradeMode) -> Self {
        Self { gateway, mode }
    }

    pub fn mode(&self) -> TradeMode {
        self.mode
    }

    /// Submit a market order according to the configured mode.
    ///
    /// Paper orders always succeed. Live orders return the gateway error
    /// on rejection.
    pub async fn submit(&self, order: MarketOrder) -> Result<()> {
        match self.mode {
            TradeMode::Paper => {
                info!(
                    order_id = %order.id,
                    symbol = %order.symbol,
                    side = order.side.as_str(),
                    quantity = %order.quantity,
                    "[PAPER] Simulated market order fill"
                );
                Ok(())
            }
            TradeMode::Live => {
                let ack = self.gateway.submit_market_order(&order).await?;
                info!(
                    order_id = %order.id,
                    exchange_order_id = ack.order_id,
                    symbol = %order.symbol,
                    side = order.side.as_str(),
                    quantity = %order.quantity,
                    status = %ack.status,
                    "Market order accepted"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use binance_core::types::{Candle, OrderAck, OrderSide};
    use binance_core::Error;
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingGateway {
        submissions: AtomicU32,
        reject: bool,
    }

    impl CountingGateway {
        fn new(reject: bool) -> Self {
            Self {
                submissions: AtomicU32::new(0),
                reject,
            }
        }
    }

    #[async_trait]
    impl ExchangeGateway for CountingGateway {
        async fn klines(
            &self,
            _symbol: &str,
            _interval: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Candle>> {
            Ok(Vec::new())
        }

        async fn configure_futures(&self, _symbol: &str, _leverage: u32) -> Result<()> {
            Ok(())
        }

        async fn submit_market_order(&self, order: &MarketOrder) -> Result<OrderAck> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(Error::Order {
                    message: "insufficient margin".into(),
                });
            }
            Ok(OrderAck {
                order_id: 1,
                symbol: order.symbol.clone(),
                status: "NEW".into(),
            })
        }
    }

    fn order() -> MarketOrder {
        MarketOrder::new("BTCUSDT".into(), OrderSide::Buy, Decimal::new(1, 3))
    }

    #[tokio::test]
    async fn test_paper_mode_never_reaches_gateway() {
        let gateway = Arc::new(CountingGateway::new(false));
        let router = OrderRouter::new(Arc::clone(&gateway), TradeMode::Paper);

        router.submit(order()).await.unwrap();

        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_mode_submits_through_gateway() {
        let gateway = Arc::new(CountingGateway::new(false));
        let router = OrderRouter::new(Arc::clone(&gateway), TradeMode::Live);

        router.submit(order()).await.unwrap();

        assert_eq!(gateway.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_live_rejection_propagates() {
        let gateway = Arc::new(CountingGateway::new(true));
        let router = OrderRouter::new(gateway, TradeMode::Live);

        let err = router.submit(order()).await.unwrap_err();
        assert!(matches!(err, Error::Order { .. }));
    }
}
