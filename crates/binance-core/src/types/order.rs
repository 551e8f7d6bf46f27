//! Order types for trade execution.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire representation expected by the futures API.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// A market order that executes immediately at best available price.
///
/// Order type is always MARKET; the engine never places limit orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOrder {
    pub id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

impl MarketOrder {
    pub fn new(symbol: String, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            side,
            quantity,
            created_at: Utc::now(),
        }
    }
}

/// Exchange acknowledgement for a submitted order.
///
/// Fill details are not inspected by the engine; the ack only confirms the
/// order was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "orderId")]
    pub order_id: i64,
    pub symbol: String,
    pub status: String,
}
