//! Binance futures REST API client.
//!
//! Covers the endpoints the engines need: paginated historical klines,
//! leverage / position-mode setup, and market order submission. Signed
//! endpoints use HMAC-SHA256 over the query string per the Binance API
//! contract.

use crate::gateway::ExchangeGateway;
use crate::types::{Candle, MarketOrder, OrderAck};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Raw kline row as returned by `/fapi/v1/klines`: open time, OHLCV as
/// strings, close time, and four fields the engine ignores.
type KlineRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

#[derive(Debug, Deserialize)]
struct PositionModeResponse {
    #[serde(rename = "dualSidePosition")]
    dual_side_position: bool,
}

/// Binance USDⓈ-M futures API client.
pub struct FuturesClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    http_client: reqwest::Client,
}

impl FuturesClient {
    /// Production REST base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://fapi.binance.com";
    /// Futures testnet REST base URL.
    pub const TESTNET_BASE_URL: &'static str = "https://testnet.binancefuture.com";

    /// Maximum klines per request, per API limits.
    const KLINES_PAGE_LIMIT: u32 = 500;

    pub fn new(api_key: String, api_secret: String, testnet: bool) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        let base_url = if testnet {
            Self::TESTNET_BASE_URL.to_string()
        } else {
            Self::DEFAULT_BASE_URL.to_string()
        };
        Self {
            base_url,
            api_key,
            api_secret,
            http_client,
        }
    }

    /// Client with an explicit base URL (used by tests against a local server).
    pub fn with_base_url(api_key: String, api_secret: String, base_url: String) -> Self {
        let mut client = Self::new(api_key, api_secret, false);
        client.base_url = base_url;
        client
    }

    /// Fetch one page of klines.
    async fn klines_page(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<KlineRow>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url,
            symbol,
            interval,
            start_ms,
            end_ms,
            Self::KLINES_PAGE_LIMIT
        );

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("klines request failed: {}", body),
                status: Some(status),
            });
        }

        let rows: Vec<KlineRow> = response.json().await?;
        Ok(rows)
    }

    /// Sign a query string and return it with the signature appended.
    fn sign_query(&self, query: &str) -> Result<String> {
        let mut mac =
            HmacSha256::new_from_slice(self.api_secret.as_bytes()).map_err(|e| Error::Config {
                message: format!("Invalid API secret: {}", e),
            })?;
        mac.update(query.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}&signature={}", query, signature))
    }

    /// Execute a signed request against a private endpoint.
    async fn signed_request(
        &self,
        method: reqwest::Method,
        path: &str,
        query: String,
    ) -> Result<String> {
        let timestamp = Utc::now().timestamp_millis();
        let query = if query.is_empty() {
            format!("timestamp={}", timestamp)
        } else {
            format!("{}&timestamp={}", query, timestamp)
        };
        let signed = self.sign_query(&query)?;
        let url = format!("{}{}?{}", self.base_url, path, signed);

        let response = self
            .http_client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                message: format!("{} failed: {}", path, body),
                status: Some(status.as_u16()),
            });
        }
        Ok(body)
    }

    fn parse_row(row: &KlineRow) -> Option<Candle> {
        let open_time = Utc.timestamp_millis_opt(row.0).single()?;
        Some(Candle {
            open_time,
            open: row.1.parse().ok()?,
            high: row.2.parse().ok()?,
            low: row.3.parse().ok()?,
            close: row.4.parse().ok()?,
            volume: row.5.parse().ok()?,
        })
    }
}

#[async_trait]
impl ExchangeGateway for FuturesClient {
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let mut start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();
        let mut candles = Vec::new();

        while start_ms < end_ms {
            let rows = self
                .klines_page(symbol, interval, start_ms, end_ms)
                .await?;
            if rows.is_empty() {
                break;
            }

            let page_len = rows.len();
            for row in &rows {
                match Self::parse_row(row) {
                    Some(candle) => candles.push(candle),
                    None => warn!(open_time = row.0, "Skipping unparseable kline row"),
                }
            }

            // Advance past the last open time so pages never overlap.
            start_ms = rows[page_len - 1].0 + 1;
            if page_len < Self::KLINES_PAGE_LIMIT as usize {
                break;
            }
        }

        debug!(
            symbol = symbol,
            interval = interval,
            count = candles.len(),
            "Fetched historical klines"
        );
        Ok(candles)
    }

    async fn configure_futures(&self, symbol: &str, leverage: u32) -> Result<()> {
        self.signed_request(
            reqwest::Method::POST,
            "/fapi/v1/leverage",
            format!("symbol={}&leverage={}", symbol, leverage),
        )
        .await?;

        let body = self
            .signed_request(reqwest::Method::GET, "/fapi/v1/positionSide/dual", String::new())
            .await?;
        let mode: PositionModeResponse = serde_json::from_str(&body)?;
        if mode.dual_side_position {
            self.signed_request(
                reqwest::Method::POST,
                "/fapi/v1/positionSide/dual",
                "dualSidePosition=false".to_string(),
            )
            .await?;
            info!(symbol = symbol, "One-way position mode enabled");
        }

        info!(symbol = symbol, leverage = leverage, "Futures account configured");
        Ok(())
    }

    async fn submit_market_order(&self, order: &MarketOrder) -> Result<OrderAck> {
        let query = format!(
            "symbol={}&side={}&type=MARKET&quantity={}",
            order.symbol,
            order.side.as_str(),
            order.quantity
        );
        let body = self
            .signed_request(reqwest::Method::POST, "/fapi/v1/order", query)
            .await
            .map_err(|e| Error::Order {
                message: format!("market order submission failed: {}", e),
            })?;

        let ack: OrderAck = serde_json::from_str(&body)?;
        info!(
            order_id = %order.id,
            exchange_order_id = ack.order_id,
            symbol = %order.symbol,
            side = ?order.side,
            quantity = %order.quantity,
            "Market order submitted"
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_query_is_hex_hmac() {
        let client = FuturesClient::new("key".to_string(), "secret".to_string(), false);
        let signed = client.sign_query("symbol=BTCUSDT&leverage=10").unwrap();
        let signature = signed.rsplit("signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_row() {
        let row: KlineRow = (
            1_700_000_000_000,
            "100.1".to_string(),
            "101.2".to_string(),
            "99.5".to_string(),
            "100.9".to_string(),
            "12.5".to_string(),
            1_700_001_799_999,
            "0".to_string(),
            42,
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
        );
        let candle = FuturesClient::parse_row(&row).unwrap();
        assert_eq!(candle.close, 100.9);
        assert_eq!(candle.volume, 12.5);
    }

    #[test]
    fn test_parse_row_rejects_garbage() {
        let row: KlineRow = (
            1_700_000_000_000,
            "not-a-number".to_string(),
            "101.2".to_string(),
            "99.5".to_string(),
            "100.9".to_string(),
            "12.5".to_string(),
            1_700_001_799_999,
            "0".to_string(),
            42,
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
        );
        assert!(FuturesClient::parse_row(&row).is_none());
    }

    #[test]
    fn test_testnet_base_url() {
        let client = FuturesClient::new(String::new(), String::new(), true);
        assert_eq!(client.base_url, FuturesClient::TESTNET_BASE_URL);
    }
}
