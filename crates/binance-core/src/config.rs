//! Configuration management for the EMA-Bot system.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub binance: BinanceConfig,
    pub trading: TradingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Trade against the futures testnet instead of production.
    pub testnet: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Futures symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Kline interval, e.g. `30m`.
    pub interval: String,
    /// Proportional fee per unit of position change (0.0004 = 4 bps).
    pub fee_pct: f64,
    /// Leverage applied during live-trader initialization.
    pub leverage: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            binance: BinanceConfig {
                api_key: env::var("BINANCE_API_KEY").map_err(|_| Error::Config {
                    message: "BINANCE_API_KEY environment variable not set".to_string(),
                })?,
                api_secret: env::var("BINANCE_API_SECRET").map_err(|_| Error::Config {
                    message: "BINANCE_API_SECRET environment variable not set".to_string(),
                })?,
                testnet: env::var("BINANCE_TESTNET")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            trading: TradingConfig {
                symbol: env::var("BINANCE_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
                interval: env::var("BINANCE_INTERVAL").unwrap_or_else(|_| "30m".to_string()),
                fee_pct: env::var("TRADING_FEE_PCT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0004),
                leverage: env::var("DEFAULT_LEVERAGE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
        })
    }

    /// Configuration for backtest-only runs, where credentials are not
    /// required (public market-data endpoints are unauthenticated).
    pub fn from_env_public() -> Self {
        dotenvy::dotenv().ok();

        Self {
            binance: BinanceConfig {
                api_key: env::var("BINANCE_API_KEY").unwrap_or_default(),
                api_secret: env::var("BINANCE_API_SECRET").unwrap_or_default(),
                testnet: env::var("BINANCE_TESTNET")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            trading: TradingConfig {
                symbol: env::var("BINANCE_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
                interval: env::var("BINANCE_INTERVAL").unwrap_or_else(|_| "30m".to_string()),
                fee_pct: env::var("TRADING_FEE_PCT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0004),
                leverage: env::var("DEFAULT_LEVERAGE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
        }
    }
}
