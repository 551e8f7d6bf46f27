//! Error types for the EMA-Bot system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid strategy parameters: {0}")]
    InvalidParams(String),

    #[error("Strategy '{name}' is not registered. Available: {available}")]
    UnknownStrategy { name: String, available: String },

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Order error: {message}")]
    Order { message: String },

    #[error("Invalid market data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
