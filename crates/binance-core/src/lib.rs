//! Binance Core Library
//!
//! Shared types, configuration, and API clients for the EMA-Bot system.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::ExchangeGateway;
