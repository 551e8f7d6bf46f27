//! API clients for the Binance USDⓈ-M futures exchange.

pub mod rest;
pub mod stream;

pub use rest::FuturesClient;
pub use stream::KlineStream;
