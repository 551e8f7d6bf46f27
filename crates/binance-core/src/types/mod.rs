//! Core domain types for the EMA-Bot system.

pub mod candle;
pub mod order;

pub use candle::*;
pub use order::*;
