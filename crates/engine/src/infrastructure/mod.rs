//! Infrastructure - ports and the adapters behind them.

pub mod clock;
pub mod config;
pub mod persistence;
pub mod ports;
