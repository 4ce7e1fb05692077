//! Signal Engine Library
//!
//! Core engine behind the AI trading-signal dashboard: gateways for market
//! data and text generation, the signal loop runner, and the in-memory
//! dashboard state it publishes.

pub mod catalog;
pub mod config;
pub mod insight;
pub mod ledger;
pub mod market;
pub mod prompt;
pub mod runner;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use insight::{GenerationConfig, InsightClient, InsightError, InsightSource, ResponseFormat};
pub use ledger::TradeLedger;
pub use market::{BinanceClient, MarketDataSource};
pub use runner::{Controller, SignalRunner, TICK_PERIOD};
pub use state::{DashboardSnapshot, DashboardState, LogBuffer};
pub use types::{
    Asset, BotState, Candle, PerformanceMetrics, SignalKind, SignalResponse, Strategy, Trade,
    TradeKind,
};

#[cfg(test)]
mod tests;
