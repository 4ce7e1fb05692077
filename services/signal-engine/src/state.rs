//! Dashboard state owned by the signal runner
//!
//! The runner is the only writer; everyone else sees immutable
//! `DashboardSnapshot` copies published on a watch channel after each
//! mutation.

use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::catalog;
use crate::ledger::TradeLedger;
use crate::types::{Asset, BotState, Candle, PerformanceMetrics, Strategy, Trade};

/// Most recent diagnostic entries kept in the dashboard log
const MAX_LOG_ENTRIES: usize = 100;

/// Capped diagnostic log, newest entry first
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: VecDeque<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a timestamped entry, dropping the oldest past the cap.
    pub fn push(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!("dashboard log: {}", message);
        self.entries
            .push_front(format!("[{}] {}", Utc::now().format("%H:%M:%S"), message));
        self.entries.truncate(MAX_LOG_ENTRIES);
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable application state, owned exclusively by the runner task
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub bot_state: BotState,
    /// Whether the repeating timer mode was requested. Only meaningful while
    /// the bot is running.
    pub looping: bool,
    pub selected_asset: Asset,
    pub selected_strategy: Strategy,
    /// Latest fetched candle series, oldest first
    pub market_data: Vec<Candle>,
    /// Latest human-readable insight (signal summary, backtest text or error)
    pub insight: String,
    /// True while a tick or backtest is in flight
    pub busy: bool,
    pub ledger: TradeLedger,
    pub logs: LogBuffer,
    /// Static placeholder, never computed
    pub metrics: PerformanceMetrics,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            bot_state: BotState::Stopped,
            looping: false,
            selected_asset: catalog::default_asset(),
            selected_strategy: catalog::default_strategy(),
            market_data: Vec::new(),
            insight: String::new(),
            busy: false,
            ledger: TradeLedger::new(),
            logs: LogBuffer::new(),
            metrics: PerformanceMetrics::default(),
        }
    }

    /// Immutable copy for subscribers.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            bot_state: self.bot_state,
            looping: self.looping,
            selected_asset: self.selected_asset.clone(),
            selected_strategy: self.selected_strategy.clone(),
            market_data: self.market_data.clone(),
            insight: self.insight.clone(),
            busy: self.busy,
            trades: self.ledger.trades().to_vec(),
            logs: self.logs.to_vec(),
            metrics: self.metrics,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

/// Published dashboard state, one value per mutation
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub bot_state: BotState,
    pub looping: bool,
    pub selected_asset: Asset,
    pub selected_strategy: Strategy,
    pub market_data: Vec<Candle>,
    pub insight: String,
    pub busy: bool,
    /// Newest first
    pub trades: Vec<Trade>,
    /// Newest first, capped
    pub logs: Vec<String>,
    pub metrics: PerformanceMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_buffer_caps_at_one_hundred_newest_first() {
        let mut logs = LogBuffer::new();
        for i in 0..120 {
            logs.push(format!("entry {i}"));
        }
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        let first = logs.entries().next().unwrap();
        assert!(first.ends_with("entry 119"));
        assert!(logs.entries().last().unwrap().ends_with("entry 20"));
    }

    #[test]
    fn log_entries_are_timestamped() {
        let mut logs = LogBuffer::new();
        logs.push("hello");
        let entry = logs.entries().next().unwrap();
        assert!(entry.starts_with('['));
        assert!(entry.contains("] hello"));
    }

    #[test]
    fn initial_state_is_stopped_with_catalog_defaults() {
        let state = DashboardState::new();
        assert_eq!(state.bot_state, BotState::Stopped);
        assert!(!state.looping);
        assert!(!state.busy);
        assert_eq!(state.selected_asset.symbol, "BTCUSDT");
        assert_eq!(state.selected_strategy.id, "mean_reversion");
        assert!(state.ledger.is_empty());
        assert_eq!(state.metrics, PerformanceMetrics::default());
    }
}
