//! Core types shared across the engine
//!
//! These types define the contract between the signal runner, the market
//! data gateway, the insight gateway and any presentation layer subscribed
//! to the dashboard snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradeable asset from the built-in catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Catalog identifier, e.g. "bitcoin"
    pub id: String,
    /// Display name, e.g. "Bitcoin"
    pub name: String,
    /// Exchange symbol, e.g. "BTCUSDT"
    pub symbol: String,
}

/// A named trading strategy from the built-in catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Catalog identifier, e.g. "mean_reversion"
    pub id: String,
    /// Display name, e.g. "Mean Reversion"
    pub name: String,
    /// Free-text description fed into prompts
    pub description: String,
    /// Default parameter map, e.g. {"rsiPeriod": 14}
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// One OHLCV candle, oldest-first in any sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, milliseconds since epoch
    pub time_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Signal kind parsed from the insight response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl SignalKind {
    /// The trade this signal implies, if any. HOLD implies none.
    pub fn trade_kind(&self) -> Option<TradeKind> {
        match self {
            SignalKind::Buy => Some(TradeKind::Buy),
            SignalKind::Sell => Some(TradeKind::Sell),
            SignalKind::Hold => None,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

/// Structured trading signal returned by the insight gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResponse {
    pub signal: SignalKind,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// Brief explanation for the signal
    pub reasoning: String,
    /// Suggested parameter tweaks, if the model offers any
    #[serde(
        default,
        rename = "suggestedParameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_parameters: Option<serde_json::Value>,
}

/// Direction of a simulated trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "BUY"),
            TradeKind::Sell => write!(f, "SELL"),
        }
    }
}

/// A simulated trade recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique id, "trade-<creation ms>-<sequence>"
    pub id: String,
    /// Exchange symbol of the traded asset
    pub asset: String,
    /// Display name of the strategy that produced the signal
    pub strategy: String,
    pub kind: TradeKind,
    /// Latest close price at signal time
    pub price: Decimal,
    /// Always 1 in this simulation
    pub quantity: Decimal,
    /// Creation time, milliseconds since epoch
    pub timestamp_ms: i64,
    /// Placeholder only. Never computed, always zero when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
}

/// Bot lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotState {
    Stopped,
    Running,
    /// Reserved: on but not actively trading. Never entered today.
    Idle,
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotState::Stopped => write!(f, "STOPPED"),
            BotState::Running => write!(f, "RUNNING"),
            BotState::Idle => write!(f, "IDLE"),
        }
    }
}

/// Placeholder performance metrics surfaced in the snapshot.
///
/// Nothing computes these; the dashboard shows them as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub trades_count: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
}
