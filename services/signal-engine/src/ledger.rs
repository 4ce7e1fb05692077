//! Trade ledger - simulated trades, newest first
//!
//! Append-only within a session. Trades are never mutated or removed and
//! nothing computes PnL; the field stays at zero.

use rust_decimal::Decimal;
use tracing::info;

use crate::types::{Asset, Strategy, Trade, TradeKind};

/// In-memory ledger of simulated trades, element 0 most recent
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a simulated trade at the front of the ledger.
    ///
    /// The id is derived from the creation time and the running sequence, so
    /// ids stay unique even when two trades land in the same millisecond.
    pub fn record(
        &mut self,
        asset: &Asset,
        strategy: &Strategy,
        kind: TradeKind,
        price: Decimal,
        timestamp_ms: i64,
    ) -> &Trade {
        let trade = Trade {
            id: format!("trade-{}-{}", timestamp_ms, self.trades.len()),
            asset: asset.symbol.clone(),
            strategy: strategy.name.clone(),
            kind,
            price,
            quantity: Decimal::ONE,
            timestamp_ms,
            pnl: Some(Decimal::ZERO),
        };

        info!(
            "Simulated {} trade for {} at {} via {}",
            trade.kind, trade.asset, trade.price, trade.strategy
        );

        self.trades.insert(0, trade);
        &self.trades[0]
    }

    /// All trades, newest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
