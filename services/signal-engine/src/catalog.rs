//! Built-in asset and strategy reference data
//!
//! The dashboard works off a fixed catalog; nothing here is mutated at
//! runtime. Selection commands resolve ids through the lookup functions.

use serde_json::json;

use crate::types::{Asset, Strategy};

/// All assets the dashboard can trade, in display order.
pub fn available_assets() -> Vec<Asset> {
    vec![
        asset("bitcoin", "Bitcoin", "BTCUSDT"),
        asset("ethereum", "Ethereum", "ETHUSDT"),
        asset("solana", "Solana", "SOLUSDT"),
        asset("cardano", "Cardano", "ADAUSDT"),
        asset("dogecoin", "Dogecoin", "DOGEUSDT"),
    ]
}

/// All strategies the dashboard offers, in display order.
pub fn available_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            id: "mean_reversion".to_string(),
            name: "Mean Reversion".to_string(),
            description: "Identifies assets deviating from their historical mean and bets \
                          on their return. Often uses Bollinger Bands and RSI."
                .to_string(),
            parameters: Some(json!({ "rsiPeriod": 14, "bbPeriod": 20, "bbStdDev": 2 })),
        },
        Strategy {
            id: "trend_following".to_string(),
            name: "Trend Following".to_string(),
            description: "Capitalizes on sustained price movements. Often uses moving \
                          average crossovers."
                .to_string(),
            parameters: Some(json!({ "shortMAPeriod": 50, "longMAPeriod": 200 })),
        },
        Strategy {
            id: "arbitrage".to_string(),
            name: "Arbitrage (Conceptual)".to_string(),
            description: "Exploits price differences of the same asset across different \
                          markets or related assets. (Conceptual for this simulation)"
                .to_string(),
            parameters: None,
        },
        Strategy {
            id: "ml_prediction".to_string(),
            name: "Machine Learning Prediction (Conceptual)".to_string(),
            description: "Uses ML models (e.g., Random Forest, SVM) to predict returns or \
                          volatility. (Conceptual for this simulation)"
                .to_string(),
            parameters: None,
        },
        Strategy {
            id: "garch_volatility".to_string(),
            name: "GARCH Volatility Trading (Conceptual)".to_string(),
            description: "Trades based on GARCH model predictions of volatility changes. \
                          (Conceptual for this simulation)"
                .to_string(),
            parameters: None,
        },
    ]
}

/// Default selection shown before the user picks anything.
pub fn default_asset() -> Asset {
    available_assets().remove(0)
}

pub fn default_strategy() -> Strategy {
    available_strategies().remove(0)
}

/// Resolve an asset by catalog id.
pub fn asset_by_id(id: &str) -> Option<Asset> {
    available_assets().into_iter().find(|a| a.id == id)
}

/// Resolve a strategy by catalog id.
pub fn strategy_by_id(id: &str) -> Option<Strategy> {
    available_strategies().into_iter().find(|s| s.id == id)
}

/// Parameter hint embedded in the signal prompt for a given strategy id.
///
/// Only the non-conceptual strategies carry one; the arbitrage hint points
/// the model at the second catalog asset for comparison.
pub fn strategy_hint(strategy_id: &str) -> Option<String> {
    match strategy_id {
        "mean_reversion" => {
            Some("RSI period: 14, Bollinger Bands period: 20, std dev: 2.".to_string())
        }
        "trend_following" => Some("Moving Average periods: 50 and 200.".to_string()),
        "arbitrage" => {
            let assets = available_assets();
            assets.get(1).map(|a| format!("Compare with {}.", a.symbol))
        }
        _ => None,
    }
}

fn asset(id: &str, name: &str, symbol: &str) -> Asset {
    Asset {
        id: id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_assets_and_five_strategies() {
        assert_eq!(available_assets().len(), 5);
        assert_eq!(available_strategies().len(), 5);
    }

    #[test]
    fn lookups_resolve_known_ids() {
        let btc = asset_by_id("bitcoin").unwrap();
        assert_eq!(btc.symbol, "BTCUSDT");

        let mr = strategy_by_id("mean_reversion").unwrap();
        assert_eq!(mr.name, "Mean Reversion");

        assert!(asset_by_id("ripple").is_none());
        assert!(strategy_by_id("momentum").is_none());
    }

    #[test]
    fn defaults_are_first_catalog_entries() {
        assert_eq!(default_asset().id, "bitcoin");
        assert_eq!(default_strategy().id, "mean_reversion");
    }

    #[test]
    fn hints_cover_the_concrete_strategies() {
        assert!(strategy_hint("mean_reversion").unwrap().contains("RSI period: 14"));
        assert!(strategy_hint("trend_following").unwrap().contains("50 and 200"));
        assert_eq!(strategy_hint("arbitrage").unwrap(), "Compare with ETHUSDT.");
        assert!(strategy_hint("ml_prediction").is_none());
    }
}
