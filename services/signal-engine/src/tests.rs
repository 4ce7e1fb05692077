//! Cross-module tests for signal-engine

use rust_decimal_macros::dec;

use crate::catalog;
use crate::ledger::TradeLedger;
use crate::state::DashboardState;
use crate::types::{PerformanceMetrics, SignalKind, SignalResponse};

#[test]
fn parsed_signal_drives_the_ledger_append_rule() {
    let asset = catalog::default_asset();
    let strategy = catalog::default_strategy();
    let mut ledger = TradeLedger::new();

    let signals: Vec<SignalResponse> = ["BUY", "HOLD", "SELL"]
        .iter()
        .map(|kind| {
            serde_json::from_value(serde_json::json!({
                "signal": kind,
                "confidence": 0.8,
                "reasoning": "test"
            }))
            .unwrap()
        })
        .collect();

    for (i, response) in signals.iter().enumerate() {
        if let Some(kind) = response.signal.trade_kind() {
            ledger.record(&asset, &strategy, kind, dec!(65000.12), i as i64);
        }
    }

    // BUY and SELL append, HOLD does not.
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.trades()[0].timestamp_ms, 2);
    assert_eq!(ledger.trades()[1].timestamp_ms, 0);
}

#[test]
fn snapshot_reflects_state_including_placeholder_metrics() {
    let mut state = DashboardState::new();
    state.insight = "Signal: BUY, Confidence: 0.82".to_string();
    state.logs.push("first");
    state.logs.push("second");

    let snapshot = state.snapshot();
    assert_eq!(snapshot.insight, state.insight);
    assert_eq!(snapshot.logs.len(), 2);
    assert!(snapshot.logs[0].ends_with("second"));
    assert_eq!(snapshot.metrics, PerformanceMetrics::default());
    assert!(snapshot.trades.is_empty());

    // Snapshots serialize for any front end that wants them as JSON.
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["bot_state"], "STOPPED");
    assert_eq!(json["selected_asset"]["symbol"], "BTCUSDT");
}

#[test]
fn fenced_signal_payload_parses_into_the_signal_type() {
    let raw = "```json\n{\"signal\": \"BUY\", \"confidence\": 0.82, \"reasoning\": \"RSI oversold\"}\n```";
    let value = crate::insight::parse_json_response(raw).unwrap();
    let response: SignalResponse = serde_json::from_value(value).unwrap();
    assert_eq!(response.signal, SignalKind::Buy);
    assert!((response.confidence - 0.82).abs() < f64::EPSILON);
    assert_eq!(response.reasoning, "RSI oversold");
}
