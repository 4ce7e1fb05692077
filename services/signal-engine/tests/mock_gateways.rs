//! Mocked gateways for testing the signal runner without external services

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use signal_engine::insight::{GenerationConfig, InsightError, InsightSource};
use signal_engine::market::{synthetic_candles, MarketDataSource};
use signal_engine::types::Candle;

/// Milliseconds per hourly candle
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Mock market data source returning a fixed series on every call
pub struct MockMarket {
    candles: Vec<Candle>,
    calls: Arc<AtomicUsize>,
}

impl MockMarket {
    pub fn with_series(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A market source that returns no data at all, simulating an endpoint
    /// that answers with an empty array.
    pub fn empty() -> Self {
        Self::with_series(Vec::new())
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl MarketDataSource for MockMarket {
    async fn fetch_candles(&self, _symbol: &str, _interval: &str, _limit: usize) -> Vec<Candle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.candles.clone()
    }
}

/// Scripted insight gateway.
///
/// Replies are raw response texts consumed in order; once only one remains it
/// repeats forever. `Err` entries surface as API errors. An optional delay
/// simulates a slow generation call (useful with paused tokio time).
pub struct MockInsight {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
}

impl MockInsight {
    pub fn scripted(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
            delay: None,
        }
    }

    pub fn always(text: impl Into<String>) -> Self {
        Self::scripted(vec![Ok(text.into())])
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(vec![Err(message.into())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn prompt_capture(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.last_prompt)
    }
}

#[async_trait]
impl InsightSource for MockInsight {
    async fn generate_text(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, InsightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err("no scripted reply".to_string()))
        };
        reply.map_err(|body| InsightError::Api { status: 500, body })
    }
    // generate_json is inherited from the trait default, so scripted text
    // goes through the same fence-stripping and parsing as production.
}

/// Fenced BUY signal, the decorated shape gateways typically return
pub fn buy_signal_text() -> String {
    "```json\n{\"signal\": \"BUY\", \"confidence\": 0.82, \"reasoning\": \"RSI oversold\"}\n```"
        .to_string()
}

pub fn sell_signal_text() -> String {
    "{\"signal\": \"SELL\", \"confidence\": 0.65, \"reasoning\": \"Resistance rejected\"}"
        .to_string()
}

pub fn hold_signal_text() -> String {
    "{\"signal\": \"HOLD\", \"confidence\": 0.50, \"reasoning\": \"No clear setup\"}".to_string()
}

/// Fifty hourly candles whose latest close is pinned to `close`.
pub fn series_with_latest_close(close: Decimal) -> Vec<Candle> {
    let mut candles = synthetic_candles(1, 50, HOUR_MS, 1_700_000_000_000);
    if let Some(last) = candles.last_mut() {
        last.close = close;
        last.high = last.high.max(close);
        last.low = last.low.min(close);
    }
    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_market_returns_the_series_and_counts_calls() {
        let market = MockMarket::with_series(series_with_latest_close(dec!(65000.12)));
        let calls = market.call_counter();

        let candles = market.fetch_candles("BTCUSDT", "1h", 50).await;
        assert_eq!(candles.len(), 50);
        assert_eq!(candles.last().unwrap().close, dec!(65000.12));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mock_insight_strips_fences_via_the_default_json_path() {
        let insight = MockInsight::always(buy_signal_text());
        let value = insight
            .generate_json("prompt", &GenerationConfig::structured())
            .await
            .unwrap();
        assert_eq!(value["signal"], "BUY");
    }

    #[tokio::test]
    async fn mock_insight_scripted_replies_run_in_order_then_repeat() {
        let insight = MockInsight::scripted(vec![
            Ok(hold_signal_text()),
            Err("backend exploded".to_string()),
            Ok(buy_signal_text()),
        ]);

        let first = insight
            .generate_text("p", &GenerationConfig::plain())
            .await
            .unwrap();
        assert!(first.contains("HOLD"));

        let second = insight.generate_text("p", &GenerationConfig::plain()).await;
        assert!(second.unwrap_err().to_string().contains("backend exploded"));

        for _ in 0..3 {
            let repeated = insight
                .generate_text("p", &GenerationConfig::plain())
                .await
                .unwrap();
            assert!(repeated.contains("BUY"));
        }
    }
}
