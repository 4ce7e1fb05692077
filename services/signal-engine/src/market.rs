//! Market Data Gateway
//!
//! HTTP client for a Binance-compatible klines endpoint. The gateway never
//! fails visibly: any transport or decoding error is replaced by a
//! deterministically-structured synthetic series so the signal loop always
//! has data to operate on.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::Candle;

/// Per-request timeout for market data calls
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Milliseconds per hourly candle, the spacing used by the fallback
const HOUR_MS: i64 = 60 * 60 * 1000;

/// Source of OHLCV candles, the seam the runner depends on
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` candles for `symbol`, oldest first. Never fails;
    /// implementations substitute fallback data instead of erroring.
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize) -> Vec<Candle>;
}

/// Client for the Binance-style REST market data endpoint
pub struct BinanceClient {
    http_client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// Fetch klines without the fallback, surfacing the error. The public
    /// trait path wraps this and substitutes synthetic data.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("market data endpoint returned status {}: {}", status, body);
        }

        let rows: Vec<Vec<serde_json::Value>> = response.json().await?;
        rows.iter().map(|row| parse_kline_row(row)).collect()
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize) -> Vec<Candle> {
        match self.fetch_klines(symbol, interval, limit).await {
            Ok(candles) => {
                debug!("Fetched {} candles for {}", candles.len(), symbol);
                candles
            }
            Err(e) => {
                warn!(
                    "Failed to fetch live data for {}: {}. Using synthetic data.",
                    symbol, e
                );
                synthetic_candles(
                    rand::random::<u64>(),
                    limit,
                    interval_ms(interval),
                    chrono::Utc::now().timestamp_millis(),
                )
            }
        }
    }
}

/// Decode one kline row: `[openTime, open, high, low, close, volume, ...]`
/// with prices and volume string-encoded. Extra trailing fields are ignored.
fn parse_kline_row(row: &[serde_json::Value]) -> anyhow::Result<Candle> {
    if row.len() < 6 {
        anyhow::bail!("kline row has {} fields, expected at least 6", row.len());
    }

    let time_ms = row[0]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("kline open time is not an integer: {}", row[0]))?;

    Ok(Candle {
        time_ms,
        open: decimal_field(&row[1], "open")?,
        high: decimal_field(&row[2], "high")?,
        low: decimal_field(&row[3], "low")?,
        close: decimal_field(&row[4], "close")?,
        volume: decimal_field(&row[5], "volume")?,
    })
}

fn decimal_field(value: &serde_json::Value, name: &str) -> anyhow::Result<Decimal> {
    let text = value
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("kline {} is not a string: {}", name, value))?;
    text.parse::<Decimal>()
        .map_err(|e| anyhow::anyhow!("kline {} '{}' is not a number: {}", name, text, e))
}

/// Deterministic synthetic candle series used when the live call fails.
///
/// Pure function of its inputs: the same seed, count, interval and anchor
/// always produce the same series. Timestamps are strictly increasing at
/// `interval_ms` spacing ending at `anchor_ms`; each open equals the prior
/// close, and `high >= max(open, close)`, `low <= min(open, close)` hold for
/// every candle.
pub fn synthetic_candles(seed: u64, count: usize, interval_ms: i64, anchor_ms: i64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut candles = Vec::with_capacity(count);
    let mut last_close: f64 = rng.gen_range(10_000.0..60_000.0);

    for i in 0..count {
        let time_ms = anchor_ms - (count as i64 - 1 - i as i64) * interval_ms;
        let open = last_close;
        let close = open * (1.0 + rng.gen_range(-0.02..0.02));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.03));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.03));
        let volume = rng.gen_range(100.0..1100.0);

        candles.push(Candle {
            time_ms,
            open: dec(open),
            high: dec(high),
            low: dec(low),
            close: dec(close),
            volume: dec(volume),
        });
        last_close = close;
    }

    candles
}

/// Candle spacing for the intervals this engine requests. Only "1h" is used
/// today; anything unrecognized falls back to hourly spacing.
fn interval_ms(interval: &str) -> i64 {
    match interval {
        "1m" => 60 * 1000,
        "5m" => 5 * 60 * 1000,
        "15m" => 15 * 60 * 1000,
        "4h" => 4 * HOUR_MS,
        "1d" => 24 * HOUR_MS,
        _ => HOUR_MS,
    }
}

fn dec(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default().round_dp(8)
}
