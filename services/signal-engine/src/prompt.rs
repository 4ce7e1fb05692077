//! Prompt construction
//!
//! Prompts are deterministic functions of the current selections and market
//! data, so a given dashboard state always asks the insight gateway the same
//! question.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::catalog;
use crate::types::{Asset, Candle, Strategy};

/// How many trailing candles are embedded in the signal prompt
const PROMPT_CANDLES: usize = 5;

/// Build the structured-signal prompt for one tick.
pub fn signal_prompt(
    asset: &Asset,
    strategy: &Strategy,
    latest_price: Decimal,
    candles: &[Candle],
) -> String {
    let recent = &candles[candles.len().saturating_sub(PROMPT_CANDLES)..];
    let market_lines = recent
        .iter()
        .map(candle_line)
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "Analyze the following market context for {} ({}) and generate a trading signal \
         based on the {} strategy.\n\
         Current Price: {} USD.\n\
         Strategy Description: {}.\n\
         Recent Market Data (last {} periods, OHLCV):\n{}\n",
        asset.name,
        asset.symbol,
        strategy.name,
        latest_price,
        strategy.description,
        PROMPT_CANDLES,
        market_lines,
    );

    if let Some(hint) = catalog::strategy_hint(&strategy.id) {
        prompt.push_str(&format!(
            "\nConsider standard parameters for {}, for example:\n{}\n",
            strategy.name, hint
        ));
    }

    prompt.push_str(
        "\nOutput a JSON object with the following structure:\n\
         {\n\
         \x20 \"signal\": \"BUY\" | \"SELL\" | \"HOLD\",\n\
         \x20 \"confidence\": number (0.0 to 1.0),\n\
         \x20 \"reasoning\": \"Brief explanation for the signal.\",\n\
         \x20 \"suggestedParameters\": { }\n\
         }\n\
         Only provide the JSON object.",
    );

    prompt
}

/// Build the free-text backtest summary prompt.
pub fn backtest_prompt(asset: &Asset, strategy: &Strategy) -> String {
    format!(
        "Provide a conceptual summary of a backtest for {} ({}) using the {} strategy \
         over a hypothetical past year.\n\
         Strategy Description: {}.\n\
         Assume typical market conditions for crypto.\n\
         Include hypothetical performance metrics like:\n\
         - Total Return (%)\n\
         - Max Drawdown (%)\n\
         - Sharpe Ratio\n\
         - Sortino Ratio\n\
         - Calmar Ratio\n\
         - Number of Trades\n\
         Also, briefly explain how Monte Carlo simulation could assess the robustness of \
         these results and what Value at Risk (VaR) at 95% confidence might imply for \
         this strategy.\n\
         Keep the response concise and informative. Structure as a summary.",
        asset.name, asset.symbol, strategy.name, strategy.description,
    )
}

/// One OHLCV line, ISO-timestamped: the shape the model sees per candle.
fn candle_line(candle: &Candle) -> String {
    let time = DateTime::<Utc>::from_timestamp_millis(candle.time_ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| candle.time_ms.to_string());
    format!(
        "Time: {}, Open: {}, High: {}, Low: {}, Close: {}, Volume: {}",
        time, candle.open, candle.high, candle.low, candle.close, candle.volume
    )
}
