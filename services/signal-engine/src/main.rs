//! Signal Engine - AI trading-signal dashboard engine
//!
//! Headless runner for the dashboard core:
//! 1. Loads configuration from the environment
//! 2. Builds the market data and insight gateways
//! 3. Spawns the signal runner and starts it in looping mode
//! 4. Mirrors dashboard snapshots to the log until ctrl-c

use std::sync::Arc;

use tracing::{error, info};

use signal_engine::{
    BinanceClient, Config, Controller, DashboardSnapshot, InsightClient, InsightSource,
    MarketDataSource, SignalRunner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("signal_engine=info")),
        )
        .init();

    info!("Starting Signal Engine...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!();
            eprintln!("Configuration Error");
            eprintln!("-------------------");
            eprintln!("{e}");
            eprintln!("Set INSIGHT_API_KEY to use this application.");
            std::process::exit(1);
        }
    };

    info!(
        "Market endpoint: {}, insight endpoint: {}, model: {}",
        config.market_base_url, config.insight_base_url, config.insight_model
    );

    let market: Arc<dyn MarketDataSource> =
        Arc::new(BinanceClient::new(config.market_base_url.clone()));
    let insight: Arc<dyn InsightSource> = Arc::new(InsightClient::new(
        config.insight_base_url.clone(),
        config.insight_api_key.clone(),
        config.insight_model.clone(),
    )?);

    let controller = SignalRunner::spawn(market, Some(insight));
    controller.start(true).await?;

    watch_dashboard(&controller).await;

    controller.stop().await?;
    info!("Signal Engine stopped.");
    Ok(())
}

/// Mirror snapshot changes to the log until ctrl-c.
async fn watch_dashboard(controller: &Controller) {
    let mut snapshots = controller.subscribe();
    let mut last_insight = String::new();
    let mut last_trade_count = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested.");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                report(&snapshot, &mut last_insight, &mut last_trade_count);
            }
        }
    }
}

fn report(snapshot: &DashboardSnapshot, last_insight: &mut String, last_trade_count: &mut usize) {
    if !snapshot.insight.is_empty() && snapshot.insight != *last_insight {
        info!("Insight: {}", snapshot.insight.replace('\n', " | "));
        *last_insight = snapshot.insight.clone();
    }
    if snapshot.trades.len() != *last_trade_count {
        if let Some(trade) = snapshot.trades.first() {
            info!(
                "Trade #{}: {} {} at {} ({})",
                snapshot.trades.len(),
                trade.kind,
                trade.asset,
                trade.price,
                trade.strategy
            );
        }
        *last_trade_count = snapshot.trades.len();
    }
}
