//! Signal runner - the bot's control loop
//!
//! One actor task owns all dashboard state and serializes every mutation.
//! Commands arrive over a channel from `Controller` handles; gateway work
//! (ticks, backtests, market refreshes) runs in spawned tasks that report
//! back over an internal channel, so results are applied on the actor and
//! never race each other.
//!
//! Two guards keep the loop well-behaved: a single in-flight slot (a timer
//! firing while work is still running is a logged no-op) and a run epoch
//! (stop bumps it; completions carrying a stale epoch are discarded before
//! they can touch state).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::insight::{GenerationConfig, InsightError, InsightSource};
use crate::market::MarketDataSource;
use crate::prompt;
use crate::state::{DashboardSnapshot, DashboardState};
use crate::types::{Asset, BotState, Candle, SignalResponse, Strategy};

/// Spacing between ticks in looping mode
pub const TICK_PERIOD: Duration = Duration::from_secs(30);

/// Candle interval requested per tick
const CANDLE_INTERVAL: &str = "1h";

/// Candle count requested per tick
const CANDLE_LIMIT: usize = 50;

/// Command channel depth; commands are tiny and handled promptly
const CHANNEL_CAPACITY: usize = 32;

/// External commands accepted by the runner
enum Command {
    Start { looping: bool },
    Stop,
    RunBacktest,
    SelectAsset { id: String },
    SelectStrategy { id: String },
}

/// Completions reported back by spawned gateway work
enum Internal {
    TickDone {
        epoch: u64,
        outcome: TickOutcome,
    },
    BacktestDone {
        epoch: u64,
        result: Result<String, InsightError>,
    },
    RefreshDone {
        symbol: String,
        candles: Vec<Candle>,
    },
}

/// Result of one fetch -> prompt -> generate sequence
enum TickOutcome {
    /// The market gateway produced no candles; nothing else ran.
    NoData,
    Signal {
        candles: Vec<Candle>,
        latest_price: Decimal,
        signal: SignalResponse,
    },
    Failed {
        candles: Option<Vec<Candle>>,
        message: String,
    },
}

/// Cloneable handle for sending commands and observing snapshots
#[derive(Clone)]
pub struct Controller {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<DashboardSnapshot>,
}

impl Controller {
    /// Start the bot. `looping` arms the repeating timer; either way one
    /// tick runs immediately.
    pub async fn start(&self, looping: bool) -> anyhow::Result<()> {
        self.send(Command::Start { looping }).await
    }

    /// Stop the bot. Idempotent.
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(Command::Stop).await
    }

    /// Ask for a free-text backtest summary. Refused while the bot runs.
    pub async fn run_backtest(&self) -> anyhow::Result<()> {
        self.send(Command::RunBacktest).await
    }

    pub async fn select_asset(&self, id: &str) -> anyhow::Result<()> {
        self.send(Command::SelectAsset { id: id.to_string() }).await
    }

    pub async fn select_strategy(&self, id: &str) -> anyhow::Result<()> {
        self.send(Command::SelectStrategy { id: id.to_string() }).await
    }

    /// Current dashboard state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch receiver for presentation layers; one value per mutation.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("signal runner is no longer running"))
    }
}

/// The actor that owns dashboard state and drives the signal loop
pub struct SignalRunner {
    market: Arc<dyn MarketDataSource>,
    /// None when the gateway could not be configured; start() then refuses.
    insight: Option<Arc<dyn InsightSource>>,
    state: DashboardState,
    commands: mpsc::Receiver<Command>,
    internal_tx: mpsc::Sender<Internal>,
    internal_rx: mpsc::Receiver<Internal>,
    snapshots: watch::Sender<DashboardSnapshot>,
    /// Bumped on every start and stop; spawned work carries the epoch it was
    /// issued under and stale completions are discarded.
    epoch: u64,
    /// Epoch of the outstanding tick or backtest, if any
    in_flight: Option<u64>,
}

impl SignalRunner {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        insight: Option<Arc<dyn InsightSource>>,
    ) -> (Self, Controller) {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (internal_tx, internal_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let state = DashboardState::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let runner = Self {
            market,
            insight,
            state,
            commands: command_rx,
            internal_tx,
            internal_rx,
            snapshots: snapshot_tx,
            epoch: 0,
            in_flight: None,
        };
        let controller = Controller {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runner, controller)
    }

    /// Spawn the runner onto the current runtime and return its handle.
    pub fn spawn(
        market: Arc<dyn MarketDataSource>,
        insight: Option<Arc<dyn InsightSource>>,
    ) -> Controller {
        let (runner, controller) = Self::new(market, insight);
        tokio::spawn(runner.run());
        controller
    }

    /// Main actor loop. Exits when every controller handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.publish();

        loop {
            let timer_armed = self.timer_armed();
            tokio::select! {
                maybe_cmd = self.commands.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd, &mut ticker),
                        None => {
                            debug!("All controller handles dropped; signal runner exiting.");
                            break;
                        }
                    }
                }
                Some(msg) = self.internal_rx.recv() => {
                    self.handle_internal(msg);
                }
                _ = ticker.tick(), if timer_armed => {
                    self.begin_tick();
                    self.publish();
                }
            }
        }
    }

    /// The repeating timer only fires while running in looping mode with a
    /// usable gateway.
    fn timer_armed(&self) -> bool {
        self.state.bot_state == BotState::Running
            && self.state.looping
            && self.insight.is_some()
    }

    fn handle_command(&mut self, command: Command, ticker: &mut Interval) {
        match command {
            Command::Start { looping } => self.handle_start(looping, ticker),
            Command::Stop => self.handle_stop(),
            Command::RunBacktest => self.handle_backtest(),
            Command::SelectAsset { id } => self.handle_select_asset(&id),
            Command::SelectStrategy { id } => self.handle_select_strategy(&id),
        }
        self.publish();
    }

    fn handle_start(&mut self, looping: bool, ticker: &mut Interval) {
        if self.insight.is_none() {
            warn!("Cannot start bot: insight service not available.");
            self.state
                .logs
                .push("Cannot start bot: insight service not available.");
            self.state.insight = "Error: insight service is not available. This usually \
                                  means the API key is missing or invalid."
                .to_string();
            return;
        }
        if self.state.bot_state == BotState::Running {
            self.state.logs.push("Bot is already running.");
            return;
        }

        self.epoch += 1;
        self.state.bot_state = BotState::Running;
        self.state.looping = looping;
        if looping {
            self.state.logs.push(format!(
                "Bot started in continuous looping mode. Generating signal every {} seconds.",
                TICK_PERIOD.as_secs()
            ));
            // First interval firing lands one full period after the
            // immediate tick below.
            ticker.reset();
        } else {
            self.state
                .logs
                .push("Bot started for single signal generation.");
        }
        info!(looping, "Bot started");
        self.begin_tick();
    }

    fn handle_stop(&mut self) {
        let was_running = self.state.bot_state == BotState::Running;
        self.state.bot_state = BotState::Stopped;
        self.state.looping = false;
        self.state.busy = false;
        self.epoch += 1;
        if was_running {
            info!("Bot stopped");
            self.state.logs.push("Bot stopped manually.");
        } else {
            debug!("Stop requested while already stopped.");
        }
    }

    fn handle_backtest(&mut self) {
        let Some(insight) = self.insight.clone() else {
            self.state
                .logs
                .push("Cannot run backtest: insight service not available.");
            self.state.insight =
                "Backtest requires the insight service. Check API key and configuration."
                    .to_string();
            return;
        };
        if self.state.bot_state == BotState::Running {
            self.state
                .logs
                .push("Backtest unavailable while the bot is running.");
            return;
        }
        if self.in_flight.is_some() {
            self.state
                .logs
                .push("Backtest skipped: previous request still in flight.");
            return;
        }

        let asset = self.state.selected_asset.clone();
        let strategy = self.state.selected_strategy.clone();
        self.state.busy = true;
        self.in_flight = Some(self.epoch);
        self.state.insight.clear();
        self.state.logs.push(format!(
            "Running simulated backtest for {} with {}...",
            asset.symbol, strategy.name
        ));

        let prompt = prompt::backtest_prompt(&asset, &strategy);
        let epoch = self.epoch;
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = insight.generate_text(&prompt, &GenerationConfig::plain()).await;
            let _ = tx.send(Internal::BacktestDone { epoch, result }).await;
        });
    }

    /// Launch one tick, unless a guard says otherwise.
    fn begin_tick(&mut self) {
        if self.state.bot_state != BotState::Running {
            debug!("Tick skipped: bot not running.");
            return;
        }
        let Some(insight) = self.insight.clone() else {
            self.state
                .logs
                .push("Cannot generate signal: insight service not available.");
            return;
        };
        if self.in_flight.is_some() {
            self.state
                .logs
                .push("Signal generation skipped: previous run still in flight.");
            return;
        }

        let asset = self.state.selected_asset.clone();
        let strategy = self.state.selected_strategy.clone();
        self.state.busy = true;
        self.in_flight = Some(self.epoch);
        self.state.insight.clear();
        self.state.logs.push(format!(
            "Generating signal for {} using {}...",
            asset.symbol, strategy.name
        ));

        let market = Arc::clone(&self.market);
        let epoch = self.epoch;
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let outcome = run_tick(market, insight, &asset, &strategy).await;
            let _ = tx.send(Internal::TickDone { epoch, outcome }).await;
        });
    }

    fn handle_internal(&mut self, msg: Internal) {
        match msg {
            Internal::TickDone { epoch, outcome } => {
                if self.in_flight == Some(epoch) {
                    self.in_flight = None;
                    self.state.busy = false;
                }
                if epoch != self.epoch {
                    debug!(
                        "Discarding tick result from epoch {} (current {}).",
                        epoch, self.epoch
                    );
                    self.state.logs.push("Discarded stale signal result.");
                    self.publish();
                    return;
                }
                self.apply_tick_outcome(outcome);
                self.publish();
            }
            Internal::BacktestDone { epoch, result } => {
                if self.in_flight == Some(epoch) {
                    self.in_flight = None;
                    self.state.busy = false;
                }
                if epoch != self.epoch {
                    debug!(
                        "Discarding backtest result from epoch {} (current {}).",
                        epoch, self.epoch
                    );
                    self.state.logs.push("Discarded stale backtest result.");
                    self.publish();
                    return;
                }
                match result {
                    Ok(text) => {
                        self.state.insight = text;
                        self.state.logs.push(format!(
                            "Backtest simulation summary received for {}.",
                            self.state.selected_asset.symbol
                        ));
                    }
                    Err(e) => {
                        let message = format!("Error running backtest: {e}");
                        warn!("{}", message);
                        self.state.insight = message.clone();
                        self.state.logs.push(message);
                    }
                }
                self.publish();
            }
            Internal::RefreshDone { symbol, candles } => {
                if self.state.selected_asset.symbol == symbol {
                    self.state.market_data = candles;
                    self.state
                        .logs
                        .push(format!("Market data for {} updated.", symbol));
                    self.publish();
                } else {
                    debug!("Discarding market refresh for {}; selection changed.", symbol);
                }
            }
        }
    }

    fn apply_tick_outcome(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::NoData => {
                self.state
                    .logs
                    .push("Signal generation skipped: No market data available.");
            }
            TickOutcome::Signal {
                candles,
                latest_price,
                signal,
            } => {
                self.state.market_data = candles;
                self.state.logs.push(format!(
                    "Market data for {} updated.",
                    self.state.selected_asset.symbol
                ));
                self.apply_signal(latest_price, signal);
            }
            TickOutcome::Failed { candles, message } => {
                if let Some(candles) = candles {
                    self.state.market_data = candles;
                }
                warn!("{}", message);
                self.state.insight = message.clone();
                self.state.logs.push(message);
            }
        }
    }

    fn apply_signal(&mut self, latest_price: Decimal, signal: SignalResponse) {
        self.state.insight = format!(
            "Signal: {}, Confidence: {:.2}\nReasoning: {}",
            signal.signal, signal.confidence, signal.reasoning
        );
        self.state.logs.push(format!(
            "Insight: {} signal for {} with confidence {:.2}. Reasoning: {}",
            signal.signal,
            self.state.selected_asset.symbol,
            signal.confidence,
            signal.reasoning
        ));

        if let Some(kind) = signal.signal.trade_kind() {
            let asset = self.state.selected_asset.clone();
            let strategy = self.state.selected_strategy.clone();
            let now_ms = Utc::now().timestamp_millis();
            self.state
                .ledger
                .record(&asset, &strategy, kind, latest_price, now_ms);
            self.state.logs.push(format!(
                "Simulated {} trade for {} at {}.",
                kind, asset.symbol, latest_price
            ));
        }
    }

    fn handle_select_asset(&mut self, id: &str) {
        match catalog::asset_by_id(id) {
            Some(asset) => {
                if asset.id == self.state.selected_asset.id {
                    return;
                }
                self.state
                    .logs
                    .push(format!("Selected asset {} ({}).", asset.name, asset.symbol));
                self.state.selected_asset = asset.clone();
                self.state
                    .logs
                    .push(format!("Fetching market data for {}...", asset.symbol));

                let market = Arc::clone(&self.market);
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let candles = market
                        .fetch_candles(&asset.symbol, CANDLE_INTERVAL, CANDLE_LIMIT)
                        .await;
                    let _ = tx
                        .send(Internal::RefreshDone {
                            symbol: asset.symbol,
                            candles,
                        })
                        .await;
                });
            }
            None => {
                self.state.logs.push(format!("Unknown asset id '{}'.", id));
            }
        }
    }

    fn handle_select_strategy(&mut self, id: &str) {
        match catalog::strategy_by_id(id) {
            Some(strategy) => {
                if strategy.id != self.state.selected_strategy.id {
                    self.state
                        .logs
                        .push(format!("Selected strategy {}.", strategy.name));
                    self.state.selected_strategy = strategy;
                }
            }
            None => {
                self.state.logs.push(format!("Unknown strategy id '{}'.", id));
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}

/// One fetch -> prompt -> generate sequence, free of runner state.
async fn run_tick(
    market: Arc<dyn MarketDataSource>,
    insight: Arc<dyn InsightSource>,
    asset: &Asset,
    strategy: &Strategy,
) -> TickOutcome {
    let candles = market
        .fetch_candles(&asset.symbol, CANDLE_INTERVAL, CANDLE_LIMIT)
        .await;
    let Some(latest) = candles.last() else {
        return TickOutcome::NoData;
    };
    let latest_price = latest.close;

    let prompt = prompt::signal_prompt(asset, strategy, latest_price, &candles);
    match insight
        .generate_json(&prompt, &GenerationConfig::structured())
        .await
    {
        Ok(value) => match serde_json::from_value::<SignalResponse>(value) {
            Ok(signal) => TickOutcome::Signal {
                candles,
                latest_price,
                signal,
            },
            Err(e) => TickOutcome::Failed {
                candles: Some(candles),
                message: format!("Error generating signal: unexpected signal payload: {e}"),
            },
        },
        Err(e) => TickOutcome::Failed {
            candles: Some(candles),
            message: format!("Error generating signal: {e}"),
        },
    }
}
