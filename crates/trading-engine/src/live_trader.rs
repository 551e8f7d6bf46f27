//! Live execution controller.
//!
//! Drives one strategy against a kline stream: seeds the candle buffer from
//! history on the first closed bar, recomputes the signal series over the
//! full buffer on every close, and routes a market order whenever the
//! latest position flips.

use std::sync::Arc;

use binance_core::types::{upsert_candle, Candle, KlineEvent, MarketOrder, OrderSide};
use binance_core::{ExchangeGateway, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use signal_engine::{registry, Position, SignalFn, StrategyParams, TradeSignal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::executor::{OrderRouter, TradeMode};

/// Lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivePhase {
    /// Created, exchange not yet configured.
    Initializing,
    /// Exchange configured, waiting for the first closed bar.
    Warm,
    /// Buffer seeded, processing closed bars.
    Streaming,
    /// Stream ended, no further bars will be processed.
    Closed,
}

/// Emitted whenever the latest computed position differs from the held one.
#[derive(Debug, Clone)]
pub struct PositionTransition {
    pub from: Position,
    pub to: Position,
    pub signal: TradeSignal,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LiveTraderConfig {
    pub symbol: String,
    pub interval: String,
    pub strategy: String,
    pub params: StrategyParams,
    /// Order quantity in base asset units.
    pub quantity: Decimal,
    pub mode: TradeMode,
    pub leverage: u32,
    /// How far back to fetch history when seeding the buffer.
    pub lookback: Duration,
}

/// One strategy, one symbol, one interval.
///
/// The controller tracks its held position optimistically: it is advanced as
/// soon as a flip is detected, before the routed order is acknowledged.
/// Order submission is fire-and-forget and never blocks bar processing.
pub struct LiveTrader<G> {
    config: LiveTraderConfig,
    signal_fn: SignalFn,
    gateway: Arc<G>,
    router: Arc<OrderRouter<G>>,
    candles: Vec<Candle>,
    last_position: Position,
    phase: LivePhase,
    transition_tx: mpsc::Sender<PositionTransition>,
    transition_rx: Option<mpsc::Receiver<PositionTransition>>,
}

impl<G: ExchangeGateway> LiveTrader<G> {
    /// Create a controller for a registered strategy.
    ///
    /// Fails with `UnknownStrategy` if the name is not in the registry.
    pub fn new(gateway: Arc<G>, config: LiveTraderConfig) -> Result<Self> {
        let signal_fn = registry::get(&config.strategy)?;
        Ok(Self::with_signal_fn(gateway, config, signal_fn))
    }

    /// Create a controller with an explicit signal function, bypassing the
    /// registry lookup.
    pub fn with_signal_fn(gateway: Arc<G>, config: LiveTraderConfig, signal_fn: SignalFn) -> Self {
        let (transition_tx, transition_rx) = mpsc::channel(1000);
        let router = Arc::new(OrderRouter::new(Arc::clone(&gateway), config.mode));
        Self {
            config,
            signal_fn,
            gateway,
            router,
            candles: Vec::new(),
            last_position: Position::Flat,
            phase: LivePhase::Initializing,
            transition_tx,
            transition_rx: Some(transition_rx),
        }
    }

    /// Take the transition receiver. Can only be taken once.
    pub fn take_transition_receiver(&mut self) -> Option<mpsc::Receiver<PositionTransition>> {
        self.transition_rx.take()
    }

    pub fn phase(&self) -> LivePhase {
        self.phase
    }

    pub fn last_position(&self) -> Position {
        self.last_position
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Consume the kline stream until it closes.
    ///
    /// In-progress bars are skipped. A failed buffer seed is fatal; a failed
    /// order submission is logged and the held position keeps its new value.
    pub async fn run(&mut self, mut bars: mpsc::Receiver<KlineEvent>) -> Result<()> {
        self.initialize().await;

        while let Some(event) = bars.recv().await {
            if !event.is_closed {
                debug!(symbol = %self.config.symbol, "Skipping in-progress bar");
                continue;
            }
            if let Err(e) = self.on_closed_bar(event).await {
                self.phase = LivePhase::Closed;
                return Err(e);
            }
        }

        self.phase = LivePhase::Closed;
        info!(
            symbol = %self.config.symbol,
            position = self.last_position.as_i8(),
            "Kline stream closed, live trader stopped"
        );
        Ok(())
    }

    /// Configure leverage and one-way position mode on the exchange.
    ///
    /// Configuration failure is logged but not fatal; backtested defaults may
    /// already be in place on the account.
    async fn initialize(&mut self) {
        info!(
            symbol = %self.config.symbol,
            interval = %self.config.interval,
            strategy = %self.config.strategy,
            params = %self.config.params,
            mode = self.config.mode.as_str(),
            "Starting live trader"
        );
        if let Err(e) = self
            .gateway
            .configure_futures(&self.config.symbol, self.config.leverage)
            .await
        {
            warn!(error = %e, "Failed to configure futures account, continuing");
        }
        self.phase = LivePhase::Warm;
    }

    async fn on_closed_bar(&mut self, event: KlineEvent) -> Result<()> {
        let candle = event.to_candle();

        if self.candles.is_empty() {
            self.seed_buffer(candle.open_time).await?;
            self.phase = LivePhase::Streaming;
        }

        upsert_candle(&mut self.candles, candle);
        self.check_signal();
        Ok(())
    }

    /// Fetch recent history so the EMAs are warm from the first bar.
    async fn seed_buffer(&mut self, up_to: DateTime<Utc>) -> Result<()> {
        let start = up_to - self.config.lookback;
        let history = self
            .gateway
            .klines(&self.config.symbol, &self.config.interval, start, up_to)
            .await?;
        info!(
            symbol = %self.config.symbol,
            bars = history.len(),
            "Seeded candle buffer from history"
        );
        self.candles = history;
        Ok(())
    }

    /// Recompute the signal series and react to a position flip.
    fn check_signal(&mut self) {
        let records = match (self.signal_fn)(&self.candles, &self.config.params) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Signal evaluation failed, skipping bar");
                return;
            }
        };
        let Some(latest) = records.last() else {
            return;
        };

        let position = latest.position;
        if position == self.last_position {
            return;
        }

        let transition = PositionTransition {
            from: self.last_position,
            to: position,
            signal: TradeSignal::from_transition(self.last_position, position),
            at: latest.open_time,
        };
        info!(
            symbol = %self.config.symbol,
            from = transition.from.as_i8(),
            to = transition.to.as_i8(),
            signal = transition.signal.as_str(),
            at = %transition.at,
            "Position transition"
        );
        if let Err(e) = self.transition_tx.try_send(transition) {
            warn!(error = %e, "Dropping position transition event");
        }

        self.dispatch_order(position);
        // Held position advances before the order outcome is known.
        self.last_position = position;
    }

    /// Fire-and-forget order submission toward the new position.
    fn dispatch_order(&self, position: Position) {
        let side = if position.as_i8() > self.last_position.as_i8() {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let order = MarketOrder::new(self.config.symbol.clone(), side, self.config.quantity);
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            if let Err(e) = router.submit(order).await {
                warn!(error = %e, "Order submission failed");
            }
        });
    }
}
