//! EMA-Bot CLI
//!
//! `backtest` runs a parameter search over a historical window; `trade`
//! runs the live execution controller with fixed parameters.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use backtester::{bayes_search, grid_search, BacktestReport, BayesConfig};
use binance_core::api::{FuturesClient, KlineStream};
use binance_core::{Config, ExchangeGateway};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use signal_engine::{DualEmaParams, StrategyParams};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trading_engine::{LiveTrader, LiveTraderConfig, TradeMode};

/// Grid step for the fast span when expanding a range.
const GRID_FAST_STEP: usize = 5;
/// Grid step for the slow span when expanding a range.
const GRID_SLOW_STEP: usize = 10;

#[derive(Parser)]
#[command(name = "ema-bot", about = "Dual-EMA crossover trading for Binance USDⓈ-M futures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search strategy parameters over a historical window
    Backtest {
        /// Registered strategy name
        #[arg(long, default_value = "dual_ema")]
        strategy: String,
        /// Window start, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Window end, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Inclusive fast-span range as "lo,hi"
        #[arg(long, default_value = "5,50", value_parser = parse_range)]
        fast_range: (usize, usize),
        /// Inclusive slow-span range as "lo,hi"
        #[arg(long, default_value = "10,100", value_parser = parse_range)]
        slow_range: (usize, usize),
        #[arg(long, value_enum, default_value = "grid")]
        method: SearchMethod,
    },
    /// Run the live execution controller with fixed parameters
    Trade {
        /// Registered strategy name
        #[arg(long, default_value = "dual_ema")]
        strategy: String,
        /// Fast EMA span
        #[arg(long)]
        fast: usize,
        /// Slow EMA span
        #[arg(long)]
        slow: usize,
        /// Order quantity in base asset units
        #[arg(long)]
        qty: Decimal,
        #[arg(long, value_enum, default_value = "paper")]
        mode: ModeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchMethod {
    /// Exhaustive sweep, fast stepped by 5 and slow by 10
    Grid,
    /// Sequential sampler with 50 trials and pruning
    Optuna,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Simulate fills locally, never touch the exchange
    Paper,
    /// Submit real market orders
    Live,
}

impl From<ModeArg> for TradeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Paper => TradeMode::Paper,
            ModeArg::Live => TradeMode::Live,
        }
    }
}

/// Parse an inclusive "lo,hi" range with lo < hi.
fn parse_range(s: &str) -> std::result::Result<(usize, usize), String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lo,hi\", got \"{s}\""))?;
    let lo: usize = lo.trim().parse().map_err(|e| format!("bad lower bound: {e}"))?;
    let hi: usize = hi.trim().parse().map_err(|e| format!("bad upper bound: {e}"))?;
    if lo >= hi {
        return Err(format!("lower bound {lo} must be below upper bound {hi}"));
    }
    Ok((lo, hi))
}

/// Accepts RFC 3339 timestamps or bare dates (taken as midnight UTC).
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date \"{s}\", expected RFC 3339 or YYYY-MM-DD"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("invalid date \"{s}\""))
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tungstenite=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_report(report: &BacktestReport, candles: usize) {
    println!("Best parameters: {}", report.params);
    println!("PnL:             {:+.4} ({:+.2}%)", report.pnl, report.pnl * 100.0);
    println!("Trades:          {}", report.trades);
    if let Some((_, equity)) = report.equity_curve.last() {
        println!("Final equity:    {equity:.6}");
    }
    println!("Bars:            {candles}");
}

async fn run_backtest(
    strategy: String,
    start: String,
    end: String,
    fast_range: (usize, usize),
    slow_range: (usize, usize),
    method: SearchMethod,
) -> Result<()> {
    let start = parse_date(&start)?;
    let end = parse_date(&end)?;
    if start >= end {
        return Err(anyhow!("start must be before end"));
    }

    let config = Config::from_env_public();
    let client = FuturesClient::new(
        config.binance.api_key.clone(),
        config.binance.api_secret.clone(),
        config.binance.testnet,
    );

    info!(
        symbol = %config.trading.symbol,
        interval = %config.trading.interval,
        %start,
        %end,
        "Fetching historical klines"
    );
    let candles = client
        .klines(&config.trading.symbol, &config.trading.interval, start, end)
        .await?;

    let report = match method {
        SearchMethod::Grid => {
            let fast_grid: Vec<usize> =
                (fast_range.0..=fast_range.1).step_by(GRID_FAST_STEP).collect();
            let slow_grid: Vec<usize> =
                (slow_range.0..=slow_range.1).step_by(GRID_SLOW_STEP).collect();
            grid_search(&candles, &strategy, &fast_grid, &slow_grid, config.trading.fee_pct)?
        }
        SearchMethod::Optuna => {
            let bayes = BayesConfig {
                fast_range,
                slow_range,
                ..BayesConfig::default()
            };
            bayes_search(&candles, &strategy, &bayes, config.trading.fee_pct)?
        }
    };

    print_report(&report, candles.len());
    Ok(())
}

async fn run_trade(
    strategy: String,
    fast: usize,
    slow: usize,
    qty: Decimal,
    mode: ModeArg,
) -> Result<()> {
    let params = StrategyParams::DualEma(DualEmaParams::new(fast, slow)?);

    // Paper runs still read public market data, but never need credentials.
    let config = match mode {
        ModeArg::Live => Config::from_env()?,
        ModeArg::Paper => Config::from_env_public(),
    };
    let gateway = Arc::new(FuturesClient::new(
        config.binance.api_key.clone(),
        config.binance.api_secret.clone(),
        config.binance.testnet,
    ));

    let stream = KlineStream::new(None);
    let bars = stream
        .subscribe(&config.trading.symbol, &config.trading.interval)
        .await?;

    let mut trader = LiveTrader::new(
        gateway,
        LiveTraderConfig {
            symbol: config.trading.symbol.clone(),
            interval: config.trading.interval.clone(),
            strategy,
            params,
            quantity: qty,
            mode: mode.into(),
            leverage: config.trading.leverage,
            lookback: chrono::Duration::days(1),
        },
    )?;
    trader.run(bars).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Backtest {
            strategy,
            start,
            end,
            fast_range,
            slow_range,
            method,
        } => run_backtest(strategy, start, end, fast_range, slow_range, method).await,
        Command::Trade {
            strategy,
            fast,
            slow,
            qty,
            mode,
        } => run_trade(strategy, fast, slow, qty, mode).await,
    }
}
