//! Parameter search: exhaustive grid and sequential sampling.

use crate::engine::{run_backtest, BacktestReport};
use binance_core::types::Candle;
use binance_core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use signal_engine::{DualEmaParams, StrategyParams};
use tracing::{debug, info, warn};

/// Pick the better of two indexed candidates: higher PnL wins, equal PnL
/// falls back to the earlier enumeration index. NaN always loses.
fn better(
    a: (usize, BacktestReport),
    b: (usize, BacktestReport),
) -> (usize, BacktestReport) {
    match b.1.pnl.partial_cmp(&a.1.pnl) {
        Some(std::cmp::Ordering::Greater) => b,
        Some(std::cmp::Ordering::Less) => a,
        Some(std::cmp::Ordering::Equal) => {
            if b.0 < a.0 {
                b
            } else {
                a
            }
        }
        None => {
            if a.1.pnl.is_nan() {
                b
            } else {
                a
            }
        }
    }
}

/// Exhaustive grid search over fast/slow candidate sets.
///
/// Enumeration order (fast outer, slow inner) is part of the contract:
/// among equal-PnL candidates the first-enumerated pair wins. Pairs with
/// `fast >= slow` are skipped; candidates whose backtest fails are skipped
/// with a warning. Evaluation is parallel; candidates share no state.
pub fn grid_search(
    candles: &[Candle],
    strategy: &str,
    fast_grid: &[usize],
    slow_grid: &[usize],
    fee_pct: f64,
) -> Result<BacktestReport> {
    let pairs: Vec<(usize, usize)> = fast_grid
        .iter()
        .flat_map(|&fast| slow_grid.iter().map(move |&slow| (fast, slow)))
        .filter(|(fast, slow)| fast < slow)
        .collect();

    info!(
        strategy = strategy,
        candidates = pairs.len(),
        fast_grid = ?fast_grid,
        slow_grid = ?slow_grid,
        "Starting grid search"
    );

    let best = pairs
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &(fast, slow))| {
            let params = StrategyParams::DualEma(DualEmaParams::new(fast, slow).ok()?);
            match run_backtest(candles, strategy, &params, fee_pct) {
                Ok(report) => Some((idx, report)),
                Err(e) => {
                    warn!(fast = fast, slow = slow, error = %e, "Skipping failed candidate");
                    None
                }
            }
        })
        .reduce_with(better);

    let (_, report) = best.ok_or_else(|| {
        Error::InvalidData("grid search produced no viable parameter pair".to_string())
    })?;
    info!(params = %report.params, pnl = report.pnl, "Grid search selected best candidate");
    Ok(report)
}

/// Configuration for the sequential (Bayesian-style) search.
#[derive(Debug, Clone)]
pub struct BayesConfig {
    /// Inclusive range for the fast span.
    pub fast_range: (usize, usize),
    /// Inclusive range for the slow span.
    pub slow_range: (usize, usize),
    /// Trial budget; pruned trials consume budget too.
    pub n_trials: u32,
    /// Fixed RNG seed for reproducible searches.
    pub seed: Option<u64>,
}

impl Default for BayesConfig {
    fn default() -> Self {
        Self {
            fast_range: (5, 50),
            slow_range: (10, 100),
            n_trials: 50,
            seed: None,
        }
    }
}

/// Sequential search over continuous integer ranges with trial pruning.
///
/// Uniform exploration warms the sampler up, after which half of the draws
/// concentrate around the incumbent best. Candidates with `fast >= slow` or
/// a failing backtest are pruned: they consume a trial but never touch the
/// running best. The winning pair is re-run once at the end so the returned
/// report is a canonical replay, never a value cached mid-search.
pub fn bayes_search(
    candles: &[Candle],
    strategy: &str,
    config: &BayesConfig,
    fee_pct: f64,
) -> Result<BacktestReport> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let warmup = (config.n_trials / 4).max(1);
    let mut best: Option<(f64, usize, usize)> = None;

    for trial in 0..config.n_trials {
        let explore = trial < warmup || best.is_none() || rng.gen_bool(0.5);
        let (fast, slow) = if explore {
            (
                rng.gen_range(config.fast_range.0..=config.fast_range.1),
                rng.gen_range(config.slow_range.0..=config.slow_range.1),
            )
        } else {
            let (_, best_fast, best_slow) = best.expect("incumbent exists past warmup");
            (
                perturb(&mut rng, best_fast, config.fast_range),
                perturb(&mut rng, best_slow, config.slow_range),
            )
        };

        if fast >= slow {
            debug!(trial = trial, fast = fast, slow = slow, "Pruned invalid pair");
            continue;
        }
        let Ok(params) = DualEmaParams::new(fast, slow) else {
            debug!(trial = trial, fast = fast, slow = slow, "Pruned unconstructible pair");
            continue;
        };

        match run_backtest(candles, strategy, &StrategyParams::DualEma(params), fee_pct) {
            Ok(report) => {
                if best.map_or(true, |(best_pnl, _, _)| report.pnl > best_pnl) {
                    debug!(
                        trial = trial,
                        fast = fast,
                        slow = slow,
                        pnl = report.pnl,
                        "New incumbent"
                    );
                    best = Some((report.pnl, fast, slow));
                }
            }
            Err(e) => {
                debug!(trial = trial, fast = fast, slow = slow, error = %e, "Pruned failing trial");
            }
        }
    }

    let (_, fast, slow) = best.ok_or_else(|| {
        Error::InvalidData("sequential search pruned every trial".to_string())
    })?;

    // Canonical replay of the winner; search bookkeeping is not returned.
    let params = StrategyParams::DualEma(DualEmaParams::new(fast, slow)?);
    let report = run_backtest(candles, strategy, &params, fee_pct)?;
    info!(
        strategy = strategy,
        params = %report.params,
        pnl = report.pnl,
        trials = config.n_trials,
        "Sequential search selected best candidate"
    );
    Ok(report)
}

/// Sample near `center`, clamped to the inclusive range.
fn perturb(rng: &mut StdRng, center: usize, range: (usize, usize)) -> usize {
    let width = ((range.1 - range.0) / 8).max(1) as i64;
    let offset = rng.gen_range(-width..=width);
    (center as i64 + offset).clamp(range.0 as i64, range.1 as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(30 * i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn wavy(n: usize) -> Vec<Candle> {
        series(
            &(0..n)
                .map(|i| 100.0 + (i as f64 * 0.35).sin() * 6.0 + i as f64 * 0.05)
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_grid_search_is_exhaustively_optimal() {
        let candles = wavy(120);
        let fast_grid = [2, 4, 6, 8];
        let slow_grid = [10, 20, 30];
        let best = grid_search(&candles, "dual_ema", &fast_grid, &slow_grid, 0.0004).unwrap();

        for &fast in &fast_grid {
            for &slow in &slow_grid {
                if fast >= slow {
                    continue;
                }
                let params = StrategyParams::DualEma(DualEmaParams::new(fast, slow).unwrap());
                let report = run_backtest(&candles, "dual_ema", &params, 0.0004).unwrap();
                assert!(best.pnl >= report.pnl);
            }
        }
    }

    #[test]
    fn test_grid_search_tie_breaks_to_first_pair() {
        // Constant closes: every pair trades identically at zero fee, so all
        // PnLs tie at zero and the first enumerated pair must win.
        let candles = series(&[100.0; 30]);
        let best = grid_search(&candles, "dual_ema", &[2, 3, 4], &[5, 10], 0.0).unwrap();
        let StrategyParams::DualEma(params) = best.params;
        assert_eq!((params.fast(), params.slow()), (2, 5));
    }

    #[test]
    fn test_grid_search_skips_degenerate_pairs() {
        let candles = wavy(60);
        // Only (5, 10) is valid.
        let best = grid_search(&candles, "dual_ema", &[5, 10, 20], &[10], 0.0004).unwrap();
        let StrategyParams::DualEma(params) = best.params;
        assert_eq!((params.fast(), params.slow()), (5, 10));
    }

    #[test]
    fn test_grid_search_with_no_viable_pair_fails() {
        let candles = wavy(60);
        assert!(grid_search(&candles, "dual_ema", &[50], &[10], 0.0).is_err());
    }

    #[test]
    fn test_bayes_search_returns_valid_replayed_result() {
        let candles = wavy(120);
        let config = BayesConfig {
            fast_range: (2, 10),
            slow_range: (11, 30),
            n_trials: 25,
            seed: Some(7),
        };
        let best = bayes_search(&candles, "dual_ema", &config, 0.0004).unwrap();

        let StrategyParams::DualEma(params) = best.params;
        assert!(params.fast() < params.slow());

        // The returned report must equal an explicit replay of the winner.
        let replay = run_backtest(&candles, "dual_ema", &best.params, 0.0004).unwrap();
        assert_eq!(best.pnl.to_bits(), replay.pnl.to_bits());
        assert_eq!(best.trades, replay.trades);
    }

    #[test]
    fn test_bayes_search_is_reproducible_with_seed() {
        let candles = wavy(100);
        let config = BayesConfig {
            fast_range: (2, 12),
            slow_range: (13, 40),
            n_trials: 20,
            seed: Some(42),
        };
        let a = bayes_search(&candles, "dual_ema", &config, 0.0004).unwrap();
        let b = bayes_search(&candles, "dual_ema", &config, 0.0004).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.pnl.to_bits(), b.pnl.to_bits());
    }

    #[test]
    fn test_bayes_search_all_pruned_fails() {
        let candles = wavy(60);
        // fast range strictly above slow range: every trial is pruned.
        let config = BayesConfig {
            fast_range: (20, 30),
            slow_range: (2, 10),
            n_trials: 15,
            seed: Some(1),
        };
        assert!(bayes_search(&candles, "dual_ema", &config, 0.0).is_err());
    }

    #[test]
    fn test_better_prefers_lower_index_on_tie() {
        let candles = series(&[100.0, 101.0, 102.0]);
        let params = StrategyParams::DualEma(DualEmaParams::new(2, 5).unwrap());
        let a = run_backtest(&candles, "dual_ema", &params, 0.0).unwrap();
        let b = a.clone();
        let (idx, _) = better((3, a), (1, b));
        assert_eq!(idx, 1);
    }
}
