//! Property tests for the signal and simulation invariants.
//!
//! Uses proptest to verify:
//! 1. No lookahead: changing bars after t never changes signals at or before t
//! 2. Cost monotonicity: higher fees or slippage never raise final equity
//! 3. Equity stays non-negative and drawdown stays non-positive

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use stratbench::domain::backtest::{run_backtest, run_strategy};
use stratbench::domain::config::Config;
use stratbench::domain::ohlcv::PriceBar;
use stratbench::domain::preset::Preset;
use stratbench::domain::strategy::{SignalGenerator, StrategyKind};

// ── Generators ───────────────────────────────────────────────────────

fn arb_steps(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04..0.04_f64, len)
}

fn arb_volumes(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(200.0..5_000.0_f64, len)
}

fn arb_kind() -> impl Strategy<Value = StrategyKind> {
    prop::sample::select(StrategyKind::ALL.to_vec())
}

/// Geometric random walk from 100; bar i opens at close i-1.
fn walk(steps: &[f64], volumes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut closes = Vec::with_capacity(steps.len());
    let mut price = 100.0_f64;
    for step in steps {
        price *= 1.0 + step;
        closes.push(price);
    }
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: start + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: volumes[i % volumes.len()],
            }
        })
        .collect()
}

// ── 1. No lookahead ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Rewriting every bar after `cut` leaves signals 0..=cut untouched.
    #[test]
    fn future_bars_do_not_change_past_signals(
        steps in arb_steps(60..140),
        other in arb_steps(140..141),
        volumes in arb_volumes(140),
        other_volumes in arb_volumes(140),
        cut_fraction in 0.2..0.95_f64,
        kind in arb_kind(),
    ) {
        let cut = ((steps.len() as f64) * cut_fraction) as usize;
        let mut altered_steps = steps.clone();
        altered_steps[cut + 1..].copy_from_slice(&other[cut + 1..steps.len()]);

        let original = walk(&steps, &volumes);
        let mut altered = walk(&altered_steps, &volumes);
        for (bar, volume) in altered.iter_mut().zip(&other_volumes).skip(cut + 1) {
            bar.volume = *volume;
        }
        prop_assert_eq!(&original[..=cut], &altered[..=cut]);

        let config = Preset::Aggressive.resolve(kind);
        let before = SignalGenerator::new(&original, &config).unwrap().generate();
        let after = SignalGenerator::new(&altered, &config).unwrap().generate();
        prop_assert_eq!(&before[..=cut], &after[..=cut]);
    }

    /// Generating on a prefix gives the same signals as the full series.
    #[test]
    fn truncated_series_reproduces_prefix(
        steps in arb_steps(60..120),
        volumes in arb_volumes(120),
        keep_fraction in 0.3..1.0_f64,
        kind in arb_kind(),
    ) {
        let bars = walk(&steps, &volumes);
        let keep = ((bars.len() as f64) * keep_fraction) as usize;
        let config = Preset::Aggressive.resolve(kind);
        prop_assume!(keep >= config.warmup_bars);

        let full = SignalGenerator::new(&bars, &config).unwrap().generate();
        let prefix = SignalGenerator::new(&bars[..keep], &config).unwrap().generate();
        prop_assert_eq!(&full[..keep], &prefix[..]);
    }
}

// ── 2. Cost monotonicity ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// With the signals held fixed, extra fee or slippage never helps.
    #[test]
    fn higher_costs_never_increase_final_equity(
        steps in arb_steps(80..140),
        volumes in arb_volumes(140),
        kind in arb_kind(),
        base_fee in 0.0..50.0_f64,
        extra_fee in 0.0..50.0_f64,
        base_slip in 0.0..50.0_f64,
        extra_slip in 0.0..50.0_f64,
    ) {
        let bars = walk(&steps, &volumes);
        let mut cheap = Preset::Aggressive.resolve(kind);
        let signals = SignalGenerator::new(&bars, &cheap).unwrap().generate();
        cheap.fee_bps = base_fee;
        cheap.slippage_bps = base_slip;

        let mut pricier_fee = cheap.clone();
        pricier_fee.fee_bps += extra_fee;
        let mut pricier_slip = cheap.clone();
        pricier_slip.slippage_bps += extra_slip;

        let final_equity = |config: &Config| {
            run_backtest(&bars, &signals, config)
                .unwrap()
                .equity_curve
                .last()
                .map(|p| p.total_value)
                .unwrap()
        };
        let base = final_equity(&cheap);
        let tolerance = 1e-9 * base.abs().max(1.0);
        prop_assert!(final_equity(&pricier_fee) <= base + tolerance);
        prop_assert!(final_equity(&pricier_slip) <= base + tolerance);
    }
}

// ── 3. Equity and drawdown bounds ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn equity_non_negative_and_drawdown_non_positive(
        steps in arb_steps(70..150),
        volumes in arb_volumes(150),
        kind in arb_kind(),
        fraction in 0.05..1.0_f64,
    ) {
        let bars = walk(&steps, &volumes);
        let mut config = Preset::Aggressive.resolve(kind);
        config.position_fraction = fraction;
        let report = run_strategy(&bars, &config).unwrap();

        let curve = &report.result.equity_curve;
        prop_assert_eq!(curve[0].total_value, config.initial_capital);
        for point in curve {
            prop_assert!(point.cash >= 0.0);
            prop_assert!(point.total_value >= 0.0);
        }
        prop_assert!(report.metrics.max_drawdown <= 0.0);
        prop_assert!(report.metrics.max_drawdown >= -1.0);
    }
}
