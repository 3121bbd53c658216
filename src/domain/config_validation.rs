//! Configuration resolution and validation.
//!
//! A run configuration is built in three steps: pick a preset, apply the
//! overrides found in the INI file, then validate the result. Keys the
//! resolver does not know are ignored.

use std::str::FromStr;

use crate::domain::config::{Config, ExitPriority};
use crate::domain::error::{Result, StratbenchError};
use crate::domain::preset::Preset;
use crate::domain::strategy::{
    MeanReversionParams, MomentumParams, PatternParams, RuleBasedParams, Strategy, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";

/// Choices made outside the config file (command line flags). They win over
/// the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub preset: Option<Preset>,
    pub strategy: Option<StrategyKind>,
}

pub fn validate_config(config: &Config) -> Result<()> {
    validate_costs(config)?;
    validate_initial_capital(config)?;
    validate_position_fraction(config)?;
    validate_risk_free_rate(config)?;
    config.strategy.validate()
}

fn validate_costs(config: &Config) -> Result<()> {
    for (key, value) in [("fee_bps", config.fee_bps), ("slippage_bps", config.slippage_bps)] {
        if !value.is_finite() || value < 0.0 {
            return Err(StratbenchError::invalid(
                key,
                format!("{key} must be non-negative, got {value}"),
            ));
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &Config) -> Result<()> {
    if !config.initial_capital.is_finite() || config.initial_capital <= 0.0 {
        return Err(StratbenchError::invalid(
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_position_fraction(config: &Config) -> Result<()> {
    let value = config.position_fraction;
    if !(value > 0.0 && value <= 1.0) {
        return Err(StratbenchError::invalid(
            "position_fraction",
            format!("position_fraction must be within (0, 1], got {value}"),
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &Config) -> Result<()> {
    let value = config.risk_free_rate;
    if !(0.0..1.0).contains(&value) {
        return Err(StratbenchError::invalid(
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Resolve preset, strategy kind and per-key overrides into a validated
/// [`Config`].
pub fn resolve_config(source: &dyn ConfigPort, overrides: Overrides) -> Result<Config> {
    let preset = match overrides.preset {
        Some(p) => p,
        None => read_parsed(source, BACKTEST, "preset")?.unwrap_or_default(),
    };
    let kind = match overrides.strategy {
        Some(k) => k,
        None => read_parsed(source, STRATEGY, "kind")?.ok_or_else(|| {
            StratbenchError::ConfigMissing {
                section: STRATEGY.to_string(),
                key: "kind".to_string(),
            }
        })?,
    };

    let mut config = preset.resolve(kind);
    apply_backtest_section(source, &mut config)?;
    apply_strategy_section(source, &mut config.strategy)?;
    config.validate()?;
    Ok(config)
}

fn apply_backtest_section(source: &dyn ConfigPort, config: &mut Config) -> Result<()> {
    override_usize(source, BACKTEST, "warmup_bars", &mut config.warmup_bars)?;
    override_f64(source, BACKTEST, "fee_bps", &mut config.fee_bps)?;
    override_f64(source, BACKTEST, "slippage_bps", &mut config.slippage_bps)?;
    override_f64(source, BACKTEST, "initial_capital", &mut config.initial_capital)?;
    override_f64(source, BACKTEST, "position_fraction", &mut config.position_fraction)?;
    override_f64(source, BACKTEST, "risk_free_rate", &mut config.risk_free_rate)?;
    if let Some(priority) = read_parsed::<ExitPriority>(source, BACKTEST, "exit_priority")? {
        config.exit_priority = priority;
    }
    Ok(())
}

fn apply_strategy_section(source: &dyn ConfigPort, strategy: &mut Strategy) -> Result<()> {
    match strategy {
        Strategy::RuleBased(p) => apply_rule_based(source, p),
        Strategy::Momentum(p) => apply_momentum(source, p),
        Strategy::MeanReversion(p) => apply_mean_reversion(source, p),
        Strategy::Pattern(p) => apply_pattern(source, p),
    }
}

fn apply_rule_based(source: &dyn ConfigPort, p: &mut RuleBasedParams) -> Result<()> {
    override_usize(source, STRATEGY, "rsi_period", &mut p.rsi_period)?;
    override_f64(source, STRATEGY, "rsi_buy_threshold", &mut p.rsi_buy_threshold)?;
    override_f64(source, STRATEGY, "rsi_sell_threshold", &mut p.rsi_sell_threshold)?;
    override_usize(source, STRATEGY, "macd_fast", &mut p.macd_fast)?;
    override_usize(source, STRATEGY, "macd_slow", &mut p.macd_slow)?;
    override_usize(source, STRATEGY, "macd_signal", &mut p.macd_signal)?;
    override_usize(source, STRATEGY, "trend_period", &mut p.trend_period)?;
    override_usize(source, STRATEGY, "volatility_period", &mut p.volatility_period)?;
    override_f64(source, STRATEGY, "stop_multiplier", &mut p.stop_multiplier)?;
    override_f64(source, STRATEGY, "risk_reward_ratio", &mut p.risk_reward_ratio)?;
    Ok(())
}

fn apply_momentum(source: &dyn ConfigPort, p: &mut MomentumParams) -> Result<()> {
    override_usize(source, STRATEGY, "momentum_period", &mut p.momentum_period)?;
    override_f64(source, STRATEGY, "momentum_threshold", &mut p.momentum_threshold)?;
    override_usize(source, STRATEGY, "volume_period", &mut p.volume_period)?;
    override_f64(source, STRATEGY, "breakout_threshold", &mut p.breakout_threshold)?;
    override_usize(source, STRATEGY, "channel_period", &mut p.channel_period)?;
    override_usize(source, STRATEGY, "atr_period", &mut p.atr_period)?;
    override_f64(source, STRATEGY, "atr_multiplier", &mut p.atr_multiplier)?;
    override_f64(source, STRATEGY, "risk_reward_ratio", &mut p.risk_reward_ratio)?;
    Ok(())
}

fn apply_mean_reversion(source: &dyn ConfigPort, p: &mut MeanReversionParams) -> Result<()> {
    override_usize(source, STRATEGY, "rsi_period", &mut p.rsi_period)?;
    override_f64(source, STRATEGY, "rsi_oversold", &mut p.rsi_oversold)?;
    override_f64(source, STRATEGY, "rsi_overbought", &mut p.rsi_overbought)?;
    override_usize(source, STRATEGY, "bb_period", &mut p.bb_period)?;
    override_f64(source, STRATEGY, "bb_stddev", &mut p.bb_stddev)?;
    override_f64(source, STRATEGY, "band_tolerance", &mut p.band_tolerance)?;
    override_usize(source, STRATEGY, "volatility_period", &mut p.volatility_period)?;
    override_usize(
        source,
        STRATEGY,
        "volatility_median_period",
        &mut p.volatility_median_period,
    )?;
    override_f64(source, STRATEGY, "stop_buffer", &mut p.stop_buffer)?;
    Ok(())
}

fn apply_pattern(source: &dyn ConfigPort, p: &mut PatternParams) -> Result<()> {
    override_usize(source, STRATEGY, "pattern_window", &mut p.pattern_window)?;
    override_usize(
        source,
        STRATEGY,
        "support_resistance_window",
        &mut p.support_resistance_window,
    )?;
    override_f64(source, STRATEGY, "breakout_threshold", &mut p.breakout_threshold)?;
    override_f64(source, STRATEGY, "similarity_tolerance", &mut p.similarity_tolerance)?;
    override_usize(source, STRATEGY, "volume_period", &mut p.volume_period)?;
    override_f64(source, STRATEGY, "volume_surge", &mut p.volume_surge)?;
    override_f64(source, STRATEGY, "risk_reward_ratio", &mut p.risk_reward_ratio)?;
    Ok(())
}

/// Raw value for `key`, with blank values treated as absent.
fn read_raw(source: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    source
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_parsed<T>(source: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>>
where
    T: FromStr<Err = StratbenchError>,
{
    read_raw(source, section, key).map(|v| v.parse()).transpose()
}

fn override_usize(
    source: &dyn ConfigPort,
    section: &str,
    key: &str,
    target: &mut usize,
) -> Result<()> {
    let Some(raw) = read_raw(source, section, key) else {
        return Ok(());
    };
    let value: i64 = raw.parse().map_err(|_| {
        StratbenchError::invalid(key, format!("expected an integer, got '{raw}'"))
    })?;
    *target = usize::try_from(value)
        .map_err(|_| StratbenchError::invalid(key, format!("{key} must be non-negative")))?;
    Ok(())
}

fn override_f64(source: &dyn ConfigPort, section: &str, key: &str, target: &mut f64) -> Result<()> {
    let Some(raw) = read_raw(source, section, key) else {
        return Ok(());
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| StratbenchError::invalid(key, format!("expected a number, got '{raw}'")))?;
    if !value.is_finite() {
        return Err(StratbenchError::invalid(key, format!("{key} must be finite")));
    }
    *target = value;
    Ok(())
}
