//! Named parameter bundles.
//!
//! Presets are read-only tables. [`Preset::resolve`] copies one into a fresh
//! [`Config`] before a run; nothing downstream ever looks at the preset again.

use std::fmt;
use std::str::FromStr;

use crate::domain::config::{Config, ExitPriority};
use crate::domain::error::{Result, StratbenchError};
use crate::domain::strategy::{
    MeanReversionParams, MomentumParams, PatternParams, RuleBasedParams, Strategy, StrategyKind,
};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Values a preset fixes. Everything else comes from the variant defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetValues {
    pub warmup_bars: usize,
    pub fee_bps: f64,
    pub slippage_bps: f64,
    /// Rule-based entry / mean-reversion oversold bound.
    pub rsi_low: f64,
    /// Rule-based exit / mean-reversion overbought bound.
    pub rsi_high: f64,
    pub risk_reward_ratio: f64,
    pub momentum_threshold: f64,
    /// Volume excess over its average that counts as confirmation.
    pub volume_breakout: f64,
}

pub static CONSERVATIVE: PresetValues = PresetValues {
    warmup_bars: 60,
    fee_bps: 15.0,
    slippage_bps: 15.0,
    rsi_low: 25.0,
    rsi_high: 75.0,
    risk_reward_ratio: 1.5,
    momentum_threshold: 0.03,
    volume_breakout: 0.75,
};

pub static NEUTRAL: PresetValues = PresetValues {
    warmup_bars: 30,
    fee_bps: 10.0,
    slippage_bps: 10.0,
    rsi_low: 30.0,
    rsi_high: 70.0,
    risk_reward_ratio: 2.0,
    momentum_threshold: 0.02,
    volume_breakout: 0.5,
};

pub static AGGRESSIVE: PresetValues = PresetValues {
    warmup_bars: 20,
    fee_bps: 8.0,
    slippage_bps: 8.0,
    rsi_low: 35.0,
    rsi_high: 65.0,
    risk_reward_ratio: 2.5,
    momentum_threshold: 0.015,
    volume_breakout: 0.3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Preset {
    Conservative,
    #[default]
    Neutral,
    Aggressive,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Conservative, Preset::Neutral, Preset::Aggressive];

    pub fn values(&self) -> &'static PresetValues {
        match self {
            Preset::Conservative => &CONSERVATIVE,
            Preset::Neutral => &NEUTRAL,
            Preset::Aggressive => &AGGRESSIVE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Conservative => "conservative",
            Preset::Neutral => "neutral",
            Preset::Aggressive => "aggressive",
        }
    }

    /// Variant parameters with this preset's thresholds applied.
    pub fn strategy(&self, kind: StrategyKind) -> Strategy {
        let v = self.values();
        match kind {
            StrategyKind::RuleBased => Strategy::RuleBased(RuleBasedParams {
                rsi_buy_threshold: v.rsi_low,
                rsi_sell_threshold: v.rsi_high,
                risk_reward_ratio: v.risk_reward_ratio,
                ..RuleBasedParams::default()
            }),
            StrategyKind::Momentum => Strategy::Momentum(MomentumParams {
                momentum_threshold: v.momentum_threshold,
                breakout_threshold: v.volume_breakout,
                risk_reward_ratio: v.risk_reward_ratio,
                ..MomentumParams::default()
            }),
            StrategyKind::MeanReversion => Strategy::MeanReversion(MeanReversionParams {
                rsi_oversold: v.rsi_low,
                rsi_overbought: v.rsi_high,
                ..MeanReversionParams::default()
            }),
            StrategyKind::Pattern => Strategy::Pattern(PatternParams {
                risk_reward_ratio: v.risk_reward_ratio,
                ..PatternParams::default()
            }),
        }
    }

    /// A complete run configuration for `kind` under this preset.
    pub fn resolve(&self, kind: StrategyKind) -> Config {
        let v = self.values();
        Config {
            warmup_bars: v.warmup_bars,
            fee_bps: v.fee_bps,
            slippage_bps: v.slippage_bps,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            position_fraction: 1.0,
            risk_free_rate: 0.0,
            exit_priority: ExitPriority::default(),
            strategy: self.strategy(kind),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Preset::Conservative),
            "neutral" => Ok(Preset::Neutral),
            "aggressive" => Ok(Preset::Aggressive),
            other => Err(StratbenchError::invalid(
                "preset",
                format!("unknown preset '{other}'"),
            )),
        }
    }
}
