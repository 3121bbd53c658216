//! Strategy variants and the shared signal-generation contract.
//!
//! A [`Strategy`] is picked once per run. Every variant declares the
//! indicators it needs, and [`Strategy::generate`] walks the bars in order,
//! asking the variant for a decision at each index. The variant only ever
//! sees `bars[..=i]` through the frame accessors and explicit slicing, so a
//! signal never depends on later bars.

pub mod mean_reversion;
pub mod momentum;
pub mod pattern;
pub mod rule_based;

pub use mean_reversion::MeanReversionParams;
pub use momentum::MomentumParams;
pub use pattern::PatternParams;
pub use rule_based::RuleBasedParams;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::domain::config::Config;
use crate::domain::error::{Result, StratbenchError};
use crate::domain::indicator::{IndicatorFrame, IndicatorType};
use crate::domain::ohlcv::{validate_series, PriceBar};
use crate::domain::signal::Signal;

pub(crate) const REASON_WARMUP: &str = "warmup";
pub(crate) const REASON_UNAVAILABLE: &str = "indicators unavailable";
pub(crate) const REASON_NO_SETUP: &str = "no setup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StrategyKind {
    RuleBased,
    Momentum,
    MeanReversion,
    Pattern,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::RuleBased,
        StrategyKind::Momentum,
        StrategyKind::MeanReversion,
        StrategyKind::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RuleBased => "rule_based",
            StrategyKind::Momentum => "momentum",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Pattern => "pattern",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rule_based" | "rule" => Ok(StrategyKind::RuleBased),
            "momentum" => Ok(StrategyKind::Momentum),
            "mean_reversion" => Ok(StrategyKind::MeanReversion),
            "pattern" => Ok(StrategyKind::Pattern),
            other => Err(StratbenchError::invalid(
                "strategy",
                format!("unknown strategy '{other}'"),
            )),
        }
    }
}

/// A strategy variant together with its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Strategy {
    RuleBased(RuleBasedParams),
    Momentum(MomentumParams),
    MeanReversion(MeanReversionParams),
    Pattern(PatternParams),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::RuleBased(_) => StrategyKind::RuleBased,
            Strategy::Momentum(_) => StrategyKind::Momentum,
            Strategy::MeanReversion(_) => StrategyKind::MeanReversion,
            Strategy::Pattern(_) => StrategyKind::Pattern,
        }
    }

    /// Indicators the variant reads from the frame.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self {
            Strategy::RuleBased(p) => p.required_indicators(),
            Strategy::Momentum(p) => p.required_indicators(),
            Strategy::MeanReversion(p) => p.required_indicators(),
            Strategy::Pattern(p) => p.required_indicators(),
        }
    }

    /// Number of leading bars before every input of the variant is available.
    pub fn longest_window(&self) -> usize {
        match self {
            Strategy::RuleBased(p) => p.longest_window(),
            Strategy::Momentum(p) => p.longest_window(),
            Strategy::MeanReversion(p) => p.longest_window(),
            Strategy::Pattern(p) => p.longest_window(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Strategy::RuleBased(p) => p.validate(),
            Strategy::Momentum(p) => p.validate(),
            Strategy::MeanReversion(p) => p.validate(),
            Strategy::Pattern(p) => p.validate(),
        }
    }

    /// One signal per bar. Indices below `warmup_bars` are Hold, and so is
    /// any bar where an input indicator is not yet available. Never fails,
    /// even on series shorter than [`Strategy::longest_window`].
    pub fn generate(
        &self,
        bars: &[PriceBar],
        frame: &IndicatorFrame,
        warmup_bars: usize,
    ) -> Vec<Signal> {
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if i < warmup_bars {
                    return Signal::hold(bar.date, REASON_WARMUP);
                }
                let decision = match self {
                    Strategy::RuleBased(p) => p.evaluate(bars, frame, i),
                    Strategy::Momentum(p) => p.evaluate(bars, frame, i),
                    Strategy::MeanReversion(p) => p.evaluate(bars, frame, i),
                    Strategy::Pattern(p) => p.evaluate(bars, frame, i),
                };
                decision.unwrap_or_else(|| Signal::hold(bar.date, REASON_UNAVAILABLE))
            })
            .collect()
    }
}

/// Validated bars, config and precomputed indicators for one run.
#[derive(Debug)]
pub struct SignalGenerator<'a> {
    bars: &'a [PriceBar],
    strategy: Strategy,
    warmup_bars: usize,
    frame: IndicatorFrame,
}

impl<'a> SignalGenerator<'a> {
    /// Fails with `InsufficientData` when the series is shorter than the
    /// configured warm-up (or empty), and with `InvalidParameter` /
    /// `InvalidSeries` when the inputs are malformed.
    pub fn new(bars: &'a [PriceBar], config: &Config) -> Result<Self> {
        config.validate()?;
        validate_series(bars)?;

        let minimum = config.warmup_bars.max(1);
        if bars.len() < minimum {
            return Err(StratbenchError::InsufficientData {
                bars: bars.len(),
                minimum,
            });
        }

        let strategy = config.strategy.clone();
        let frame = IndicatorFrame::compute(bars, &strategy.required_indicators());
        debug!(
            strategy = %strategy.kind(),
            bars = bars.len(),
            warmup = config.warmup_bars,
            longest_window = strategy.longest_window(),
            "signal generator ready"
        );

        Ok(SignalGenerator {
            bars,
            strategy,
            warmup_bars: config.warmup_bars,
            frame,
        })
    }

    pub fn frame(&self) -> &IndicatorFrame {
        &self.frame
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn generate(&self) -> Vec<Signal> {
        self.strategy
            .generate(self.bars, &self.frame, self.warmup_bars)
    }
}

pub(crate) fn require_positive(key: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(StratbenchError::invalid(key, "must be greater than 0"));
    }
    Ok(())
}

pub(crate) fn require_finite_positive(key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(StratbenchError::invalid(key, format!("must be > 0, got {value}")));
    }
    Ok(())
}

pub(crate) fn require_non_negative(key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(StratbenchError::invalid(key, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

pub(crate) fn require_unit_interval(key: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(StratbenchError::invalid(
            key,
            format!("must be within [0, 1], got {value}"),
        ));
    }
    Ok(())
}

/// RSI bounds must lie in [0, 100] with `low < high`.
pub(crate) fn require_rsi_bounds(
    low_key: &str,
    low: f64,
    high_key: &str,
    high: f64,
) -> Result<()> {
    for (key, value) in [(low_key, low), (high_key, high)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(StratbenchError::invalid(
                key,
                format!("must be within [0, 100], got {value}"),
            ));
        }
    }
    if low >= high {
        return Err(StratbenchError::invalid(
            low_key,
            format!("must be below {high_key} ({low} >= {high})"),
        ));
    }
    Ok(())
}

/// Volume-ratio strength: 1x average scores 0, 3x or more scores 1.
pub(crate) fn volume_strength(volume: f64, average: f64) -> f64 {
    if average <= 0.0 {
        return 0.0;
    }
    ((volume / average - 1.0) / 2.0).clamp(0.0, 1.0)
}
