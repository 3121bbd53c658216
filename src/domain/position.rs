//! Position and trade records.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExitReason {
    Signal,
    Stop,
    Target,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::Stop => write!(f, "stop"),
            ExitReason::Target => write!(f, "target"),
        }
    }
}

/// A long holding. `entry_price` is the fill after slippage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub entry_price: f64,
    pub size: f64,
    pub entry_fee: f64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
}

impl OpenPosition {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }

    pub fn should_stop_out(&self, bar: &PriceBar) -> bool {
        self.stop_price.is_some_and(|stop| bar.low <= stop)
    }

    pub fn should_take_profit(&self, bar: &PriceBar) -> bool {
        self.target_price.is_some_and(|target| bar.high >= target)
    }

    /// Protective level breached on `bar`, stop first.
    pub fn triggered_exit(&self, bar: &PriceBar) -> Option<(ExitReason, f64)> {
        if self.should_stop_out(bar) {
            return self.stop_price.map(|p| (ExitReason::Stop, p));
        }
        if self.should_take_profit(bar) {
            return self.target_price.map(|p| (ExitReason::Target, p));
        }
        None
    }
}

/// At most one position at a time, long only.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Position {
    #[default]
    Flat,
    Long(OpenPosition),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long(_))
    }

    pub fn market_value(&self, price: f64) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long(open) => open.market_value(price),
        }
    }

    pub fn as_open(&self) -> Option<&OpenPosition> {
        match self {
            Position::Flat => None,
            Position::Long(open) => Some(open),
        }
    }
}

/// A closed round trip. Prices are fills, so `gross_pnl` already includes
/// slippage; `fees_paid` covers both legs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub size: f64,
    pub gross_pnl: f64,
    pub fees_paid: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn net_pnl(&self) -> f64 {
        self.gross_pnl - self.fees_paid
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl() > 0.0
    }

    /// Net return on the capital committed at entry.
    pub fn return_pct(&self) -> f64 {
        let committed = self.size * self.entry_price;
        if committed <= 0.0 {
            return 0.0;
        }
        self.net_pnl() / committed
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_position() -> OpenPosition {
        OpenPosition {
            entry_date: date(15),
            entry_index: 3,
            entry_price: 50.0,
            size: 100.0,
            entry_fee: 5.0,
            stop_price: Some(45.0),
            target_price: Some(60.0),
        }
    }

    fn bar(low: f64, high: f64) -> PriceBar {
        PriceBar {
            date: date(16),
            open: (low + high) / 2.0,
            high,
            low,
            close: (low + high) / 2.0,
            volume: 1.0,
        }
    }

    #[test]
    fn market_value_and_unrealized() {
        let pos = sample_position();
        assert!((pos.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) + 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_triggers_on_low() {
        let pos = sample_position();
        assert!(pos.should_stop_out(&bar(44.0, 52.0)));
        assert!(pos.should_stop_out(&bar(45.0, 52.0)));
        assert!(!pos.should_stop_out(&bar(46.0, 52.0)));
    }

    #[test]
    fn target_triggers_on_high() {
        let pos = sample_position();
        assert!(pos.should_take_profit(&bar(50.0, 60.0)));
        assert!(!pos.should_take_profit(&bar(50.0, 59.9)));
    }

    #[test]
    fn stop_wins_when_both_breached() {
        let pos = sample_position();
        assert_eq!(
            pos.triggered_exit(&bar(40.0, 65.0)),
            Some((ExitReason::Stop, 45.0))
        );
        assert_eq!(
            pos.triggered_exit(&bar(48.0, 65.0)),
            Some((ExitReason::Target, 60.0))
        );
        assert_eq!(pos.triggered_exit(&bar(48.0, 55.0)), None);
    }

    #[test]
    fn missing_levels_never_trigger() {
        let pos = OpenPosition {
            stop_price: None,
            target_price: None,
            ..sample_position()
        };
        assert_eq!(pos.triggered_exit(&bar(0.0, 1e9)), None);
    }

    #[test]
    fn flat_position_has_no_value() {
        assert!(Position::default().is_flat());
        assert_eq!(Position::Flat.market_value(100.0), 0.0);
        let long = Position::Long(sample_position());
        assert!(long.is_long());
        assert!((long.market_value(10.0) - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trade_net_pnl() {
        let trade = Trade {
            entry_date: date(15),
            entry_price: 50.0,
            exit_date: date(20),
            exit_price: 55.0,
            size: 100.0,
            gross_pnl: 500.0,
            fees_paid: 15.0,
            exit_reason: ExitReason::Signal,
        };
        assert!((trade.net_pnl() - 485.0).abs() < f64::EPSILON);
        assert!(trade.is_win());
        assert!((trade.return_pct() - 0.097).abs() < 1e-12);
        assert_eq!(trade.holding_days(), 5);
        assert_eq!(trade.exit_reason.to_string(), "signal");
    }
}
