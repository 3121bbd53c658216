//! CSV report adapter implementing ReportPort.
//!
//! A run is exported as four files in the output directory: `signals.csv`,
//! `trades.csv`, `equity.csv` and `metrics.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::RunReport;
use crate::domain::config::Config;
use crate::domain::error::StratbenchError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

fn csv_error(path: &Path, e: csv::Error) -> StratbenchError {
    StratbenchError::Data {
        reason: format!("failed to write {}: {e}", path.display()),
    }
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Writes `rows` after `header` to `path`, creating or truncating it.
fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<(), StratbenchError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer.write_record(header).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn metric_rows(metrics: &Metrics, config: &Config) -> Vec<Vec<String>> {
    let pair = |name: &str, value: String| vec![name.to_string(), value];
    vec![
        pair("strategy", config.strategy.kind().to_string()),
        pair("warmup_bars", config.warmup_bars.to_string()),
        pair("fee_bps", config.fee_bps.to_string()),
        pair("slippage_bps", config.slippage_bps.to_string()),
        pair("initial_capital", format!("{:.2}", config.initial_capital)),
        pair("exit_priority", config.exit_priority.to_string()),
        pair("total_return", format!("{:.6}", metrics.total_return)),
        pair("cagr", format!("{:.6}", metrics.cagr)),
        pair("volatility", format!("{:.6}", metrics.volatility)),
        pair("sharpe_ratio", format!("{:.6}", metrics.sharpe_ratio)),
        pair("sortino_ratio", format!("{:.6}", metrics.sortino_ratio)),
        pair("max_drawdown", format!("{:.6}", metrics.max_drawdown)),
        pair(
            "max_drawdown_duration",
            metrics.max_drawdown_duration.to_string(),
        ),
        pair("final_equity", format!("{:.2}", metrics.final_equity)),
        pair("trade_count", metrics.trade_count.to_string()),
        pair("trades_won", metrics.trades_won.to_string()),
        pair("trades_lost", metrics.trades_lost.to_string()),
        pair("win_rate", opt(metrics.win_rate)),
        pair("profit_factor", opt(metrics.profit_factor)),
        pair(
            "avg_trade_duration",
            format!("{:.2}", metrics.avg_trade_duration),
        ),
    ]
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        report: &RunReport,
        config: &Config,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratbenchError> {
        fs::create_dir_all(output_dir)?;

        let signals_path = output_dir.join("signals.csv");
        write_rows(
            &signals_path,
            &["date", "action", "confidence", "reason", "stop_price", "target_price"],
            report.signals.iter().map(|s| {
                vec![
                    s.date.to_string(),
                    s.action.to_string(),
                    format!("{:.4}", s.confidence),
                    s.reason.clone(),
                    opt(s.stop_price),
                    opt(s.target_price),
                ]
            }),
        )?;

        let trades_path = output_dir.join("trades.csv");
        write_rows(
            &trades_path,
            &[
                "entry_date",
                "entry_price",
                "exit_date",
                "exit_price",
                "size",
                "gross_pnl",
                "fees_paid",
                "net_pnl",
                "exit_reason",
            ],
            report.result.trades.iter().map(|t| {
                vec![
                    t.entry_date.to_string(),
                    format!("{:.6}", t.entry_price),
                    t.exit_date.to_string(),
                    format!("{:.6}", t.exit_price),
                    format!("{:.6}", t.size),
                    format!("{:.2}", t.gross_pnl),
                    format!("{:.2}", t.fees_paid),
                    format!("{:.2}", t.net_pnl()),
                    t.exit_reason.to_string(),
                ]
            }),
        )?;

        let equity_path = output_dir.join("equity.csv");
        write_rows(
            &equity_path,
            &["date", "cash", "position_value", "total_value"],
            report.result.equity_curve.iter().map(|p| {
                vec![
                    p.date.to_string(),
                    format!("{:.2}", p.cash),
                    format!("{:.2}", p.position_value),
                    format!("{:.2}", p.total_value),
                ]
            }),
        )?;

        let metrics_path = output_dir.join("metrics.csv");
        write_rows(
            &metrics_path,
            &["metric", "value"],
            metric_rows(&report.metrics, config),
        )?;

        Ok(vec![signals_path, trades_path, equity_path, metrics_path])
    }
}
