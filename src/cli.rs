//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_strategy, RunReport};
use crate::domain::config::Config;
use crate::domain::config_validation::{resolve_config, Overrides};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::preset::Preset;
use crate::domain::strategy::StrategyKind;
use crate::domain::sweep::{build_jobs, Sweep, SweepEntry, SweepOutcome};
use crate::ports::data_port::PriceSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Trading strategy signal generation and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over one price file
    Backtest {
        /// OHLCV CSV file
        #[arg(short, long)]
        data: PathBuf,
        /// INI file with [backtest] and [strategy] sections
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        #[arg(short, long)]
        preset: Option<Preset>,
        /// Directory for the CSV export
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Run every file × strategy × preset combination
    Sweep {
        #[arg(short, long, num_args = 1.., required = true)]
        data: Vec<PathBuf>,
        /// Comma-separated strategy kinds (default: all)
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,
        /// Comma-separated presets (default: all)
        #[arg(long, value_delimiter = ',')]
        presets: Vec<Preset>,
        /// Run jobs one after another on the calling thread
        #[arg(long)]
        sequential: bool,
    },
    /// Print the parameter presets
    Presets,
    /// Resolve and validate a configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        #[arg(short, long)]
        preset: Option<Preset>,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            config,
            strategy,
            preset,
            output,
            start,
            end,
        } => run_backtest(
            &data,
            config.as_deref(),
            Overrides { preset, strategy },
            output.as_deref(),
            start,
            end,
        ),
        Command::Sweep {
            data,
            strategies,
            presets,
            sequential,
        } => run_sweep(&data, &strategies, &presets, sequential),
        Command::Presets => {
            print_presets();
            Ok(())
        }
        Command::Validate {
            config,
            strategy,
            preset,
        } => run_validate(&config, Overrides { preset, strategy }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Config source for a run; an absent path yields an empty file.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, StratbenchError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

/// Load one price file. The dataset name is the file stem.
pub fn load_bars(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(String, Vec<PriceBar>), StratbenchError> {
    let (source, dataset) = CsvPriceSource::for_file(path)?;
    let bars = source.fetch_bars(&dataset, start, end)?;
    info!(dataset = %dataset, bars = bars.len(), "loaded price data");
    Ok((dataset, bars))
}

fn run_backtest(
    data_path: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    output: Option<&Path>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), StratbenchError> {
    // Stage 1: Load and resolve config
    let source = load_config(config_path)?;
    let config = resolve_config(&source, overrides)?;
    info!(strategy = %config.strategy.kind(), "config resolved");

    // Stage 2: Load price data
    let (dataset, bars) = load_bars(data_path, start, end)?;

    // Stage 3: Generate signals and simulate
    let report = run_strategy(&bars, &config)?;
    info!(
        trades = report.result.trades.len(),
        "backtest complete"
    );

    // Stage 4: Console summary
    print_summary(&dataset, &config, &report);

    // Stage 5: Export
    if let Some(dir) = output {
        let files = CsvReportAdapter.write(&report, &config, dir)?;
        info!(files = files.len(), dir = %dir.display(), "report written");
        println!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

fn print_summary(dataset: &str, config: &Config, report: &RunReport) {
    let m = &report.metrics;
    let percent = |v: Option<f64>| {
        v.map(|v| format!("{:.1}%", v * 100.0))
            .unwrap_or_else(|| "n/a".to_string())
    };

    println!("=== {} / {} ===", dataset, config.strategy.kind());
    println!("Bars:             {}", report.signals.len());
    println!("Total Return:     {:.2}%", m.total_return * 100.0);
    println!("CAGR:             {:.2}%", m.cagr * 100.0);
    println!("Volatility:       {:.2}%", m.volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    println!(
        "Max Drawdown:     {:.1}% ({} bars)",
        m.max_drawdown * 100.0,
        m.max_drawdown_duration
    );
    println!("Total Trades:     {}", m.trade_count);
    println!("Win Rate:         {}", percent(m.win_rate));
    match m.profit_factor {
        Some(pf) => println!("Profit Factor:    {pf:.2}"),
        None => println!("Profit Factor:    n/a"),
    }
    println!("Avg Duration:     {:.1} days", m.avg_trade_duration);
    println!("Final Equity:     {:.2}", m.final_equity);
    if let Some(open) = &report.result.open_position {
        println!(
            "Open Position:    {:.4} @ {:.2} since {}",
            open.size, open.entry_price, open.entry_date
        );
    }
}

fn run_sweep(
    paths: &[PathBuf],
    strategies: &[StrategyKind],
    presets: &[Preset],
    sequential: bool,
) -> Result<(), StratbenchError> {
    // Stage 1: Load every dataset once
    let mut datasets: Vec<(String, Arc<[PriceBar]>)> = Vec::with_capacity(paths.len());
    for path in paths {
        let (name, bars) = load_bars(path, None, None)?;
        datasets.push((name, bars.into()));
    }

    // Stage 2: Expand the job grid
    let kinds = if strategies.is_empty() {
        &StrategyKind::ALL[..]
    } else {
        strategies
    };
    let presets = if presets.is_empty() {
        &Preset::ALL[..]
    } else {
        presets
    };
    let jobs = build_jobs(&datasets, kinds, presets);
    info!(jobs = jobs.len(), "starting sweep");

    // Stage 3: Run
    let sweep = Sweep::new().with_parallelism(!sequential);
    let entries = sweep.run_with_progress(&jobs, |_, total, entry| {
        info!(
            dataset = %entry.dataset,
            strategy = %entry.kind,
            preset = %entry.preset,
            total,
            "job finished"
        );
    });

    // Stage 4: Results table
    println!(
        "{:<16} {:<15} {:<13} {:>9} {:>7} {:>8} {:>7}",
        "dataset", "strategy", "preset", "return", "sharpe", "max_dd", "trades"
    );
    for entry in &entries {
        println!("{}", sweep_row(entry));
    }

    let completed = entries.iter().filter(|e| e.report().is_some()).count();
    println!("\n{completed}/{} runs completed", entries.len());

    if completed == 0 {
        if let Some(SweepOutcome::Failed(e)) = entries
            .into_iter()
            .map(|e| e.outcome)
            .find(|o| matches!(o, SweepOutcome::Failed(_)))
        {
            return Err(e);
        }
    }
    Ok(())
}

fn sweep_row(entry: &SweepEntry) -> String {
    let head = format!(
        "{:<16} {:<15} {:<13}",
        entry.dataset, entry.kind, entry.preset
    );
    match &entry.outcome {
        SweepOutcome::Completed(report) => {
            let m = &report.metrics;
            format!(
                "{head} {:>8.2}% {:>7.2} {:>7.1}% {:>7}",
                m.total_return * 100.0,
                m.sharpe_ratio,
                m.max_drawdown * 100.0,
                m.trade_count
            )
        }
        SweepOutcome::Failed(e) => format!("{head} failed: {e}"),
        SweepOutcome::Cancelled => format!("{head} cancelled"),
    }
}

fn print_presets() {
    println!(
        "{:<13} {:>6} {:>8} {:>8} {:>8} {:>9} {:>5} {:>9} {:>7}",
        "preset", "warmup", "fee_bps", "slip_bps", "rsi_low", "rsi_high", "rr", "momentum", "volume"
    );
    for preset in Preset::ALL {
        let v = preset.values();
        println!(
            "{:<13} {:>6} {:>8.1} {:>8.1} {:>8.1} {:>9.1} {:>5.1} {:>9.3} {:>7.2}",
            preset.as_str(),
            v.warmup_bars,
            v.fee_bps,
            v.slippage_bps,
            v.rsi_low,
            v.rsi_high,
            v.risk_reward_ratio,
            v.momentum_threshold,
            v.volume_breakout
        );
    }
}

fn run_validate(config_path: &Path, overrides: Overrides) -> Result<(), StratbenchError> {
    let source = load_config(Some(config_path))?;
    let config = resolve_config(&source, overrides)?;

    println!("Config validated successfully");
    println!("  strategy:          {}", config.strategy.kind());
    println!("  warmup_bars:       {}", config.warmup_bars);
    println!("  fee_bps:           {}", config.fee_bps);
    println!("  slippage_bps:      {}", config.slippage_bps);
    println!("  initial_capital:   {:.2}", config.initial_capital);
    println!("  position_fraction: {}", config.position_fraction);
    println!("  risk_free_rate:    {}", config.risk_free_rate);
    println!("  exit_priority:     {}", config.exit_priority);
    println!(
        "  longest window:    {} bars",
        config.strategy.longest_window()
    );
    Ok(())
}
