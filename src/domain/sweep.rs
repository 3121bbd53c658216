//! Batch runs over datasets × strategies × presets.
//!
//! Each job is an independent single-threaded run; jobs fan out over the
//! rayon pool and share the price data read-only. Cancellation is checked
//! before a job starts, so a job already running always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::warn;

use super::backtest::{run_strategy, RunReport};
use super::config::Config;
use super::error::StratbenchError;
use super::ohlcv::PriceBar;
use super::preset::Preset;
use super::strategy::StrategyKind;

/// One run to perform.
#[derive(Debug, Clone)]
pub struct SweepJob {
    /// Name of the dataset, usually the file stem.
    pub dataset: String,
    pub bars: Arc<[PriceBar]>,
    pub preset: Preset,
    pub config: Config,
}

impl SweepJob {
    pub fn kind(&self) -> StrategyKind {
        self.config.strategy.kind()
    }
}

#[derive(Debug)]
pub enum SweepOutcome {
    Completed(Box<RunReport>),
    Failed(StratbenchError),
    Cancelled,
}

#[derive(Debug)]
pub struct SweepEntry {
    pub dataset: String,
    pub kind: StrategyKind,
    pub preset: Preset,
    pub outcome: SweepOutcome,
}

impl SweepEntry {
    pub fn report(&self) -> Option<&RunReport> {
        match &self.outcome {
            SweepOutcome::Completed(report) => Some(report.as_ref()),
            _ => None,
        }
    }
}

/// Every dataset × kind × preset combination, in that nesting order.
pub fn build_jobs(
    datasets: &[(String, Arc<[PriceBar]>)],
    kinds: &[StrategyKind],
    presets: &[Preset],
) -> Vec<SweepJob> {
    let mut jobs = Vec::with_capacity(datasets.len() * kinds.len() * presets.len());
    for (name, bars) in datasets {
        for &kind in kinds {
            for &preset in presets {
                jobs.push(SweepJob {
                    dataset: name.clone(),
                    bars: Arc::clone(bars),
                    preset,
                    config: preset.resolve(kind),
                });
            }
        }
    }
    jobs
}

/// Sweep executor.
#[derive(Debug, Clone)]
pub struct Sweep {
    parallel: bool,
    cancel: Arc<AtomicBool>,
}

impl Default for Sweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sweep {
    pub fn new() -> Self {
        Sweep {
            parallel: true,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Flag that, once set, makes every job not yet started report
    /// [`SweepOutcome::Cancelled`].
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Results come back in job order whatever the execution order.
    pub fn run(&self, jobs: &[SweepJob]) -> Vec<SweepEntry> {
        self.run_with_progress(jobs, |_, _, _| {})
    }

    /// Like [`Sweep::run`], calling `progress(index, total, entry)` as each
    /// job finishes.
    pub fn run_with_progress<F>(&self, jobs: &[SweepJob], progress: F) -> Vec<SweepEntry>
    where
        F: Fn(usize, usize, &SweepEntry) + Send + Sync,
    {
        let total = jobs.len();
        let execute = |(idx, job): (usize, &SweepJob)| {
            let entry = self.execute(job);
            progress(idx, total, &entry);
            entry
        };

        if self.parallel {
            jobs.par_iter().enumerate().map(execute).collect()
        } else {
            jobs.iter().enumerate().map(execute).collect()
        }
    }

    fn execute(&self, job: &SweepJob) -> SweepEntry {
        let outcome = if self.cancel.load(Ordering::Relaxed) {
            SweepOutcome::Cancelled
        } else {
            match run_strategy(&job.bars, &job.config) {
                Ok(report) => SweepOutcome::Completed(Box::new(report)),
                Err(e) => {
                    warn!(
                        dataset = %job.dataset,
                        strategy = %job.kind(),
                        preset = %job.preset,
                        error = %e,
                        "sweep job failed"
                    );
                    SweepOutcome::Failed(e)
                }
            }
        };

        SweepEntry {
            dataset: job.dataset.clone(),
            kind: job.kind(),
            preset: job.preset,
            outcome,
        }
    }
}
