//! Report output port trait.

use std::path::{Path, PathBuf};

use crate::domain::backtest::RunReport;
use crate::domain::config::Config;
use crate::domain::error::StratbenchError;

/// Port for exporting the artifacts of one run.
pub trait ReportPort {
    /// Write the run into `output_dir` and return the files created.
    fn write(
        &self,
        report: &RunReport,
        config: &Config,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratbenchError>;
}
