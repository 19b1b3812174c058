//! Report output port trait.

use crate::domain::error::AnalyticsError;
use crate::domain::report::DailyReport;
use std::path::Path;

/// Port for persisting generated reports.
pub trait ReportPort {
    fn write(&self, report: &DailyReport, output_path: &Path) -> Result<(), AnalyticsError>;
}
