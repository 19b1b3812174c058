//! JSON report adapter implementing ReportPort.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::domain::error::AnalyticsError;
use crate::domain::report::DailyReport;
use crate::ports::report_port::ReportPort;

/// File name of a daily report generated at `now`, e.g. `daily_report_20240131_174500.json`.
pub fn report_file_name(now: NaiveDateTime) -> String {
    format!("daily_report_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Path of the report for `report` inside `output_dir`.
pub fn report_path(output_dir: &Path, report: &DailyReport) -> PathBuf {
    output_dir.join(report_file_name(report.report_date))
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &DailyReport, output_path: &Path) -> Result<(), AnalyticsError> {
        let json = serde_json::to_string_pretty(report).map_err(|e| AnalyticsError::Report {
            reason: format!("failed to serialize report: {e}"),
        })?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;

        Ok(())
    }
}
