//! Output format selection from the report path.

use super::json::write_report;
use super::schema::Report;
use super::text::write_summary;
use crate::utils::error::OutputError;
use std::path::Path;

/// File format of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    /// `.json` paths get JSON, everything else the text summary
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    pub fn write(self, report: &Report, path: &Path) -> Result<(), OutputError> {
        match self {
            OutputFormat::Json => write_report(report, path),
            OutputFormat::Text => write_summary(report, path),
        }
    }
}
