//! Report generation and writers.
//!
//! This module handles turning an analysed call graph into output:
//! - Report structures (versioned JSON schema)
//! - JSON report files (write and validate)
//! - Text summaries for the terminal or a file

pub mod format;
pub mod json;
pub mod report;
pub mod schema;
pub mod text;

// Re-export main functions
pub use format::OutputFormat;
pub use json::{read_report, report_to_string, write_report};
pub use report::build_report;
pub use schema::{CallRecord, Details, EdgeRecord, NodeMetrics, Report, ReportedError, Summary};
pub use text::{render_parse_errors, render_summary, write_summary};
