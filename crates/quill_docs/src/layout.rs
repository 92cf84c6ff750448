//! Section content shared by every report format.
//!
//! All renderers lay out the same five sections in the same order: title,
//! executive summary, detailed results, issue type statistics, and
//! recommendations. The literal strings live here so every format agrees.

use chrono::NaiveDateTime;
use quill_core::{AggregateSummary, DATE_TIME_FORMAT};

pub const REPORT_TITLE: &str = "Code Quality Inspection Report";
pub const REPORT_SUBTITLE: &str = "Code Quality Analysis Report";
pub const GENERATED_AT_LABEL: &str = "Generated at";

pub const SUMMARY_TITLE: &str = "Executive Summary";
pub const DETAILS_TITLE: &str = "Detailed Results";
pub const STATISTICS_TITLE: &str = "Issue Type Statistics";
pub const RECOMMENDATIONS_TITLE: &str = "Recommendations";
pub const CONTENTS_TITLE: &str = "Table of Contents";

/// Section titles after the title block, in document order.
pub const SECTION_TITLES: [&str; 4] = [
    SUMMARY_TITLE,
    DETAILS_TITLE,
    STATISTICS_TITLE,
    RECOMMENDATIONS_TITLE,
];

pub const DETAIL_HEADERS: [&str; 8] = [
    "ID",
    "File Name",
    "File Path",
    "Code Lines",
    "Issue Count",
    "Issue Type",
    "Created At",
    "Updated At",
];

pub const SUMMARY_HEADERS: [&str; 2] = ["Metric", "Value"];
pub const STATISTICS_HEADERS: [&str; 2] = ["Issue Type", "File Count"];

pub const TOTAL_FILES_LABEL: &str = "Total Files";
pub const TOTAL_ISSUES_LABEL: &str = "Total Issues";
pub const TOTAL_CODE_LINES_LABEL: &str = "Total Code Lines";
pub const DENSITY_LABEL: &str = "Average Issue Density";
pub const DENSITY_UNIT: &str = "issues/KLOC";

pub const RECOMMENDATIONS: [&str; 5] = [
    "Run code quality checks regularly and enforce a quality gate",
    "Triage findings by category and fix high-severity issues first",
    "Establish a code review process to raise quality awareness",
    "Automate checks through continuous integration and deployment",
    "Refactor regularly to reduce technical debt",
];

/// `yyyy-MM-dd HH:mm:ss`
pub fn format_generated_at(generated_at: &NaiveDateTime) -> String {
    generated_at.format(DATE_TIME_FORMAT).to_string()
}

/// `"Generated at: 2024-01-01 00:00:00"`
pub fn generated_at_line(generated_at: &NaiveDateTime) -> String {
    format!("{GENERATED_AT_LABEL}: {}", format_generated_at(generated_at))
}

/// The four summary rows as (label, value) pairs.
pub fn summary_rows(summary: &AggregateSummary) -> [(&'static str, String); 4] {
    [
        (TOTAL_FILES_LABEL, summary.total_files.to_string()),
        (TOTAL_ISSUES_LABEL, summary.total_issues.to_string()),
        (TOTAL_CODE_LINES_LABEL, summary.total_code_lines.to_string()),
        (
            DENSITY_LABEL,
            format!("{} {DENSITY_UNIT}", summary.density_display()),
        ),
    ]
}
