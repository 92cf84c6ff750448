//! Structured XML report.
//!
//! Element names are stable so downstream tooling can consume the output.
//! Numbers are written as plain digits; missing values use the placeholder.

use anyhow::Result;
use chrono::NaiveDateTime;
use quill_core::{AggregateSummary, Record, summarize};
use std::fmt::Write as _;

use crate::ReportRenderer;
use crate::layout::{
    DENSITY_UNIT, RECOMMENDATIONS, REPORT_SUBTITLE, REPORT_TITLE, format_generated_at,
};

pub const ROOT_ELEMENT: &str = "codeQualityReport";
pub const SCHEMA_LOCATION: &str = "code-quality-report.xsd";
pub const SCHEMA_VERSION: &str = "1.0";
const GENERATOR: &str = "Quill";

/// Renderer for the `xml` key.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlRenderer;

impl ReportRenderer for XmlRenderer {
    fn name(&self) -> &str {
        "xml"
    }

    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
        let xml = generate_xml_report(records, &generated_at);
        tracing::debug!(records = records.len(), bytes = xml.len(), "rendered xml report");
        Ok(xml.into_bytes())
    }
}

pub fn generate_xml_report(records: &[Record], generated_at: &NaiveDateTime) -> String {
    let summary = summarize(records);
    let mut w = XmlWriter::default();

    w.raw("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    w.raw(&format!(
        "<{ROOT_ELEMENT} xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:noNamespaceSchemaLocation=\"{SCHEMA_LOCATION}\">\n"
    ));
    w.depth = 1;

    w.open("reportHeader");
    w.leaf("title", REPORT_TITLE);
    w.leaf("subtitle", REPORT_SUBTITLE);
    w.leaf("generatedAt", &format_generated_at(generated_at));
    w.leaf("version", SCHEMA_VERSION);
    w.close("reportHeader");

    write_summary(&mut w, &summary);

    w.open("issueTypeStatistics");
    for (category, count) in summary.categories.entries() {
        w.open("issueType");
        w.leaf("type", category);
        w.leaf("fileCount", &count.to_string());
        w.close("issueType");
    }
    w.close("issueTypeStatistics");

    w.open("detailedResults");
    for record in records {
        write_file(&mut w, record);
    }
    w.close("detailedResults");

    w.open("recommendations");
    for text in RECOMMENDATIONS {
        w.leaf("recommendation", text);
    }
    w.close("recommendations");

    w.open("metadata");
    w.leaf("generator", GENERATOR);
    w.leaf("format", "XML");
    w.leaf("encoding", "UTF-8");
    w.leaf("schemaVersion", SCHEMA_VERSION);
    w.close("metadata");

    w.depth = 0;
    w.raw(&format!("</{ROOT_ELEMENT}>\n"));
    w.out
}

fn write_summary(w: &mut XmlWriter, summary: &AggregateSummary) {
    w.open("executiveSummary");
    w.leaf("totalFiles", &summary.total_files.to_string());
    w.leaf("totalIssues", &summary.total_issues.to_string());
    w.leaf("totalCodeLines", &summary.total_code_lines.to_string());
    w.leaf("averageIssueDensity", &summary.density_display());
    w.leaf("issueDensityUnit", DENSITY_UNIT);
    w.close("executiveSummary");
}

const FILE_FIELDS: [&str; 8] = [
    "id",
    "fileName",
    "filePath",
    "codeLine",
    "issueCount",
    "issueType",
    "createdAt",
    "updatedAt",
];

fn write_file(w: &mut XmlWriter, record: &Record) {
    w.open("file");
    for (field, value) in FILE_FIELDS.iter().zip(record.detail_cells()) {
        w.leaf(field, &value);
    }
    w.close("file");
}

/// Indenting element writer; text content is always escaped.
#[derive(Default)]
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn open(&mut self, name: &str) {
        self.indent();
        let _ = writeln!(self.out, "<{name}>");
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        let _ = writeln!(self.out, "</{name}>");
    }

    fn leaf(&mut self, name: &str, text: &str) {
        self.indent();
        let _ = writeln!(self.out, "<{name}>{}</{name}>", escape_xml(text));
    }
}

/// Escape the five XML special characters. Characters XML 1.0 does not
/// allow (C0 controls other than tab, LF and CR, plus U+FFFE and U+FFFF) are
/// dropped.
pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if c.is_ascii_control() && c != '\u{7f}' => {}
            '\u{fffe}' | '\u{ffff}' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
