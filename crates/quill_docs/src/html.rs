use anyhow::Result;
use chrono::NaiveDateTime;
use quill_core::{AggregateSummary, Record, summarize};
use std::fmt::Write as _;

use crate::ReportRenderer;
use crate::layout::{
    CONTENTS_TITLE, DENSITY_LABEL, DETAIL_HEADERS, DETAILS_TITLE, RECOMMENDATIONS,
    RECOMMENDATIONS_TITLE, REPORT_SUBTITLE, REPORT_TITLE, STATISTICS_HEADERS, STATISTICS_TITLE,
    SUMMARY_HEADERS, SUMMARY_TITLE, TOTAL_CODE_LINES_LABEL, TOTAL_FILES_LABEL,
    TOTAL_ISSUES_LABEL, generated_at_line, summary_rows,
};

/// Section anchors, in document order.
pub const SECTION_ANCHORS: [(&str, &str); 4] = [
    ("summary", SUMMARY_TITLE),
    ("details", DETAILS_TITLE),
    ("statistics", STATISTICS_TITLE),
    ("recommendations", RECOMMENDATIONS_TITLE),
];

const STYLE: &str = r#"        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif; margin: 20px; background-color: #f5f5f5; color: #333; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 30px; border-radius: 10px; box-shadow: 0 0 20px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 40px; padding: 20px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; border-radius: 10px; }
        .title { font-size: 28px; font-weight: bold; margin-bottom: 10px; }
        .subtitle { font-size: 20px; margin-bottom: 15px; opacity: 0.9; }
        .date { font-size: 16px; opacity: 0.8; }
        .section { margin: 40px 0; padding: 20px; border-left: 4px solid #667eea; background-color: #fafafa; border-radius: 5px; }
        .section-title { font-size: 22px; font-weight: bold; color: #333; margin-bottom: 20px; }
        table { width: 100%; border-collapse: collapse; margin: 20px 0; }
        th, td { border: 1px solid #e0e0e0; padding: 12px; text-align: left; }
        th { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; font-weight: 600; }
        tr:nth-child(even) { background-color: #f8f9fa; }
        .summary-table { width: 60%; margin: 20px auto; }
        .stats-table { width: 50%; margin: 20px auto; }
        .recommendations { background: linear-gradient(135deg, #ffecd2 0%, #fcb69f 100%); padding: 25px; border-radius: 10px; }
        .recommendations li { margin: 10px 0; padding: 8px 0; border-bottom: 1px solid rgba(0,0,0,0.1); }
        .metrics { text-align: center; margin: 20px 0; }
        .metric-card { display: inline-block; margin: 10px; padding: 20px; background: white; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); text-align: center; min-width: 150px; }
        .metric-value { font-size: 24px; font-weight: bold; color: #667eea; }
        .metric-label { font-size: 14px; color: #666; margin-top: 5px; }
        .toc { background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .toc ul { list-style: none; padding: 0; }
        .toc li { margin: 8px 0; }
        .toc a { color: #667eea; text-decoration: none; font-weight: 500; }
        @media print { body { background-color: white; } .container { box-shadow: none; } }
"#;

/// Styled single-page renderer for the `html` key.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl ReportRenderer for HtmlRenderer {
    fn name(&self) -> &str {
        "html"
    }

    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
        let html = generate_html_report(records, &generated_at);
        tracing::debug!(records = records.len(), bytes = html.len(), "rendered html report");
        Ok(html.into_bytes())
    }
}

/// Generate the complete, self-contained HTML report.
pub fn generate_html_report(records: &[Record], generated_at: &NaiveDateTime) -> String {
    let summary = summarize(records);
    let mut body = String::new();

    body.push_str("<div class=\"header\">\n");
    let _ = writeln!(body, "    <div class=\"title\">{}</div>", escape_html(REPORT_TITLE));
    let _ = writeln!(body, "    <div class=\"subtitle\">{}</div>", escape_html(REPORT_SUBTITLE));
    let _ = writeln!(
        body,
        "    <div class=\"date\">{}</div>",
        escape_html(&generated_at_line(generated_at))
    );
    body.push_str("</div>\n");

    body.push_str(&table_of_contents());
    body.push_str(&summary_section(&summary));

    let detail_rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| record.detail_cells().to_vec())
        .collect();
    body.push_str(&section(
        "details",
        DETAILS_TITLE,
        &generate_html_table(&DETAIL_HEADERS, &detail_rows, None),
    ));

    let stats_rows: Vec<Vec<String>> = summary
        .categories
        .entries()
        .iter()
        .map(|(category, count)| vec![category.clone(), count.to_string()])
        .collect();
    body.push_str(&section(
        "statistics",
        STATISTICS_TITLE,
        &generate_html_table(&STATISTICS_HEADERS, &stats_rows, Some("stats-table")),
    ));

    let mut list = String::from("<div class=\"recommendations\">\n<ul>\n");
    for text in RECOMMENDATIONS {
        let _ = writeln!(list, "    <li>{}</li>", escape_html(text));
    }
    list.push_str("</ul>\n</div>");
    body.push_str(&section("recommendations", RECOMMENDATIONS_TITLE, &list));

    generate_html(REPORT_TITLE, &body)
}

/// Wrap body HTML into a complete document with the embedded stylesheet.
pub fn generate_html(title: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{STYLE}    </style>
</head>
<body>
<div class="container">
{body_html}</div>
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// Generate an HTML table from headers and rows.
///
/// Cell content is HTML-escaped to prevent injection.
pub fn generate_html_table(headers: &[&str], rows: &[Vec<String>], class: Option<&str>) -> String {
    let mut html = match class {
        Some(class) => format!("<table class=\"{class}\">\n<thead>\n<tr>\n"),
        None => String::from("<table>\n<thead>\n<tr>\n"),
    };

    for header in headers {
        let _ = writeln!(html, "    <th>{}</th>", escape_html(header));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>\n");
        for cell in row {
            let _ = writeln!(html, "    <td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

fn table_of_contents() -> String {
    let mut toc = String::from("<div class=\"toc\">\n");
    let _ = writeln!(toc, "<h3>{CONTENTS_TITLE}</h3>");
    toc.push_str("<ul>\n");
    for (idx, (anchor, title)) in SECTION_ANCHORS.iter().enumerate() {
        let _ = writeln!(toc, "    <li><a href=\"#{anchor}\">{}. {title}</a></li>", idx + 1);
    }
    toc.push_str("</ul>\n</div>\n");
    toc
}

fn summary_section(summary: &AggregateSummary) -> String {
    let cards = [
        (summary.total_files.to_string(), TOTAL_FILES_LABEL),
        (summary.total_issues.to_string(), TOTAL_ISSUES_LABEL),
        (summary.total_code_lines.to_string(), TOTAL_CODE_LINES_LABEL),
        (summary.density_display(), DENSITY_LABEL),
    ];

    let mut content = String::from("<div class=\"metrics\">\n");
    for (value, label) in &cards {
        content.push_str("    <div class=\"metric-card\">\n");
        let _ = writeln!(content, "        <div class=\"metric-value\">{value}</div>");
        let _ = writeln!(content, "        <div class=\"metric-label\">{label}</div>");
        content.push_str("    </div>\n");
    }
    content.push_str("</div>\n");

    let rows: Vec<Vec<String>> = summary_rows(summary)
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect();
    content.push_str(&generate_html_table(&SUMMARY_HEADERS, &rows, Some("summary-table")));

    section("summary", SUMMARY_TITLE, &content)
}

fn section(id: &str, title: &str, content: &str) -> String {
    format!(
        "<div id=\"{id}\" class=\"section\">\n<div class=\"section-title\">{}</div>\n{content}\n</div>\n",
        escape_html(title)
    )
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
