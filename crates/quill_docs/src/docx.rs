use anyhow::Result;
use chrono::NaiveDateTime;
use docx_rs::*;
use quill_core::{AggregateSummary, Record, summarize};
use std::io::Cursor;

use crate::ReportRenderer;
use crate::layout::{
    CONTENTS_TITLE, DETAIL_HEADERS, DETAILS_TITLE, RECOMMENDATIONS, RECOMMENDATIONS_TITLE,
    REPORT_SUBTITLE, REPORT_TITLE, SECTION_TITLES, STATISTICS_HEADERS, STATISTICS_TITLE,
    SUMMARY_HEADERS, SUMMARY_TITLE, generated_at_line, summary_rows,
};

// Run sizes are in half-points.
const TITLE_SIZE: usize = 48; // 24pt
const SUBTITLE_SIZE: usize = 32; // 16pt
const HEADING_SIZE: usize = 32;
const BODY_SIZE: usize = 22; // 11pt
const TABLE_SIZE: usize = 20; // 10pt

const HEADER_SHADING: &str = "D9D9D9";

/// Grid column widths in twips for the 8-column detail table.
const DETAIL_GRID: [usize; 8] = [700, 1400, 2200, 900, 900, 1200, 1350, 1350];
const PAIR_GRID: [usize; 2] = [3600, 2400];

/// Flow-document renderer for the `docx` key.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl ReportRenderer for DocxRenderer {
    fn name(&self) -> &str {
        "docx"
    }

    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
        generate_docx_report(records, &generated_at)
    }
}

/// Generate the Word report: title page, table-of-contents page, then the
/// four content sections.
pub fn generate_docx_report(records: &[Record], generated_at: &NaiveDateTime) -> Result<Vec<u8>> {
    let summary = summarize(records);
    let mut docx = Docx::new();

    // Title page
    docx = docx
        .add_paragraph(centered(Run::new().add_text(REPORT_TITLE).bold().size(TITLE_SIZE)))
        .add_paragraph(centered(
            Run::new()
                .add_text(REPORT_SUBTITLE)
                .size(SUBTITLE_SIZE)
                .color("595959"),
        ))
        .add_paragraph(centered(
            Run::new()
                .add_text(generated_at_line(generated_at))
                .size(BODY_SIZE)
                .color("808080"),
        ))
        .add_paragraph(page_break());

    // Table of contents: a fixed list, not derived from section positions.
    docx = docx.add_paragraph(heading(CONTENTS_TITLE));
    for (idx, title) in SECTION_TITLES.iter().enumerate() {
        docx = docx.add_paragraph(body(&format!("{}. {title}", idx + 1)));
    }
    docx = docx.add_paragraph(page_break());

    docx = add_summary_section(docx, &summary);
    docx = add_details_section(docx, records);
    docx = add_statistics_section(docx, &summary);
    docx = add_recommendations_section(docx);

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to pack DOCX: {}", e))?;

    let bytes = buf.into_inner();
    tracing::debug!(records = records.len(), bytes = bytes.len(), "rendered docx report");
    Ok(bytes)
}

fn add_summary_section(docx: Docx, summary: &AggregateSummary) -> Docx {
    let rows: Vec<Vec<String>> = summary_rows(summary)
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect();

    docx.add_paragraph(heading(&format!("1. {SUMMARY_TITLE}")))
        .add_table(table(&SUMMARY_HEADERS, &rows, &PAIR_GRID))
        .add_paragraph(Paragraph::new())
}

fn add_details_section(docx: Docx, records: &[Record]) -> Docx {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| record.detail_cells().to_vec())
        .collect();

    docx.add_paragraph(heading(&format!("2. {DETAILS_TITLE}")))
        .add_table(table(&DETAIL_HEADERS, &rows, &DETAIL_GRID))
        .add_paragraph(Paragraph::new())
}

fn add_statistics_section(docx: Docx, summary: &AggregateSummary) -> Docx {
    let rows: Vec<Vec<String>> = summary
        .categories
        .entries()
        .iter()
        .map(|(category, count)| vec![category.clone(), count.to_string()])
        .collect();

    docx.add_paragraph(heading(&format!("3. {STATISTICS_TITLE}")))
        .add_table(table(&STATISTICS_HEADERS, &rows, &PAIR_GRID))
        .add_paragraph(Paragraph::new())
}

fn add_recommendations_section(mut docx: Docx) -> Docx {
    docx = docx.add_paragraph(heading(&format!("4. {RECOMMENDATIONS_TITLE}")));
    for (idx, text) in RECOMMENDATIONS.iter().enumerate() {
        docx = docx.add_paragraph(body(&format!("{}. {text}", idx + 1)));
    }
    docx
}

/// A grid table whose header row is bold, shaded, and centered.
fn table(headers: &[&str], rows: &[Vec<String>], grid: &[usize]) -> Table {
    let mut table_rows = Vec::with_capacity(rows.len() + 1);

    let header_cells: Vec<TableCell> = headers
        .iter()
        .map(|h| {
            let run = Run::new().add_text(*h).bold().size(TABLE_SIZE);
            TableCell::new()
                .add_paragraph(Paragraph::new().add_run(run).align(AlignmentType::Center))
                .shading(Shading::new().fill(HEADER_SHADING))
        })
        .collect();
    table_rows.push(TableRow::new(header_cells));

    for row in rows {
        let cells: Vec<TableCell> = row
            .iter()
            .map(|text| {
                let run = Run::new().add_text(text).size(TABLE_SIZE);
                TableCell::new().add_paragraph(Paragraph::new().add_run(run))
            })
            .collect();
        table_rows.push(TableRow::new(cells));
    }

    Table::new(table_rows).set_grid(grid.to_vec())
}

fn heading(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(HEADING_SIZE))
}

fn body(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).size(BODY_SIZE))
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Read;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name("word/document.xml").unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn sample_records() -> Vec<Record> {
        vec![
            Record {
                id: Some(1),
                file_name: Some("A.java".into()),
                file_path: Some("/src/A.java".into()),
                code_line: Some(100),
                issue_count: Some(5),
                issue_type: Some("bug".into()),
                ..Default::default()
            },
            Record {
                id: Some(2),
                file_name: Some("B.java".into()),
                issue_type: Some("bug".into()),
                ..Default::default()
            },
            Record {
                id: Some(3),
                file_name: Some("C.java".into()),
                issue_type: Some("style".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_generate_docx_report_is_zip() {
        let bytes = generate_docx_report(&sample_records(), &generated_at()).unwrap();
        assert!(bytes.len() > 200);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_title_page_and_toc_separated_by_page_breaks() {
        let bytes = generate_docx_report(&sample_records(), &generated_at()).unwrap();
        let xml = document_xml(&bytes);

        assert_eq!(xml.matches(r#"w:type="page""#).count(), 2);
        let title = xml.find(REPORT_TITLE).unwrap();
        let first_break = xml.find(r#"w:type="page""#).unwrap();
        let toc = xml.find(CONTENTS_TITLE).unwrap();
        let summary = xml.find(&format!("1. {SUMMARY_TITLE}")).unwrap();
        assert!(title < first_break && first_break < toc);
        assert!(xml.rfind(r#"w:type="page""#).unwrap() < xml.rfind(SUMMARY_TITLE).unwrap());
        assert!(toc < summary);
        assert!(xml.contains("Generated at: 2024-05-01 08:00:00"));
    }

    #[test]
    fn test_three_tables_with_expected_rows() {
        let records = sample_records();
        let bytes = generate_docx_report(&records, &generated_at()).unwrap();
        let xml = document_xml(&bytes);

        assert_eq!(xml.matches("</w:tbl>").count(), 3);
        // summary: header + 4; details: header + 3; statistics: header + 2
        assert_eq!(xml.matches("</w:tr>").count(), 5 + 4 + 3);
    }

    #[test]
    fn test_header_rows_are_shaded() {
        let bytes = generate_docx_report(&sample_records(), &generated_at()).unwrap();
        let xml = document_xml(&bytes);
        let header_cells = SUMMARY_HEADERS.len() + DETAIL_HEADERS.len() + STATISTICS_HEADERS.len();
        assert_eq!(xml.matches(HEADER_SHADING).count(), header_cells);
    }

    #[test]
    fn test_placeholders_and_values() {
        let bytes = generate_docx_report(&sample_records(), &generated_at()).unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("A.java"));
        assert!(xml.contains("/src/A.java"));
        assert!(xml.contains("N/A"));
        assert!(xml.contains("50.00 issues/KLOC"));
        for text in RECOMMENDATIONS {
            assert!(xml.contains(text));
        }
    }

    #[test]
    fn test_special_characters() {
        let records = vec![Record {
            file_name: Some("Price: $100 & 10% <off>".into()),
            file_path: Some("She said \"hello\" and 'hi'".into()),
            ..Default::default()
        }];
        let bytes = generate_docx_report(&records, &generated_at()).unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("Price: $100 "));
        assert!(xml.contains("&lt;off&gt;"));
        assert!(!xml.contains("<off>"));
    }

    #[test]
    fn test_renderer_trait() {
        let renderer = DocxRenderer;
        assert_eq!(renderer.name(), "docx");
        assert_eq!(&renderer.render(&sample_records()).unwrap()[0..2], b"PK");
    }
}
