use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use quill_core::{Record, summarize};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};

use crate::ReportRenderer;
use crate::layout::{
    DETAIL_HEADERS, DETAILS_TITLE, RECOMMENDATIONS, RECOMMENDATIONS_TITLE, REPORT_SUBTITLE,
    REPORT_TITLE, STATISTICS_HEADERS, STATISTICS_TITLE, SUMMARY_HEADERS, SUMMARY_TITLE,
    generated_at_line, summary_rows,
};

/// Header row of the detail sheet; rows 0 and 1 hold the title block.
pub const DETAIL_HEADER_ROW: u32 = 2;
/// First data row of the detail sheet.
pub const DETAIL_FIRST_DATA_ROW: u32 = 3;

/// Column widths (in characters) of the detail sheet.
const DETAIL_COLUMN_WIDTHS: [f64; 8] = [15.0, 30.0, 50.0, 15.0, 15.0, 20.0, 20.0, 20.0];
const SUMMARY_COLUMN_WIDTHS: [f64; 2] = [36.0, 24.0];

const HEADER_BACKGROUND: u32 = 0xD3D3D3;

/// Spreadsheet renderer for the `xls` and `xlsx` keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxRenderer;

impl ReportRenderer for XlsxRenderer {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
        generate_xlsx_report(records, &generated_at)
    }
}

struct SheetFormats {
    title: Format,
    subtitle: Format,
    section: Format,
    header: Format,
    density: Format,
}

impl SheetFormats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(16),
            subtitle: Format::new().set_italic().set_font_size(12),
            section: Format::new().set_bold().set_font_size(13),
            header: Format::new()
                .set_bold()
                .set_font_size(11)
                .set_background_color(Color::RGB(HEADER_BACKGROUND))
                .set_border(FormatBorder::Thin),
            density: Format::new().set_num_format("0.00"),
        }
    }
}

/// Generate the spreadsheet report.
///
/// Both worksheets use constant-memory mode: each row is flushed to a temp
/// file once the next row starts, so rows are written strictly top to bottom.
/// Sheet 1 holds the title block and the detail table at fixed row indices;
/// sheet 2 holds the summary, issue type statistics, and recommendations.
pub fn generate_xlsx_report(records: &[Record], generated_at: &NaiveDateTime) -> Result<Vec<u8>> {
    let summary = summarize(records);
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet_with_constant_memory();
        sheet
            .set_name(DETAILS_TITLE)
            .context("Failed to name detail sheet")?;
        write_detail_sheet(sheet, records, generated_at, &formats)?;
    }

    {
        let sheet = workbook.add_worksheet_with_constant_memory();
        sheet
            .set_name("Summary")
            .context("Failed to name summary sheet")?;
        write_summary_sheet(sheet, &summary, &formats)?;
    }

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to save workbook to buffer")?;

    tracing::debug!(records = records.len(), bytes = bytes.len(), "rendered xlsx report");
    Ok(bytes)
}

fn write_detail_sheet(
    sheet: &mut Worksheet,
    records: &[Record],
    generated_at: &NaiveDateTime,
    formats: &SheetFormats,
) -> Result<()> {
    // Column widths go out before any row data.
    for (col, width) in DETAIL_COLUMN_WIDTHS.iter().enumerate() {
        sheet
            .set_column_width(col as u16, *width)
            .with_context(|| format!("Failed to set width of column {col}"))?;
    }

    sheet
        .write_string_with_format(0, 0, REPORT_TITLE, &formats.title)
        .context("Failed to write report title")?;
    sheet
        .write_string_with_format(0, 1, REPORT_SUBTITLE, &formats.subtitle)
        .context("Failed to write report subtitle")?;
    sheet
        .write_string(1, 0, generated_at_line(generated_at))
        .context("Failed to write generation time")?;

    for (col, header) in DETAIL_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(DETAIL_HEADER_ROW, col as u16, *header, &formats.header)
            .with_context(|| format!("Failed to write header at column {col}"))?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = DETAIL_FIRST_DATA_ROW + idx as u32;
        write_detail_row(sheet, row, record)
            .with_context(|| format!("Failed to write detail row {row}"))?;
    }

    Ok(())
}

fn write_detail_row(sheet: &mut Worksheet, row: u32, record: &Record) -> Result<()> {
    let cells = record.detail_cells();

    match record.id {
        Some(id) => sheet.write_number(row, 0, id as f64)?,
        None => sheet.write_string(row, 0, &cells[0])?,
    };
    sheet.write_string(row, 1, &cells[1])?;
    sheet.write_string(row, 2, &cells[2])?;
    sheet.write_number(row, 3, record.code_lines_or_zero() as f64)?;
    sheet.write_number(row, 4, record.issues_or_zero() as f64)?;
    sheet.write_string(row, 5, &cells[5])?;
    sheet.write_string(row, 6, &cells[6])?;
    sheet.write_string(row, 7, &cells[7])?;
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    summary: &quill_core::AggregateSummary,
    formats: &SheetFormats,
) -> Result<()> {
    for (col, width) in SUMMARY_COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let mut row = 0u32;

    // Executive summary
    sheet.write_string_with_format(row, 0, SUMMARY_TITLE, &formats.section)?;
    row += 1;
    write_header_pair(sheet, row, SUMMARY_HEADERS, formats)?;
    row += 1;
    let labels = summary_rows(summary);
    let values = [
        summary.total_files as f64,
        summary.total_issues as f64,
        summary.total_code_lines as f64,
    ];
    for ((label, _), value) in labels.iter().zip(values) {
        sheet.write_string(row, 0, *label)?;
        sheet.write_number(row, 1, value)?;
        row += 1;
    }
    let (density_label, _) = &labels[3];
    sheet.write_string(row, 0, *density_label)?;
    // Stored rounded so the cell value matches the two-decimal display.
    let density: f64 = summary
        .density_display()
        .parse()
        .context("Failed to parse rounded density")?;
    sheet.write_number_with_format(row, 1, density, &formats.density)?;
    row += 2;

    // Issue type statistics, discovery order
    sheet.write_string_with_format(row, 0, STATISTICS_TITLE, &formats.section)?;
    row += 1;
    write_header_pair(sheet, row, STATISTICS_HEADERS, formats)?;
    row += 1;
    for (category, count) in summary.categories.entries() {
        sheet.write_string(row, 0, category)?;
        sheet.write_number(row, 1, *count as f64)?;
        row += 1;
    }
    row += 1;

    // Recommendations
    sheet.write_string_with_format(row, 0, RECOMMENDATIONS_TITLE, &formats.section)?;
    row += 1;
    for (idx, text) in RECOMMENDATIONS.iter().enumerate() {
        sheet.write_string(row, 0, format!("{}. {text}", idx + 1))?;
        row += 1;
    }

    Ok(())
}

fn write_header_pair(
    sheet: &mut Worksheet,
    row: u32,
    headers: [&str; 2],
    formats: &SheetFormats,
) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as u16, *header, &formats.header)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::{Cursor, Read};

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
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
                created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0),
                updated_at: None,
            },
            Record {
                file_name: Some("B.java".into()),
                ..Default::default()
            },
        ]
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn all_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            if file.name().ends_with(".xml") {
                file.read_to_string(&mut out).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_generate_xlsx_report_is_zip() {
        let bytes = generate_xlsx_report(&sample_records(), &generated_at()).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_detail_sheet_row_layout() {
        let records = sample_records();
        let bytes = generate_xlsx_report(&records, &generated_at()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");

        // Two title rows, one header row, then one row per record.
        assert_eq!(sheet.matches("<row ").count(), 3 + records.len());
        assert!(sheet.contains(r#"<row r="3""#));
        assert!(sheet.contains(r#"<row r="4""#));
        assert!(sheet.contains(r#"<row r="5""#));
        assert!(!sheet.contains(r#"<row r="6""#));
    }

    #[test]
    fn test_detail_sheet_column_widths() {
        let bytes = generate_xlsx_report(&sample_records(), &generated_at()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<cols>"));
        assert!(sheet.contains("customWidth=\"1\""));
        // Column definitions precede the row data.
        assert!(sheet.find("<cols>").unwrap() < sheet.find("<sheetData").unwrap());
    }

    #[test]
    fn test_cell_values_and_placeholders() {
        let bytes = generate_xlsx_report(&sample_records(), &generated_at()).unwrap();
        let xml = all_xml(&bytes);
        assert!(xml.contains(REPORT_TITLE));
        assert!(xml.contains("Generated at: 2024-05-01 12:30:00"));
        assert!(xml.contains("A.java"));
        assert!(xml.contains("/src/A.java"));
        assert!(xml.contains("2024-01-01 00:00:00"));
        assert!(xml.contains("N/A"));
        assert!(xml.contains("<v>100</v>"));
        assert!(xml.contains("<v>5</v>"));
    }

    #[test]
    fn test_summary_sheet_sections() {
        let bytes = generate_xlsx_report(&sample_records(), &generated_at()).unwrap();
        let workbook = read_entry(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Detailed Results""#));
        assert!(workbook.contains(r#"name="Summary""#));

        let xml = all_xml(&bytes);
        let summary_pos = xml.find(SUMMARY_TITLE).unwrap();
        let stats_pos = xml.find(STATISTICS_TITLE).unwrap();
        let recs_pos = xml.find(RECOMMENDATIONS_TITLE).unwrap();
        assert!(summary_pos < stats_pos && stats_pos < recs_pos);
        for text in RECOMMENDATIONS {
            assert!(xml.contains(text), "missing recommendation: {text}");
        }
        assert!(xml.contains("<v>50</v>"));
    }

    #[test]
    fn test_detail_sheet_comes_first() {
        let bytes = generate_xlsx_report(&sample_records(), &generated_at()).unwrap();
        let workbook = read_entry(&bytes, "xl/workbook.xml");
        let details = workbook.find(r#"name="Detailed Results""#).unwrap();
        let summary = workbook.find(r#"name="Summary""#).unwrap();
        assert!(details < summary);
    }

    #[test]
    fn test_density_cell_rounds_half_up() {
        let records = vec![Record {
            code_line: Some(8000),
            issue_count: Some(1),
            ..Default::default()
        }];
        let bytes = generate_xlsx_report(&records, &generated_at()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet.contains("<v>0.13</v>"));
    }

    #[test]
    fn test_special_characters_escaped() {
        let records = vec![Record {
            file_name: Some("a<b>&\"c\".rs".into()),
            ..Default::default()
        }];
        let bytes = generate_xlsx_report(&records, &generated_at()).unwrap();
        let xml = all_xml(&bytes);
        assert!(xml.contains("a&lt;b&gt;&amp;"));
    }

    #[test]
    fn test_large_dataset() {
        let records: Vec<Record> = (0..2000)
            .map(|i| Record {
                id: Some(i),
                file_name: Some(format!("File{i}.rs")),
                code_line: Some(10),
                issue_count: Some((i % 4) as u32),
                issue_type: Some(format!("type{}", i % 3)),
                ..Default::default()
            })
            .collect();
        let bytes = generate_xlsx_report(&records, &generated_at()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert_eq!(sheet.matches("<row ").count(), 3 + records.len());
    }

    #[test]
    fn test_renderer_trait() {
        let renderer = XlsxRenderer;
        assert_eq!(renderer.name(), "xlsx");
        let bytes = renderer.render(&sample_records()).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
