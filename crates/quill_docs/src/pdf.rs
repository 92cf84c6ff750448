//! PDF document generation.
//!
//! Generates paginated PDF 1.4 files using raw PDF format construction.
//! ASCII text uses the built-in Helvetica fonts; anything else goes through a
//! predefined CJK CID font (STSong-Light) so no font files are embedded.

use anyhow::Result;
use chrono::NaiveDateTime;
use quill_core::{AggregateSummary, Record, summarize};
use std::fmt::Write as _;

use crate::ReportRenderer;
use crate::layout::{
    DETAIL_HEADERS, DETAILS_TITLE, RECOMMENDATIONS, RECOMMENDATIONS_TITLE, REPORT_SUBTITLE,
    REPORT_TITLE, STATISTICS_HEADERS, STATISTICS_TITLE, SUMMARY_HEADERS, SUMMARY_TITLE,
    generated_at_line, summary_rows,
};

// A4 in points.
const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 36.0;
const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;
/// Space kept clear at the bottom for the page number.
const FOOTER_HEIGHT: f64 = 18.0;

const TITLE_SIZE: f64 = 20.0;
const SUBTITLE_SIZE: f64 = 14.0;
const HEADING_SIZE: f64 = 14.0;
const BODY_SIZE: f64 = 10.0;
const TABLE_SIZE: f64 = 8.0;
const FOOTER_SIZE: f64 = 8.0;
const CELL_PADDING: f64 = 3.0;

const HEADER_FILL: &str = "0.2 0.4 0.6"; // rgb(51, 102, 153)
const STRIPE_FILL: &str = "0.96 0.96 0.96";
const BORDER_STROKE: &str = "0.8 0.8 0.8";

/// Relative widths of the 8 detail columns.
const DETAIL_WEIGHTS: [f64; 8] = [0.5, 1.2, 1.8, 0.7, 0.7, 0.9, 1.6, 1.6];
const PAIR_WEIGHTS: [f64; 2] = [1.5, 1.0];

const SUBJECT: &str = "Code quality inspection results";
const KEYWORDS: &str = "code quality, inspection, report";
const CREATOR: &str = "Quill";
const PRODUCER: &str = "Quill PDF writer";

/// Print-document renderer for the `pdf` key.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    author: String,
}

impl PdfRenderer {
    pub fn with_author(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
        }
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::with_author(CREATOR)
    }
}

impl ReportRenderer for PdfRenderer {
    fn name(&self) -> &str {
        "pdf"
    }

    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
        generate_pdf_report(records, &generated_at, &self.author)
    }
}

/// Generate the PDF report.
///
/// Tables break across pages with their header row repeated; statistics are
/// listed by descending file count.
pub fn generate_pdf_report(
    records: &[Record],
    generated_at: &NaiveDateTime,
    author: &str,
) -> Result<Vec<u8>> {
    let summary = summarize(records);
    let mut layout = PageLayout::new();

    layout.centered_line(REPORT_TITLE, TITLE_SIZE, true);
    layout.centered_line(REPORT_SUBTITLE, SUBTITLE_SIZE, false);
    layout.centered_line(&generated_at_line(generated_at), BODY_SIZE, false);
    layout.gap(12.0);

    add_summary(&mut layout, &summary);

    layout.heading(&format!("2. {DETAILS_TITLE}"));
    let detail_rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| record.detail_cells().to_vec())
        .collect();
    layout.table(&DETAIL_HEADERS, &detail_rows, &DETAIL_WEIGHTS);

    layout.heading(&format!("3. {STATISTICS_TITLE}"));
    let stats_rows: Vec<Vec<String>> = summary
        .categories
        .sorted_by_count_desc()
        .into_iter()
        .map(|(category, count)| vec![category, count.to_string()])
        .collect();
    layout.table(&STATISTICS_HEADERS, &stats_rows, &PAIR_WEIGHTS);

    layout.heading(&format!("4. {RECOMMENDATIONS_TITLE}"));
    for text in RECOMMENDATIONS {
        layout.bullet(text);
    }

    let pages = layout.finish();
    let page_count = pages.len();

    let mut builder = PdfBuilder::new(DocumentInfo {
        title: REPORT_TITLE.to_string(),
        subject: SUBJECT.to_string(),
        author: author.to_string(),
        keywords: KEYWORDS.to_string(),
        creator: CREATOR.to_string(),
        producer: PRODUCER.to_string(),
        creation_date: generated_at.format("D:%Y%m%d%H%M%S").to_string(),
    });
    for page in pages {
        builder.add_page(page);
    }
    let bytes = builder.build();

    tracing::debug!(
        records = records.len(),
        pages = page_count,
        bytes = bytes.len(),
        "rendered pdf report"
    );
    Ok(bytes)
}

fn add_summary(layout: &mut PageLayout, summary: &AggregateSummary) {
    layout.heading(&format!("1. {SUMMARY_TITLE}"));
    let rows: Vec<Vec<String>> = summary_rows(summary)
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect();
    layout.table(&SUMMARY_HEADERS, &rows, &PAIR_WEIGHTS);
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Places text and tables top-down, starting a new page whenever the next
/// element would run into the footer area.
struct PageLayout {
    pages: Vec<String>,
    current: String,
    y: f64,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn bottom() -> f64 {
        MARGIN + FOOTER_HEIGHT
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Returns true when a page break was inserted.
    fn ensure_space(&mut self, height: f64) -> bool {
        let at_top = self.y >= PAGE_HEIGHT - MARGIN;
        if self.y - height < Self::bottom() && !at_top {
            self.new_page();
            return true;
        }
        false
    }

    fn gap(&mut self, height: f64) {
        self.y -= height;
    }

    fn centered_line(&mut self, text: &str, size: f64, bold: bool) {
        let line_height = size * 1.4;
        self.ensure_space(line_height);
        self.y -= line_height;
        let x = MARGIN + ((CONTENT_WIDTH - text_width(text, size)) / 2.0).max(0.0);
        show_text(&mut self.current, x, self.y + size * 0.3, size, bold, text);
    }

    fn heading(&mut self, text: &str) {
        // Keep the heading together with at least one table row.
        let height = HEADING_SIZE * 1.8;
        self.ensure_space(height + 40.0);
        self.y -= height;
        show_text(&mut self.current, MARGIN, self.y + 6.0, HEADING_SIZE, true, text);
    }

    fn bullet(&mut self, text: &str) {
        let line_height = BODY_SIZE * 1.5;
        let indent = 14.0;
        let lines = wrap_text(text, CONTENT_WIDTH - indent, BODY_SIZE);
        self.ensure_space(line_height * lines.len() as f64);

        for (idx, line) in lines.iter().enumerate() {
            self.y -= line_height;
            let baseline = self.y + BODY_SIZE * 0.4;
            if idx == 0 {
                let _ = writeln!(
                    self.current,
                    "0 0 0 rg\n{:.2} {:.2} 3 3 re f",
                    MARGIN + 3.0,
                    baseline + 2.0
                );
            }
            show_text(&mut self.current, MARGIN + indent, baseline, BODY_SIZE, false, line);
        }
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>], weights: &[f64]) {
        let total: f64 = weights.iter().sum();
        let widths: Vec<f64> = weights.iter().map(|w| CONTENT_WIDTH * w / total).collect();
        let line_height = TABLE_SIZE * 1.3;

        let header_lines = wrap_row(headers.iter().copied(), &widths);
        let header_height = row_height(&header_lines, line_height);

        self.ensure_space(header_height);
        self.table_row(&header_lines, &widths, header_height, RowStyle::Header);

        for (idx, row) in rows.iter().enumerate() {
            let lines = wrap_row(row.iter().map(String::as_str), &widths);
            let height = row_height(&lines, line_height);
            if self.ensure_space(height) {
                self.table_row(&header_lines, &widths, header_height, RowStyle::Header);
            }
            let style = if idx % 2 == 0 {
                RowStyle::Plain
            } else {
                RowStyle::Striped
            };
            self.table_row(&lines, &widths, height, style);
        }
        self.y -= 10.0;
    }

    fn table_row(&mut self, cells: &[Vec<String>], widths: &[f64], height: f64, style: RowStyle) {
        let top = self.y;
        let bottom = top - height;
        let out = &mut self.current;

        let fill = match style {
            RowStyle::Header => HEADER_FILL,
            RowStyle::Striped => STRIPE_FILL,
            RowStyle::Plain => "1 1 1",
        };
        let _ = writeln!(out, "{fill} rg\n{MARGIN:.2} {bottom:.2} {CONTENT_WIDTH:.2} {height:.2} re f");

        let (text_fill, bold) = match style {
            RowStyle::Header => ("1 1 1", true),
            _ => ("0 0 0", false),
        };

        let mut x = MARGIN;
        for (lines, width) in cells.iter().zip(widths) {
            let _ = writeln!(
                out,
                "{BORDER_STROKE} RG\n0.5 w\n{x:.2} {bottom:.2} {width:.2} {height:.2} re S"
            );
            let _ = writeln!(out, "{text_fill} rg");
            let mut baseline = top - CELL_PADDING - TABLE_SIZE;
            for line in lines {
                show_text(out, x + CELL_PADDING, baseline, TABLE_SIZE, bold, line);
                baseline -= TABLE_SIZE * 1.3;
            }
            x += width;
        }
        let _ = writeln!(out, "0 0 0 rg");
        self.y = bottom;
    }

    /// Close the last page and stamp every page with "Page i of n".
    fn finish(mut self) -> Vec<String> {
        self.new_page();
        let total = self.pages.len();
        for (idx, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {total}", idx + 1);
            let x = MARGIN + (CONTENT_WIDTH - text_width(&label, FOOTER_SIZE)) / 2.0;
            let _ = writeln!(page, "0.4 0.4 0.4 rg");
            show_text(page, x, MARGIN, FOOTER_SIZE, false, &label);
        }
        self.pages
    }
}

#[derive(Clone, Copy)]
enum RowStyle {
    Header,
    Plain,
    Striped,
}

fn wrap_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[f64]) -> Vec<Vec<String>> {
    cells
        .zip(widths)
        .map(|(cell, width)| wrap_text(cell, width - 2.0 * CELL_PADDING, TABLE_SIZE))
        .collect()
}

fn row_height(cells: &[Vec<String>], line_height: f64) -> f64 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f64 * line_height + 2.0 * CELL_PADDING
}

/// Estimated advance width of a string in points.
fn text_width(text: &str, size: f64) -> f64 {
    text.chars().map(|c| char_width(c, size)).sum()
}

/// Per-glyph estimate in ems. Helvetica's capitals and its widest glyphs run
/// well past the lower-case average, so they get their own classes.
fn char_width(c: char, size: f64) -> f64 {
    let em = match c {
        '@' => 1.02,
        'M' | 'W' | 'm' | 'w' | '%' => 0.95,
        'A'..='Z' => 0.78,
        c if c.is_ascii() => 0.55,
        _ => 1.0,
    };
    size * em
}

/// Greedy word wrap; words wider than the line are split between characters.
fn wrap_text(text: &str, max_width: f64, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0.0;
    let space = char_width(' ', size);

    for word in text.split(' ') {
        let word_width = text_width(word, size);
        let needed = if line.is_empty() { word_width } else { line_width + space + word_width };

        if needed <= max_width {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_width = needed;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_width = 0.0;
        }

        if word_width <= max_width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = char_width(c, size);
            if line_width + w > max_width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
            }
            line.push(c);
            line_width += w;
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Emit one text-showing block, choosing the font by content.
fn show_text(out: &mut String, x: f64, y: f64, size: f64, bold: bool, text: &str) {
    if text.is_empty() {
        return;
    }
    let operand = if text.is_ascii() {
        let font = if bold { "/F2" } else { "/F1" };
        let _ = write!(out, "BT\n{font} {size:.1} Tf\n");
        format!("({})", pdf_escape(text))
    } else {
        let _ = write!(out, "BT\n/F3 {size:.1} Tf\n");
        format!("<{}>", ucs2_hex(text))
    };
    let _ = write!(out, "{x:.2} {y:.2} Td\n{operand} Tj\nET\n");
}

/// Escape special characters for PDF string literals.
fn pdf_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// UTF-16BE hex digits, optionally prefixed with the FEFF byte-order mark.
fn utf16_hex(s: &str, bom: bool) -> String {
    let mut hex = String::with_capacity(s.len() * 4 + 4);
    if bom {
        hex.push_str("FEFF");
    }
    for unit in s.encode_utf16() {
        let _ = write!(hex, "{unit:04X}");
    }
    hex
}

/// Hex for the UCS-2 CMap of the CJK font. Characters outside the Basic
/// Multilingual Plane have no UCS-2 code and are shown as `?`.
fn ucs2_hex(s: &str) -> String {
    let bmp: String = s
        .chars()
        .map(|c| if u32::from(c) > 0xFFFF { '?' } else { c })
        .collect();
    utf16_hex(&bmp, false)
}

// ---------------------------------------------------------------------------
// File assembly
// ---------------------------------------------------------------------------

struct DocumentInfo {
    title: String,
    subject: String,
    author: String,
    keywords: String,
    creator: String,
    producer: String,
    creation_date: String,
}

/// Fixed object numbers; page objects follow from `FIRST_PAGE_OBJ`.
const CATALOG_OBJ: usize = 1;
const PAGES_OBJ: usize = 2;
const HELVETICA_OBJ: usize = 3;
const HELVETICA_BOLD_OBJ: usize = 4;
const CJK_FONT_OBJ: usize = 5;
const CJK_CID_OBJ: usize = 6;
const CJK_DESCRIPTOR_OBJ: usize = 7;
const INFO_OBJ: usize = 8;
const FIRST_PAGE_OBJ: usize = 9;

/// Minimal PDF file builder. Constructs valid PDF 1.4 files with one
/// uncompressed content stream per page.
struct PdfBuilder {
    info: DocumentInfo,
    pages: Vec<String>,
}

impl PdfBuilder {
    fn new(info: DocumentInfo) -> Self {
        Self {
            info,
            pages: Vec::new(),
        }
    }

    fn add_page(&mut self, content: String) {
        self.pages.push(content);
    }

    fn page_obj(index: usize) -> usize {
        FIRST_PAGE_OBJ + index * 2
    }

    /// Build the complete PDF file as bytes.
    fn build(&self) -> Vec<u8> {
        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::new();

        pdf.push_str("%PDF-1.4\n");

        push_object(
            &mut pdf,
            &mut offsets,
            &format!("<< /Type /Catalog /Pages {PAGES_OBJ} 0 R >>"),
        );

        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", Self::page_obj(i)))
            .collect();
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            ),
        );

        push_object(
            &mut pdf,
            &mut offsets,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        push_object(
            &mut pdf,
            &mut offsets,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Type /Font /Subtype /Type0 /BaseFont /STSong-Light \
                 /Encoding /UniGB-UCS2-H /DescendantFonts [{CJK_CID_OBJ} 0 R] >>"
            ),
        );
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Type /Font /Subtype /CIDFontType0 /BaseFont /STSong-Light \
                 /CIDSystemInfo << /Registry (Adobe) /Ordering (GB1) /Supplement 2 >> \
                 /FontDescriptor {CJK_DESCRIPTOR_OBJ} 0 R /DW 1000 >>"
            ),
        );
        push_object(
            &mut pdf,
            &mut offsets,
            "<< /Type /FontDescriptor /FontName /STSong-Light /Flags 6 \
             /FontBBox [-25 -254 1000 880] /ItalicAngle 0 /Ascent 880 /Descent -120 \
             /CapHeight 880 /StemV 93 >>",
        );

        let info = &self.info;
        push_object(
            &mut pdf,
            &mut offsets,
            &format!(
                "<< /Title <{}> /Subject <{}> /Author <{}> /Keywords <{}> \
                 /Creator <{}> /Producer <{}> /CreationDate ({}) >>",
                utf16_hex(&info.title, true),
                utf16_hex(&info.subject, true),
                utf16_hex(&info.author, true),
                utf16_hex(&info.keywords, true),
                utf16_hex(&info.creator, true),
                utf16_hex(&info.producer, true),
                pdf_escape(&info.creation_date),
            ),
        );

        debug_assert_eq!(offsets.len() + 1, FIRST_PAGE_OBJ);
        for (i, content) in self.pages.iter().enumerate() {
            let contents_obj = Self::page_obj(i) + 1;
            push_object(
                &mut pdf,
                &mut offsets,
                &format!(
                    "<< /Type /Page /Parent {PAGES_OBJ} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                     /Contents {contents_obj} 0 R /Resources << /Font << \
                     /F1 {HELVETICA_OBJ} 0 R /F2 {HELVETICA_BOLD_OBJ} 0 R /F3 {CJK_FONT_OBJ} 0 R >> >> >>"
                ),
            );
            push_object(
                &mut pdf,
                &mut offsets,
                &format!(
                    "<< /Length {} >>\nstream\n{content}\nendstream",
                    content.len()
                ),
            );
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        let _ = write!(pdf, "xref\n0 {num_objects}\n");
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            let _ = writeln!(pdf, "{offset:010} 00000 n ");
        }

        let _ = write!(
            pdf,
            "trailer\n<< /Size {num_objects} /Root {CATALOG_OBJ} 0 R /Info {INFO_OBJ} 0 R >>\n"
        );
        let _ = write!(pdf, "startxref\n{xref_offset}\n%%EOF\n");

        pdf.into_bytes()
    }
}

/// Append the next numbered object, recording its byte offset for the xref.
fn push_object(pdf: &mut String, offsets: &mut Vec<usize>, body: &str) {
    offsets.push(pdf.len());
    let _ = write!(pdf, "{} 0 obj\n{body}\nendobj\n", offsets.len());
}
