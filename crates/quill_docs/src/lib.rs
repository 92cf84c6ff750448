//! Report rendering: spreadsheet (XLSX), flow document (DOCX), styled page
//! (HTML), print document (PDF), and structured markup (XML).
//!
//! Each renderer is a stateless unit struct implementing [`ReportRenderer`].
//! Builders and buffers live only for the duration of one render call.

pub mod docx;
pub mod html;
pub mod layout;
pub mod pdf;
pub mod xlsx;
pub mod xml;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use quill_core::Record;

pub use docx::DocxRenderer;
pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;
pub use xlsx::XlsxRenderer;
pub use xml::XmlRenderer;

/// Turns a record sequence into one format's self-contained byte payload.
pub trait ReportRenderer: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Render with an explicit generation timestamp.
    fn render_at(&self, records: &[Record], generated_at: NaiveDateTime) -> Result<Vec<u8>>;

    /// Render stamped with the current local time.
    fn render(&self, records: &[Record]) -> Result<Vec<u8>> {
        self.render_at(records, Local::now().naive_local())
    }
}
