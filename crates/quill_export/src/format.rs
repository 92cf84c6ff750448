use quill_core::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

/// The closed set of export format keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xls,
    Xlsx,
    Docx,
    Pdf,
    Html,
    Xml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        Self::Xls,
        Self::Xlsx,
        Self::Docx,
        Self::Pdf,
        Self::Html,
        Self::Xml,
    ];

    /// Canonical lowercase key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Xml => "xml",
        }
    }

    /// Parse a caller-supplied key: surrounding whitespace and case are
    /// ignored. Returns `None` for anything outside the six keys.
    pub fn parse(key: &str) -> Option<Self> {
        let normalized = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.key() == normalized)
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// FormatDescriptor
// ---------------------------------------------------------------------------

/// Metadata the caller needs to deliver a rendered payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub mime_type: String,
    pub file_extension: String,
    pub supported: bool,
    #[serde(default)]
    pub features: Vec<String>,
}

impl FormatDescriptor {
    fn builtin(
        format: ExportFormat,
        display_name: &str,
        description: &str,
        mime_type: &str,
        features: [&str; 3],
    ) -> Self {
        Self {
            key: format.key().to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            mime_type: mime_type.to_string(),
            file_extension: format.key().to_string(),
            supported: true,
            features: features.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in descriptor for a known format.
    pub fn for_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Xls => Self::builtin(
                format,
                "Excel",
                "Excel spreadsheet format",
                "application/vnd.ms-excel",
                ["tabular data", "chart support", "formulas"],
            ),
            ExportFormat::Xlsx => Self::builtin(
                format,
                "Excel",
                "Excel 2007+ format",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ["modern Excel format", "large data sets", "enhanced charts"],
            ),
            ExportFormat::Docx => Self::builtin(
                format,
                "Word",
                "Word document format",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                ["document layout", "styling", "embedded images"],
            ),
            ExportFormat::Pdf => Self::builtin(
                format,
                "PDF",
                "PDF document format",
                "application/pdf",
                ["cross-platform", "print friendly", "tamper resistant"],
            ),
            ExportFormat::Html => Self::builtin(
                format,
                "HTML",
                "HTML web page format",
                "text/html",
                ["browser viewing", "rich styling", "interactive"],
            ),
            ExportFormat::Xml => Self::builtin(
                format,
                "XML",
                "XML data format",
                "application/xml",
                ["data exchange", "structured", "standard format"],
            ),
        }
    }

    /// Descriptor for a key outside the known set.
    pub fn unknown(key: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: "Unknown format".to_string(),
            description: "Unknown format".to_string(),
            mime_type: "application/octet-stream".to_string(),
            file_extension: key.to_string(),
            supported: false,
            features: vec!["unknown format".to_string()],
        }
    }
}

/// Hard-coded descriptor for any key, used when no catalog answers.
pub fn default_descriptor(key: &str) -> FormatDescriptor {
    match ExportFormat::parse(key) {
        Some(format) => FormatDescriptor::for_format(format),
        None => FormatDescriptor::unknown(key),
    }
}

/// The six built-in descriptors in key order.
pub fn default_descriptors() -> Vec<FormatDescriptor> {
    ExportFormat::ALL
        .into_iter()
        .map(FormatDescriptor::for_format)
        .collect()
}
