use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed cause carried by server-side export faults.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by an export call.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid pagination: page={page}, page_size={page_size} (both must be at least 1)")]
    InvalidPagination { page: i64, page_size: i64 },

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("No data to export")]
    NoData,

    #[error("Failed to render {format} report: {source}")]
    RenderFailure {
        format: String,
        #[source]
        source: BoxError,
    },

    #[error("Record source error: {0}")]
    DataSource(#[source] BoxError),
}

/// Who has to act on an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad request input; the caller fixes the parameters.
    ClientInput,
    /// Valid request against data that cannot be exported (e.g. empty page).
    State,
    /// Internal fault while fetching or rendering.
    Server,
}

impl ExportError {
    pub fn render_failure(format: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::RenderFailure {
            format: format.into(),
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPagination { .. } | Self::UnsupportedFormat(_) => {
                ErrorCategory::ClientInput
            }
            Self::NoData => ErrorCategory::State,
            Self::RenderFailure { .. } | Self::DataSource(_) => ErrorCategory::Server,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPagination { .. } => "Page and page size must be positive.".into(),
            Self::UnsupportedFormat(format) => format!("Unsupported export format: {format}"),
            Self::NoData => "There is no data to export for this filter and page.".into(),
            Self::RenderFailure { format, .. } => {
                format!("The {format} report could not be generated.")
            }
            Self::DataSource(_) => "Analysis records are currently unavailable.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_category_client_input() {
        let err = ExportError::InvalidPagination {
            page: 0,
            page_size: 10,
        };
        assert_eq!(err.category(), ErrorCategory::ClientInput);
        assert_eq!(
            ExportError::UnsupportedFormat("foo".into()).category(),
            ErrorCategory::ClientInput
        );
    }

    #[test]
    fn test_category_state_and_server() {
        assert_eq!(ExportError::NoData.category(), ErrorCategory::State);
        let err = ExportError::render_failure("pdf", anyhow::anyhow!("boom"));
        assert_eq!(err.category(), ErrorCategory::Server);
    }

    #[test]
    fn test_render_failure_preserves_cause() {
        let cause = anyhow::anyhow!("disk full").context("Failed to pack DOCX");
        let err = ExportError::render_failure("docx", cause);
        let source = err.source().expect("render failure must carry a source");
        assert_eq!(source.to_string(), "Failed to pack DOCX");
        assert!(err.to_string().contains("docx"));
    }

    #[test]
    fn test_render_failure_from_io_error() {
        let io = std::io::Error::other("broken pipe");
        let err = ExportError::render_failure("xlsx", io);
        assert_eq!(err.source().unwrap().to_string(), "broken pipe");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = ExportError::render_failure("pdf", anyhow::anyhow!("offset overflow at 0xdead"));
        assert!(!err.user_message().contains("0xdead"));
        let err = ExportError::DataSource(anyhow::anyhow!("connection refused").into());
        assert!(!err.user_message().contains("refused"));
    }

    #[test]
    fn test_display_messages() {
        let err = ExportError::InvalidPagination {
            page: 0,
            page_size: -1,
        };
        assert!(err.to_string().contains("page=0"));
        assert!(err.to_string().contains("page_size=-1"));
        assert_eq!(
            ExportError::UnsupportedFormat("foo".into()).to_string(),
            "Unsupported export format: foo"
        );
        assert_eq!(ExportError::NoData.to_string(), "No data to export");
    }
}
