//! Quill core: the record model, shared report statistics, the export error
//! taxonomy, configuration, and logging bootstrap.

pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod summary;

pub use config::ExportConfig;
pub use error::{BoxError, ErrorCategory, ExportError};
pub use record::{DATE_TIME_FORMAT, FieldViolation, PLACEHOLDER, Record, format_timestamp};
pub use summary::{AggregateSummary, CategoryCounts, summarize};
