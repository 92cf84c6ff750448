//! Quill export: format keys and descriptors, record/catalog provider
//! contracts, the format registry, and the export coordinator.

pub mod format;
pub mod provider;
pub mod registry;
pub mod service;

pub use format::{ExportFormat, FormatDescriptor, default_descriptor, default_descriptors};
pub use provider::{FormatCatalog, InMemoryRecordSource, RecordSource, StaticFormatCatalog};
pub use registry::FormatRegistry;
pub use service::{ExportRequest, ExportService, ExportedReport};
