//! Export coordinator: validates a request, fetches one page of records, and
//! renders it on the blocking pool behind a concurrency limit.

use std::sync::Arc;

use quill_core::{ExportConfig, ExportError};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::format::{ExportFormat, FormatDescriptor};
use crate::provider::RecordSource;
use crate::registry::FormatRegistry;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// One export call's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: String,
    /// Exact issue type to match; `None` or blank selects every record.
    pub issue_type: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

impl ExportRequest {
    /// A request filled with the configured defaults.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            format: config.default_format.clone(),
            issue_type: config.default_issue_type.clone(),
            page: config.default_page,
            page_size: config.default_page_size,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_issue_type(mut self, issue_type: Option<&str>) -> Self {
        self.issue_type = issue_type.map(String::from);
        self
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// A rendered document and the metadata needed to deliver it.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub descriptor: FormatDescriptor,
    pub record_count: usize,
}

impl ExportedReport {
    /// `report.<extension>`
    pub fn file_name(&self) -> String {
        format!("report.{}", self.descriptor.file_extension)
    }

    pub fn content_type(&self) -> &str {
        &self.descriptor.mime_type
    }

    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name())
    }
}

// ---------------------------------------------------------------------------
// ExportService
// ---------------------------------------------------------------------------

/// Cheap to clone; clones share the record source, registry, and render
/// permits.
#[derive(Clone)]
pub struct ExportService {
    source: Arc<dyn RecordSource>,
    registry: Arc<FormatRegistry>,
    permits: Arc<Semaphore>,
}

impl ExportService {
    pub fn new(
        source: Arc<dyn RecordSource>,
        registry: Arc<FormatRegistry>,
        config: &ExportConfig,
    ) -> Self {
        let limit = config.max_concurrent_exports.max(1);
        info!(max_concurrent = limit, formats = registry.formats().len(), "Export service initialized");
        Self {
            source,
            registry,
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Export one page of records in the requested format.
    ///
    /// Checks run in a fixed order: pagination, then format support, then
    /// whether the page holds any records.
    pub async fn export(
        &self,
        format: &str,
        issue_type: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> Result<ExportedReport, ExportError> {
        let export_id = Uuid::new_v4();
        let offset = page_offset(page, page_size)?;

        if !self.registry.is_supported(format) {
            debug!(%export_id, format, "Rejected unsupported format");
            return Err(ExportError::UnsupportedFormat(format.to_string()));
        }

        let records = self
            .source
            .fetch(issue_type, offset, page_size as u64)
            .await
            .map_err(|e| ExportError::DataSource(e.into()))?;
        if records.is_empty() {
            debug!(%export_id, page, page_size, "Nothing to export");
            return Err(ExportError::NoData);
        }

        let (format, renderer) = self.registry.resolve(format)?;
        let descriptor = self.registry.describe(format.key()).await;
        let record_count = records.len();

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ExportError::render_failure(format.key(), e))?;

        debug!(%export_id, format = %format, records = record_count, "Rendering");
        let rendered = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            renderer.render(&records)
        })
        .await;

        let bytes = match rendered {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(%export_id, format = %format, error = %e, "Render failed");
                return Err(ExportError::render_failure(format.key(), e));
            }
            Err(join_err) => {
                warn!(%export_id, format = %format, error = %join_err, "Render task aborted");
                return Err(ExportError::render_failure(format.key(), join_err));
            }
        };

        info!(
            %export_id,
            format = %format,
            records = record_count,
            bytes = bytes.len(),
            "Export complete"
        );

        Ok(ExportedReport {
            format,
            bytes,
            descriptor,
            record_count,
        })
    }

    pub async fn export_request(&self, request: &ExportRequest) -> Result<ExportedReport, ExportError> {
        self.export(
            &request.format,
            request.issue_type.as_deref(),
            request.page,
            request.page_size,
        )
        .await
    }

    /// Run an export as its own task. Dropping the handle abandons the result
    /// without cancelling a render already in progress.
    pub fn submit(&self, request: ExportRequest) -> JoinHandle<Result<ExportedReport, ExportError>> {
        let service = self.clone();
        tokio::spawn(async move { service.export_request(&request).await })
    }

    /// Total record count, ignoring filters.
    pub async fn total_count(&self) -> Result<u64, ExportError> {
        self.source
            .count()
            .await
            .map_err(|e| ExportError::DataSource(e.into()))
    }

    /// Supported format descriptors: the catalog's list when it answers,
    /// otherwise the built-in descriptors of every registered format.
    pub async fn list_supported(&self) -> Vec<FormatDescriptor> {
        if let Some(catalog) = self.registry.catalog() {
            match catalog.list_supported().await {
                Ok(descriptors) => return descriptors,
                Err(e) => warn!(error = %e, "Format catalog listing failed, using built-in formats"),
            }
        }
        self.registry
            .formats()
            .into_iter()
            .map(FormatDescriptor::for_format)
            .collect()
    }

    pub async fn describe(&self, format: &str) -> FormatDescriptor {
        self.registry.describe(format).await
    }
}

/// Zero-based record offset of a page, rejecting non-positive values and
/// overflow.
fn page_offset(page: i64, page_size: i64) -> Result<u64, ExportError> {
    let invalid = || ExportError::InvalidPagination { page, page_size };
    if page < 1 || page_size < 1 {
        return Err(invalid());
    }
    let offset = (page - 1).checked_mul(page_size).ok_or_else(invalid)?;
    u64::try_from(offset).map_err(|_| invalid())
}
