//! Collaborator contracts for the export coordinator, plus in-memory
//! implementations.
//!
//! A [`RecordSource`] hands out pages of records; a [`FormatCatalog`] answers
//! descriptor lookups. Both are async because real backends sit behind a
//! database or network hop.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use quill_core::Record;
use tracing::debug;

use crate::format::{FormatDescriptor, default_descriptors};

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Paged access to analysis records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Records matching `issue_type` (all records when `None`), skipping
    /// `offset` and returning at most `limit`, in stable order.
    async fn fetch(&self, issue_type: Option<&str>, offset: u64, limit: u64)
    -> Result<Vec<Record>>;

    /// Total number of records, ignoring any filter.
    async fn count(&self) -> Result<u64>;
}

/// Descriptor metadata per format key.
#[async_trait]
pub trait FormatCatalog: Send + Sync {
    /// `Ok(None)` when the catalog has no entry for `key`.
    async fn lookup(&self, key: &str) -> Result<Option<FormatDescriptor>>;

    /// Every descriptor flagged as supported.
    async fn list_supported(&self) -> Result<Vec<FormatDescriptor>>;
}

// ---------------------------------------------------------------------------
// InMemoryRecordSource
// ---------------------------------------------------------------------------

/// Record store held in memory, in insertion order.
#[derive(Default)]
pub struct InMemoryRecordSource {
    records: RwLock<Vec<Record>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records, rejecting the first one that fails validation.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let source = Self::new();
        for record in records {
            source.push(record)?;
        }
        Ok(source)
    }

    /// Load a JSON array of records (camelCase field names).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records from {}", path.display()))?;
        let records: Vec<Record> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse records in {}", path.display()))?;
        debug!(count = records.len(), path = %path.display(), "Loaded records from JSON");
        Self::from_records(records)
    }

    /// Append a record after checking its field lengths.
    pub fn push(&self, record: Record) -> Result<()> {
        let violations = record.validate();
        if !violations.is_empty() {
            let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid record: {}", details.join("; "));
        }
        self.records.write().push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Blank filters select every record.
fn normalize_filter(issue_type: Option<&str>) -> Option<&str> {
    issue_type.filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch(
        &self,
        issue_type: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>> {
        let filter = normalize_filter(issue_type);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| match filter {
                Some(t) => r.issue_type.as_deref() == Some(t),
                None => true,
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().len() as u64)
    }
}

// ---------------------------------------------------------------------------
// StaticFormatCatalog
// ---------------------------------------------------------------------------

/// Catalog backed by a fixed descriptor list.
pub struct StaticFormatCatalog {
    descriptors: Vec<FormatDescriptor>,
}

impl StaticFormatCatalog {
    pub fn new(descriptors: Vec<FormatDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The six built-in descriptors.
    pub fn with_defaults() -> Self {
        Self::new(default_descriptors())
    }
}

#[async_trait]
impl FormatCatalog for StaticFormatCatalog {
    async fn lookup(&self, key: &str) -> Result<Option<FormatDescriptor>> {
        let key = key.trim();
        Ok(self
            .descriptors
            .iter()
            .find(|d| d.key.eq_ignore_ascii_case(key))
            .cloned())
    }

    async fn list_supported(&self) -> Result<Vec<FormatDescriptor>> {
        Ok(self
            .descriptors
            .iter()
            .filter(|d| d.supported)
            .cloned()
            .collect())
    }
}
