//! Format key → renderer mapping, with descriptor metadata.

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::{ExportConfig, ExportError};
use quill_docs::{
    DocxRenderer, HtmlRenderer, PdfRenderer, ReportRenderer, XlsxRenderer, XmlRenderer,
};
use tracing::{debug, warn};

use crate::format::{ExportFormat, FormatDescriptor, default_descriptor};
use crate::provider::FormatCatalog;

/// Selects a renderer by format key. Adding a format is one `register` call.
#[derive(Default)]
pub struct FormatRegistry {
    renderers: HashMap<ExportFormat, Arc<dyn ReportRenderer>>,
    catalog: Option<Arc<dyn FormatCatalog>>,
}

impl FormatRegistry {
    /// An empty registry: nothing resolves until renderers are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// All six keys wired to the built-in renderers. Both spreadsheet keys
    /// share the XLSX renderer.
    pub fn with_defaults() -> Self {
        Self::with_pdf_renderer(PdfRenderer::default())
    }

    /// Built-in renderers, with the PDF author taken from configuration.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::with_pdf_renderer(PdfRenderer::with_author(config.report_author.clone()))
    }

    fn with_pdf_renderer(pdf: PdfRenderer) -> Self {
        let spreadsheet: Arc<dyn ReportRenderer> = Arc::new(XlsxRenderer);
        let mut registry = Self::new();
        registry.register(ExportFormat::Xls, spreadsheet.clone());
        registry.register(ExportFormat::Xlsx, spreadsheet);
        registry.register(ExportFormat::Docx, Arc::new(DocxRenderer));
        registry.register(ExportFormat::Pdf, Arc::new(pdf));
        registry.register(ExportFormat::Html, Arc::new(HtmlRenderer));
        registry.register(ExportFormat::Xml, Arc::new(XmlRenderer));
        registry
    }

    /// Attach a catalog consulted by [`describe`](Self::describe).
    pub fn with_catalog(mut self, catalog: Arc<dyn FormatCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Add or replace the renderer for a format.
    pub fn register(&mut self, format: ExportFormat, renderer: Arc<dyn ReportRenderer>) {
        debug!(format = %format, renderer = renderer.name(), "Registered renderer");
        self.renderers.insert(format, renderer);
    }

    pub fn catalog(&self) -> Option<&Arc<dyn FormatCatalog>> {
        self.catalog.as_ref()
    }

    /// Never fails; false for empty, unknown, or unregistered keys.
    pub fn is_supported(&self, key: &str) -> bool {
        ExportFormat::parse(key).is_some_and(|f| self.renderers.contains_key(&f))
    }

    /// Renderer for a key, with the parsed format.
    pub fn resolve(&self, key: &str) -> Result<(ExportFormat, Arc<dyn ReportRenderer>), ExportError> {
        let format = key.parse::<ExportFormat>()?;
        self.renderers
            .get(&format)
            .map(|renderer| (format, Arc::clone(renderer)))
            .ok_or_else(|| ExportError::UnsupportedFormat(key.to_string()))
    }

    /// Registered formats in key order.
    pub fn formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|f| self.renderers.contains_key(f))
            .collect()
    }

    /// Catalog metadata for a key, degrading to the built-in descriptor when
    /// there is no catalog, no entry, or the lookup fails.
    pub async fn describe(&self, key: &str) -> FormatDescriptor {
        let normalized = key.trim().to_ascii_lowercase();
        let Some(catalog) = &self.catalog else {
            return default_descriptor(&normalized);
        };

        match catalog.lookup(&normalized).await {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                debug!(format = %normalized, "No catalog entry, using built-in descriptor");
                default_descriptor(&normalized)
            }
            Err(e) => {
                warn!(format = %normalized, error = %e, "Format catalog lookup failed, using built-in descriptor");
                default_descriptor(&normalized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::default_descriptors;
    use crate::provider::StaticFormatCatalog;
    use anyhow::Result;
    use async_trait::async_trait;

    struct FailingCatalog;

    #[async_trait]
    impl FormatCatalog for FailingCatalog {
        async fn lookup(&self, _key: &str) -> Result<Option<FormatDescriptor>> {
            anyhow::bail!("catalog offline")
        }

        async fn list_supported(&self) -> Result<Vec<FormatDescriptor>> {
            anyhow::bail!("catalog offline")
        }
    }

    #[test]
    fn test_all_six_keys_supported() {
        let registry = FormatRegistry::with_defaults();
        for format in ExportFormat::ALL {
            assert!(registry.is_supported(format.key()));
            let (resolved, _) = registry.resolve(format.key()).unwrap();
            assert_eq!(resolved, format);
        }
        assert_eq!(registry.formats(), ExportFormat::ALL.to_vec());
    }

    #[test]
    fn test_unknown_keys_fail_consistently() {
        let registry = FormatRegistry::with_defaults();
        for key in ["", "   ", "foo", "csv"] {
            assert!(!registry.is_supported(key));
            assert!(matches!(
                registry.resolve(key),
                Err(ExportError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_keys_are_normalized() {
        let registry = FormatRegistry::with_defaults();
        assert!(registry.is_supported(" XLSX "));
        let (format, renderer) = registry.resolve("Pdf").unwrap();
        assert_eq!(format, ExportFormat::Pdf);
        assert_eq!(renderer.name(), "pdf");
    }

    #[test]
    fn test_spreadsheet_keys_share_renderer() {
        let registry = FormatRegistry::with_defaults();
        let (_, xls) = registry.resolve("xls").unwrap();
        let (_, xlsx) = registry.resolve("xlsx").unwrap();
        assert!(Arc::ptr_eq(&xls, &xlsx));
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let mut registry = FormatRegistry::new();
        assert!(!registry.is_supported("xml"));
        assert!(registry.resolve("xml").is_err());

        registry.register(ExportFormat::Xml, Arc::new(XmlRenderer));
        assert!(registry.is_supported("xml"));
        assert_eq!(registry.formats(), vec![ExportFormat::Xml]);
    }

    #[tokio::test]
    async fn test_describe_without_catalog() {
        let registry = FormatRegistry::with_defaults();
        let desc = registry.describe(" HTML ").await;
        assert_eq!(desc.key, "html");
        assert_eq!(desc.mime_type, "text/html");
        assert!(!registry.describe("foo").await.supported);
    }

    #[tokio::test]
    async fn test_describe_prefers_catalog() {
        let mut descriptors = default_descriptors();
        descriptors[3].display_name = "Portable Document".into();
        let registry = FormatRegistry::with_defaults()
            .with_catalog(Arc::new(StaticFormatCatalog::new(descriptors)));
        assert_eq!(registry.describe("pdf").await.display_name, "Portable Document");
    }

    #[tokio::test]
    async fn test_describe_degrades_on_catalog_failure() {
        let registry = FormatRegistry::with_defaults().with_catalog(Arc::new(FailingCatalog));
        let desc = registry.describe("xlsx").await;
        assert_eq!(
            desc.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_from_config_registers_everything() {
        let config = ExportConfig::default();
        let registry = FormatRegistry::from_config(&config);
        assert_eq!(registry.formats().len(), 6);
    }
}
