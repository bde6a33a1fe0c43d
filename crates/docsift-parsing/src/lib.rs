use std::path::Path;

use thiserror::Error;

pub mod section;

pub use section::{
    BLANK_LINE_TERMINATOR, BLOCK_TERMINATOR, SegmenterState, body_font_size, is_heading,
    segment_layout,
};
// Re-export domain types from core (canonical definitions live there)
pub use docsift_core::{AnalysisConfig, BackendError, DocumentLayout, Section, SpanSource};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("backend error: {0}")]
    Backend(#[from] docsift_core::BackendError),
}

/// Splits documents into titled sections using font metrics.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: AnalysisConfig,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Segment an already decoded layout.
    pub fn segment(&self, layout: &DocumentLayout, document: &str) -> Vec<Section> {
        segment_layout(layout, document, &self.config)
    }

    /// Decode `path` through `backend`, then segment it.
    ///
    /// Pipeline:
    /// 1. Decode pages/blocks/lines/spans via `backend`
    /// 2. Find the body font size (size with the most characters)
    /// 3. Walk blocks in order, flushing a section at every heading
    pub fn segment_via_backend(
        &self,
        path: &Path,
        document: &str,
        backend: &dyn SpanSource,
    ) -> Result<Vec<Section>, ParsingError> {
        let layout = backend.open_document(path)?;
        let sections = self.segment(&layout, document);
        tracing::debug!(
            document,
            pages = layout.pages.len(),
            sections = sections.len(),
            "segmented document"
        );
        Ok(sections)
    }
}

/// Segment a PDF file using the given backend for span extraction.
pub fn segment_document(
    path: &Path,
    document: &str,
    backend: &dyn SpanSource,
) -> Result<Vec<Section>, ParsingError> {
    Segmenter::new().segment_via_backend(path, document, backend)
}
