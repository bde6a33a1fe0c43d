use std::path::Path;

use thiserror::Error;

use crate::DocumentLayout;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
}

/// Trait for typographic span extraction backends.
///
/// Implementors provide the low-level layout decoding step; section
/// detection on top of the returned layout lives in
/// `docsift_parsing::Segmenter`.
pub trait SpanSource: Send + Sync {
    /// Decode a document into pages of blocks, lines and spans.
    fn open_document(&self, path: &Path) -> Result<DocumentLayout, BackendError>;
}
