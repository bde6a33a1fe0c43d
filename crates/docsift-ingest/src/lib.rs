use thiserror::Error;

pub mod pipeline;
pub mod request;

// Re-export domain types for convenience
pub use docsift_core::{Report, Section, SpanSource};
pub use pipeline::{AnalysisError, Analyzer, ProgressEvent};
pub use request::{AnalysisRequest, ChallengeInfo, DocumentRef, RequestError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of docsift-ingest)")]
    NoPdfSupport,
}

/// The span source used for PDF input.
#[cfg(feature = "pdf")]
pub fn default_span_source() -> Result<Box<dyn SpanSource>, IngestError> {
    Ok(Box::new(docsift_pdf_mupdf::MupdfBackend::default()))
}

#[cfg(not(feature = "pdf"))]
pub fn default_span_source() -> Result<Box<dyn SpanSource>, IngestError> {
    Err(IngestError::NoPdfSupport)
}
