use std::path::Path;

use chrono::Utc;
use thiserror::Error;

use docsift_core::{
    AnalysisConfig, EmbedError, EmbeddingSource, QueryEmbeddings, RelevanceScorer, Report,
    Section, SpanSource, assemble_report, extract_subsections, rank_sections,
};
use docsift_parsing::{ParsingError, Segmenter};

use crate::request::AnalysisRequest;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no sections could be extracted from any input document")]
    EmptyCorpus,
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
}

/// Milestones reported while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    DocumentParsed { name: String, sections: usize },
    DocumentSkipped { name: String, reason: String },
    SectionsScored { total: usize },
    SectionsSelected { selected: usize },
    SubsectionsSelected { selected: usize },
}

/// Runs segmentation, scoring, ranking and subsection extraction over a
/// request's documents.
///
/// Span and embedding backends are injected; the analyzer holds no other
/// state between runs.
pub struct Analyzer<'a> {
    spans: &'a dyn SpanSource,
    embedder: &'a dyn EmbeddingSource,
    segmenter: Segmenter,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        spans: &'a dyn SpanSource,
        embedder: &'a dyn EmbeddingSource,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            spans,
            embedder,
            segmenter: Segmenter::with_config(config),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.segmenter.config()
    }

    /// Segment a single document.
    pub fn segment(&self, path: &Path, name: &str) -> Result<Vec<Section>, ParsingError> {
        self.segmenter.segment_via_backend(path, name, self.spans)
    }

    /// Run the full pipeline.
    ///
    /// Missing or unreadable documents are skipped with a warning. Fails
    /// with [`AnalysisError::EmptyCorpus`] when no document yields a
    /// section, and with [`AnalysisError::Embedding`] on the first failed
    /// embedding call.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        progress: impl Fn(ProgressEvent),
    ) -> Result<Report, AnalysisError> {
        let config = self.config();
        let pool = self.collect_sections(request, &progress);
        if pool.is_empty() {
            tracing::warn!(
                documents = request.documents.len(),
                "no sections extracted from any document"
            );
            return Err(AnalysisError::EmptyCorpus);
        }

        let query = request.query();
        let scorer = RelevanceScorer::new(
            self.embedder,
            QueryEmbeddings::compute(self.embedder, &query)?,
            config.weights(),
            config.section_prefix_chars(),
        );

        let scored = scorer.score_sections(pool)?;
        progress(ProgressEvent::SectionsScored {
            total: scored.len(),
        });

        let ranked = rank_sections(scored, config);
        tracing::info!(
            selected = ranked.len(),
            threshold = config.relevance_threshold(),
            "ranked sections"
        );
        progress(ProgressEvent::SectionsSelected {
            selected: ranked.len(),
        });

        let subsections = extract_subsections(&ranked, &scorer, config)?;
        progress(ProgressEvent::SubsectionsSelected {
            selected: subsections.len(),
        });

        Ok(assemble_report(
            request.document_names(),
            &query,
            &ranked,
            subsections,
            Utc::now(),
        ))
    }

    /// Segment every document in request order into one pool.
    fn collect_sections(
        &self,
        request: &AnalysisRequest,
        progress: &impl Fn(ProgressEvent),
    ) -> Vec<Section> {
        let mut pool = Vec::new();
        for doc in &request.documents {
            let name = doc.name();
            let path = doc.path();

            if !path.exists() {
                tracing::warn!(document = %name, path = %path.display(), "document not found");
                progress(ProgressEvent::DocumentSkipped {
                    name,
                    reason: "document not found".to_string(),
                });
                continue;
            }

            match self.segment(&path, &name) {
                Ok(sections) => {
                    tracing::info!(document = %name, sections = sections.len(), "parsed document");
                    progress(ProgressEvent::DocumentParsed {
                        name,
                        sections: sections.len(),
                    });
                    pool.extend(sections);
                }
                Err(e) => {
                    tracing::warn!(document = %name, error = %e, "skipping unreadable document");
                    progress(ProgressEvent::DocumentSkipped {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        pool
    }
}
