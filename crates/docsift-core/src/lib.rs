pub mod backend;
pub mod config;
pub mod config_file;
pub mod embed;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod subsection;
pub mod text_utils;

// Re-export for convenience
pub use backend::{BackendError, SpanSource};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigError};
pub use embed::{
    EmbedError, EmbeddingConfig, EmbeddingProvider, EmbeddingSource, build_embedder,
    cosine_similarity,
};
pub use ranking::{RankedSection, rank_sections};
pub use report::{ExtractedSection, Metadata, Report, SubsectionAnalysis, assemble_report};
pub use scoring::{QueryEmbeddings, RelevanceScorer, Scored, ScoringWeights};
pub use subsection::{Paragraph, extract_subsections, split_paragraphs};
pub use text_utils::{refine_text, word_count};

/// A run of text sharing one font size and weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    /// Font size in points, as reported by the span source.
    pub size: f32,
    pub bold: bool,
}

impl Span {
    pub fn new(text: impl Into<String>, size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            size,
            bold,
        }
    }

    /// Font size rounded to a whole point. Halves round to even so that
    /// 10.5pt and 11.5pt land on 10 and 12 respectively.
    pub fn rounded_size(&self) -> i32 {
        self.size.round_ties_even() as i32
    }
}

/// Spans sharing one baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Concatenated span text, without separators.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A layout block: the unit the segmenter classifies as heading or body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// The first span of the block, which carries the typographic signal.
    pub fn first_span(&self) -> Option<&Span> {
        self.lines.iter().find_map(|l| l.spans.first())
    }

    /// Full block text with lines joined by a space and whitespace runs
    /// collapsed.
    pub fn text(&self) -> String {
        let joined: Vec<String> = self.lines.iter().map(Line::text).collect();
        joined.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }
}

/// One page of a document layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub blocks: Vec<Block>,
}

/// Ordered pages of a single document, as produced by a [`SpanSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .flat_map(|b| b.spans())
    }
}

/// A titled, contiguous stretch of a document between two headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Basename of the source document.
    pub document: String,
    pub title: String,
    pub content: String,
    /// Page on which the section's heading appeared (1-based).
    pub page_number: usize,
}

/// The persona and job-to-be-done a run is conditioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub persona: String,
    pub job: String,
}

impl Query {
    pub fn new(persona: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            job: job.into(),
        }
    }
}
