//! Persona/job-conditioned relevance scoring.
//!
//! Every text unit gets a composite score
//! `job * sim(job_embedding, unit) + persona * sim(persona_embedding, unit)`.
//! The stated task dominates; the persona nudges. Sections are scored on
//! their title plus a bounded prefix of their content, paragraphs on their
//! full text.

use crate::embed::{EmbedError, EmbeddingSource};
use crate::text_utils::truncate_chars;
use crate::{Query, Section};

/// Weights of the two similarity terms in the composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub job: f64,
    pub persona: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            job: 0.8,
            persona: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn combine(&self, job_similarity: f64, persona_similarity: f64) -> f64 {
        self.job * job_similarity + self.persona * persona_similarity
    }
}

/// The two fixed reference vectors of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEmbeddings {
    pub persona: Vec<f32>,
    pub job: Vec<f32>,
}

impl QueryEmbeddings {
    /// Embed persona and job once; reused for every scored unit.
    pub fn compute(source: &dyn EmbeddingSource, query: &Query) -> Result<Self, EmbedError> {
        Ok(Self {
            persona: source.embed(&query.persona)?,
            job: source.embed(&query.job)?,
        })
    }
}

/// A value annotated with its composite relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
}

/// Scores text units against a fixed pair of query embeddings.
pub struct RelevanceScorer<'a> {
    source: &'a dyn EmbeddingSource,
    query: QueryEmbeddings,
    weights: ScoringWeights,
    section_prefix_chars: usize,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(
        source: &'a dyn EmbeddingSource,
        query: QueryEmbeddings,
        weights: ScoringWeights,
        section_prefix_chars: usize,
    ) -> Self {
        Self {
            source,
            query,
            weights,
            section_prefix_chars,
        }
    }

    /// Composite score of an arbitrary text.
    pub fn score_text(&self, text: &str) -> Result<f64, EmbedError> {
        let unit = self.source.embed(text)?;
        let job = f64::from(self.source.similarity(&self.query.job, &unit));
        let persona = f64::from(self.source.similarity(&self.query.persona, &unit));
        Ok(self.weights.combine(job, persona))
    }

    /// Text a section is scored on: its title, a newline, then the first
    /// `section_prefix_chars` characters of its content.
    pub fn section_text(&self, section: &Section) -> String {
        format!(
            "{}\n{}",
            section.title,
            truncate_chars(&section.content, self.section_prefix_chars)
        )
    }

    pub fn score_section(&self, section: Section) -> Result<Scored<Section>, EmbedError> {
        let score = self.score_text(&self.section_text(&section))?;
        tracing::debug!(
            document = %section.document,
            title = %section.title,
            score,
            "scored section"
        );
        Ok(Scored {
            item: section,
            score,
        })
    }

    /// Score every section, preserving pool order.
    pub fn score_sections(
        &self,
        sections: Vec<Section>,
    ) -> Result<Vec<Scored<Section>>, EmbedError> {
        sections.into_iter().map(|s| self.score_section(s)).collect()
    }
}
