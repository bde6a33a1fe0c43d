use thiserror::Error;

use crate::scoring::ScoringWeights;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("scoring weights must be non-negative and not both zero (job={job}, persona={persona})")]
    InvalidWeights { job: f64, persona: f64 },
    #[error("default section title must not be blank")]
    BlankDefaultTitle,
}

/// Tunable thresholds for the analysis pipeline.
///
/// Constructed once per run and shared read-only by the segmenter, scorer,
/// ranker and subsection extractor. Use [`AnalysisConfigBuilder`] to
/// override individual values.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    // ── segmentation ──
    /// A heading block must have strictly fewer words than this (default: 12).
    heading_max_words: usize,
    /// Body font size assumed for documents without any text (default: 10).
    default_body_font_size: i32,
    /// Title given to text preceding the first heading (default: "Introduction").
    default_section_title: String,
    /// Terminate each body block with a blank line so that every block
    /// becomes its own paragraph candidate (default: false).
    paragraph_per_block: bool,

    // ── scoring ──
    /// Weights of job and persona similarity in the composite score.
    weights: ScoringWeights,
    /// Number of content characters appended to a section title when
    /// scoring a section (default: 500).
    section_prefix_chars: usize,

    // ── ranking ──
    /// Minimum composite score for a section to be selected (default: 0.25).
    relevance_threshold: f64,
    /// Maximum number of selected sections (default: 5).
    max_sections: usize,

    // ── subsections ──
    /// A paragraph candidate must have strictly more words than this (default: 15).
    paragraph_min_words: usize,
    /// Maximum number of refined subsections (default: 5).
    max_subsections: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            heading_max_words: 12,
            default_body_font_size: 10,
            default_section_title: "Introduction".to_string(),
            paragraph_per_block: false,
            weights: ScoringWeights::default(),
            section_prefix_chars: 500,
            relevance_threshold: 0.25,
            max_sections: 5,
            paragraph_min_words: 15,
            max_subsections: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
    }

    pub fn heading_max_words(&self) -> usize {
        self.heading_max_words
    }

    pub fn default_body_font_size(&self) -> i32 {
        self.default_body_font_size
    }

    pub fn default_section_title(&self) -> &str {
        &self.default_section_title
    }

    pub fn paragraph_per_block(&self) -> bool {
        self.paragraph_per_block
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    pub fn section_prefix_chars(&self) -> usize {
        self.section_prefix_chars
    }

    pub fn relevance_threshold(&self) -> f64 {
        self.relevance_threshold
    }

    pub fn max_sections(&self) -> usize {
        self.max_sections
    }

    pub fn paragraph_min_words(&self) -> usize {
        self.paragraph_min_words
    }

    pub fn max_subsections(&self) -> usize {
        self.max_subsections
    }
}

/// Builder for [`AnalysisConfig`].
///
/// Unset values fall back to the defaults. [`build()`](Self::build)
/// validates the combination and fails fast on nonsensical values.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    heading_max_words: Option<usize>,
    default_body_font_size: Option<i32>,
    default_section_title: Option<String>,
    paragraph_per_block: Option<bool>,
    job_weight: Option<f64>,
    persona_weight: Option<f64>,
    section_prefix_chars: Option<usize>,
    relevance_threshold: Option<f64>,
    max_sections: Option<usize>,
    paragraph_min_words: Option<usize>,
    max_subsections: Option<usize>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Segmentation ──

    pub fn heading_max_words(mut self, n: usize) -> Self {
        self.heading_max_words = Some(n);
        self
    }

    pub fn default_body_font_size(mut self, size: i32) -> Self {
        self.default_body_font_size = Some(size);
        self
    }

    pub fn default_section_title(mut self, title: &str) -> Self {
        self.default_section_title = Some(title.to_string());
        self
    }

    pub fn paragraph_per_block(mut self, enabled: bool) -> Self {
        self.paragraph_per_block = Some(enabled);
        self
    }

    // ── Scoring ──

    pub fn job_weight(mut self, weight: f64) -> Self {
        self.job_weight = Some(weight);
        self
    }

    pub fn persona_weight(mut self, weight: f64) -> Self {
        self.persona_weight = Some(weight);
        self
    }

    pub fn section_prefix_chars(mut self, n: usize) -> Self {
        self.section_prefix_chars = Some(n);
        self
    }

    // ── Ranking ──

    pub fn relevance_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = Some(threshold);
        self
    }

    pub fn max_sections(mut self, n: usize) -> Self {
        self.max_sections = Some(n);
        self
    }

    // ── Subsections ──

    pub fn paragraph_min_words(mut self, n: usize) -> Self {
        self.paragraph_min_words = Some(n);
        self
    }

    pub fn max_subsections(mut self, n: usize) -> Self {
        self.max_subsections = Some(n);
        self
    }

    /// Validate and produce an [`AnalysisConfig`].
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let defaults = AnalysisConfig::default();

        let weights = ScoringWeights {
            job: self.job_weight.unwrap_or(defaults.weights.job),
            persona: self.persona_weight.unwrap_or(defaults.weights.persona),
        };
        if !weights.job.is_finite()
            || !weights.persona.is_finite()
            || weights.job < 0.0
            || weights.persona < 0.0
            || weights.job + weights.persona == 0.0
        {
            return Err(ConfigError::InvalidWeights {
                job: weights.job,
                persona: weights.persona,
            });
        }

        let relevance_threshold = self
            .relevance_threshold
            .unwrap_or(defaults.relevance_threshold);
        if !relevance_threshold.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "relevance_threshold",
                value: relevance_threshold,
            });
        }

        let at_least = |field: &'static str, value: usize, min: usize| {
            if value < min {
                Err(ConfigError::TooSmall { field, min, value })
            } else {
                Ok(value)
            }
        };

        let default_section_title = self
            .default_section_title
            .unwrap_or(defaults.default_section_title);
        if default_section_title.trim().is_empty() {
            return Err(ConfigError::BlankDefaultTitle);
        }

        Ok(AnalysisConfig {
            heading_max_words: at_least(
                "heading_max_words",
                self.heading_max_words.unwrap_or(defaults.heading_max_words),
                1,
            )?,
            default_body_font_size: self
                .default_body_font_size
                .unwrap_or(defaults.default_body_font_size),
            default_section_title,
            paragraph_per_block: self
                .paragraph_per_block
                .unwrap_or(defaults.paragraph_per_block),
            weights,
            section_prefix_chars: self
                .section_prefix_chars
                .unwrap_or(defaults.section_prefix_chars),
            relevance_threshold,
            max_sections: at_least(
                "max_sections",
                self.max_sections.unwrap_or(defaults.max_sections),
                1,
            )?,
            paragraph_min_words: self
                .paragraph_min_words
                .unwrap_or(defaults.paragraph_min_words),
            max_subsections: at_least(
                "max_subsections",
                self.max_subsections.unwrap_or(defaults.max_subsections),
                1,
            )?,
        })
    }
}
