use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnalysisConfig;
use crate::embed::EmbedError;
use crate::ranking::RankedSection;
use crate::report::SubsectionAnalysis;
use crate::scoring::{RelevanceScorer, Scored};
use crate::text_utils::{refine_text, word_count};

/// A blank-line-delimited excerpt of a selected section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub document: String,
    pub page_number: usize,
}

/// Split section content on blank lines and keep trimmed candidates with
/// strictly more than `min_words` words.
///
/// A blank line is a line break followed by a line holding only
/// whitespace. Single line breaks never split.
pub fn split_paragraphs(content: &str, min_words: usize) -> Vec<String> {
    static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap());

    BLANK_LINE
        .split(content)
        .map(str::trim)
        .filter(|p| word_count(p) > min_words)
        .map(str::to_string)
        .collect()
}

/// Decompose the selected sections into paragraphs and re-rank them.
///
/// Candidates from all sections are scored on their full text and sorted
/// together (stable, descending); the head is normalized with
/// [`refine_text`]. Sections without qualifying paragraphs contribute
/// nothing.
pub fn extract_subsections(
    selected: &[RankedSection],
    scorer: &RelevanceScorer<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<SubsectionAnalysis>, EmbedError> {
    let pool: Vec<Paragraph> = selected
        .iter()
        .flat_map(|ranked| {
            let section = &ranked.section;
            split_paragraphs(&section.content, config.paragraph_min_words())
                .into_iter()
                .map(move |text| Paragraph {
                    text,
                    document: section.document.clone(),
                    page_number: section.page_number,
                })
        })
        .collect();

    if pool.is_empty() {
        tracing::debug!("no paragraph candidates in selected sections");
        return Ok(Vec::new());
    }

    let mut scored = pool
        .into_iter()
        .map(|p| {
            let score = scorer.score_text(&p.text)?;
            Ok::<_, EmbedError>(Scored { item: p, score })
        })
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(scored
        .into_iter()
        .take(config.max_subsections())
        .map(|s| SubsectionAnalysis {
            document: s.item.document,
            refined_text: refine_text(&s.item.text),
            page_number: s.item.page_number,
        })
        .collect())
}
