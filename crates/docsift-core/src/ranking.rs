use crate::Section;
use crate::config::AnalysisConfig;
use crate::scoring::Scored;

/// A section that cleared the relevance threshold, with its 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSection {
    pub section: Section,
    pub score: f64,
    pub importance_rank: usize,
}

/// Order scored sections by descending score and keep the relevant head.
///
/// The sort is stable, so equal scores keep pool order (document order,
/// then emission order within a document). Sections scoring below the
/// relevance threshold are dropped before truncating to the section cap.
pub fn rank_sections(mut scored: Vec<Scored<Section>>, config: &AnalysisConfig) -> Vec<RankedSection> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    scored
        .into_iter()
        .filter(|s| s.score >= config.relevance_threshold())
        .take(config.max_sections())
        .enumerate()
        .map(|(i, s)| RankedSection {
            section: s.item,
            score: s.score,
            importance_rank: i + 1,
        })
        .collect()
}
