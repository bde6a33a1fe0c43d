use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::Query;
use crate::ranking::RankedSection;

/// Run metadata carried at the top of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Input document basenames, in request order.
    pub input_pdfs: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    /// ISO-8601 UTC timestamp of processing completion.
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: usize,
}

impl From<&RankedSection> for ExtractedSection {
    fn from(ranked: &RankedSection) -> Self {
        Self {
            document: ranked.section.document.clone(),
            section_title: ranked.section.title.clone(),
            importance_rank: ranked.importance_rank,
            page_number: ranked.section.page_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: usize,
}

/// The terminal artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

/// Format a timestamp the way the report carries it:
/// `2025-07-10T12:34:56.123456+00:00`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Merge ranking output with run metadata. Section and subsection order is
/// taken as-is.
pub fn assemble_report(
    input_documents: Vec<String>,
    query: &Query,
    ranked: &[RankedSection],
    subsections: Vec<SubsectionAnalysis>,
    completed_at: DateTime<Utc>,
) -> Report {
    Report {
        metadata: Metadata {
            input_pdfs: input_documents,
            persona: query.persona.clone(),
            job_to_be_done: query.job.clone(),
            processing_timestamp: format_timestamp(completed_at),
        },
        extracted_sections: ranked.iter().map(ExtractedSection::from).collect(),
        subsection_analysis: subsections,
    }
}
