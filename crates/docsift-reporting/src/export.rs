use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use docsift_core::Report;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Json, ExportFormat::Markdown, ExportFormat::Text]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!(
                "unknown export format '{other}' (expected json, markdown or text)"
            )),
        }
    }
}

/// Write `report` to `path` in `format`, creating the parent directory.
pub fn export_report(report: &Report, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    let content = render_report(report, format)?;

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)?;

    tracing::info!(path = %path.display(), format = %format, "wrote report");
    Ok(())
}

/// Render `report` as a string in `format`.
pub fn render_report(report: &Report, format: ExportFormat) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Json => export_json(report)?,
        ExportFormat::Markdown => export_markdown(report),
        ExportFormat::Text => export_text(report),
    })
}

/// Pretty JSON with a four-space indent; non-ASCII text is written as-is.
fn export_json(report: &Report) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn export_markdown(report: &Report) -> String {
    let meta = &report.metadata;
    let mut out = String::from("# Document Analysis\n\n");

    out.push_str(&format!("**Persona:** {}\n\n", meta.persona));
    out.push_str(&format!("**Job to be done:** {}\n\n", meta.job_to_be_done));
    out.push_str(&format!("**Documents:** {}\n\n", meta.input_pdfs.join(", ")));
    out.push_str(&format!("**Processed:** {}\n\n", meta.processing_timestamp));

    out.push_str("## Extracted Sections\n\n");
    if report.extracted_sections.is_empty() {
        out.push_str("_No section cleared the relevance threshold._\n\n");
    } else {
        out.push_str("| Rank | Section | Document | Page |\n");
        out.push_str("|------|---------|----------|------|\n");
        for s in &report.extracted_sections {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                s.importance_rank,
                md_escape(&s.section_title),
                md_escape(&s.document),
                s.page_number,
            ));
        }
        out.push('\n');
    }

    out.push_str("## Subsection Analysis\n\n");
    if report.subsection_analysis.is_empty() {
        out.push_str("_No qualifying paragraphs._\n");
    } else {
        for sub in &report.subsection_analysis {
            out.push_str(&format!("### {} (page {})\n\n", sub.document, sub.page_number));
            out.push_str(&format!("> {}\n\n", sub.refined_text));
        }
    }
    out
}

fn export_text(report: &Report) -> String {
    let meta = &report.metadata;
    let mut out = String::from("Document Analysis\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("Persona:        {}\n", meta.persona));
    out.push_str(&format!("Job to be done: {}\n", meta.job_to_be_done));
    out.push_str(&format!("Documents:      {}\n", meta.input_pdfs.join(", ")));
    out.push_str(&format!("Processed:      {}\n", meta.processing_timestamp));

    let heading = "Extracted Sections";
    out.push_str(&format!("\n{heading}\n{}\n", "-".repeat(heading.len())));
    if report.extracted_sections.is_empty() {
        out.push_str("  (none)\n");
    }
    for s in &report.extracted_sections {
        out.push_str(&format!(
            "  {:>2}. {} [{}, p. {}]\n",
            s.importance_rank, s.section_title, s.document, s.page_number
        ));
    }

    let heading = "Subsection Analysis";
    out.push_str(&format!("\n{heading}\n{}\n", "-".repeat(heading.len())));
    if report.subsection_analysis.is_empty() {
        out.push_str("  (none)\n");
    }
    for sub in &report.subsection_analysis {
        out.push_str(&format!("  [{}, p. {}]\n", sub.document, sub.page_number));
        out.push_str(&format!("    {}\n\n", sub.refined_text));
    }
    out
}
