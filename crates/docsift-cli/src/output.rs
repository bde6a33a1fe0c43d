use std::io::Write;
use std::path::Path;

use docsift_core::{Report, Section};
use docsift_ingest::ProgressEvent;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// One line per document-level progress event; `None` for pipeline stages,
/// which only update the spinner.
pub fn progress_line(event: &ProgressEvent, color: ColorMode) -> Option<String> {
    match event {
        ProgressEvent::DocumentParsed { name, sections } => Some(if color.enabled() {
            format!("{} {} ({} sections)", "PARSED".green(), name, sections)
        } else {
            format!("PARSED {} ({} sections)", name, sections)
        }),
        ProgressEvent::DocumentSkipped { name, reason } => Some(if color.enabled() {
            format!("{} {}: {}", "SKIPPED".yellow(), name, reason.dimmed())
        } else {
            format!("SKIPPED {}: {}", name, reason)
        }),
        _ => None,
    }
}

/// Spinner message for a pipeline stage.
pub fn stage_message(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::DocumentParsed { name, .. } | ProgressEvent::DocumentSkipped { name, .. } => {
            format!("Read {name}")
        }
        ProgressEvent::SectionsScored { total } => format!("Scored {total} sections"),
        ProgressEvent::SectionsSelected { selected } => {
            format!("Selected {selected} sections, extracting paragraphs...")
        }
        ProgressEvent::SubsectionsSelected { selected } => format!("Selected {selected} paragraphs"),
    }
}

/// Print the ranked sections and paragraphs after a run.
pub fn print_summary(
    w: &mut dyn Write,
    report: &Report,
    output_path: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{} {}", "Persona:".bold(), report.metadata.persona)?;
        writeln!(w, "{} {}", "Task:".bold(), report.metadata.job_to_be_done)?;
    } else {
        writeln!(w, "Persona: {}", report.metadata.persona)?;
        writeln!(w, "Task: {}", report.metadata.job_to_be_done)?;
    }
    writeln!(w)?;

    if report.extracted_sections.is_empty() {
        let msg = "No section cleared the relevance threshold.";
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    for s in &report.extracted_sections {
        let location = format!("({}, p. {})", s.document, s.page_number);
        if color.enabled() {
            writeln!(
                w,
                "{:>3}. {} {}",
                s.importance_rank,
                s.section_title.bold(),
                location.dimmed()
            )?;
        } else {
            writeln!(w, "{:>3}. {} {}", s.importance_rank, s.section_title, location)?;
        }
    }

    writeln!(w)?;
    writeln!(
        w,
        "{} sections, {} paragraphs from {} documents",
        report.extracted_sections.len(),
        report.subsection_analysis.len(),
        report.metadata.input_pdfs.len()
    )?;
    if color.enabled() {
        writeln!(w, "Report written to {}", output_path.display().cyan())?;
    } else {
        writeln!(w, "Report written to {}", output_path.display())?;
    }
    Ok(())
}

/// Print the segmentation of a single document (dry run).
pub fn print_sections(
    w: &mut dyn Write,
    name: &str,
    body_size: i32,
    sections: &[Section],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} (body font size {}pt, {} sections)\n",
            "DRY RUN:".bold().cyan(),
            name.bold(),
            body_size,
            sections.len()
        )?;
    } else {
        writeln!(
            w,
            "DRY RUN: {} (body font size {}pt, {} sections)\n",
            name,
            body_size,
            sections.len()
        )?;
    }

    for (i, section) in sections.iter().enumerate() {
        let preview: String = section.content.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview = if preview.chars().count() > 120 {
            format!("{}...", preview.chars().take(120).collect::<String>())
        } else {
            preview
        };
        let words = docsift_core::word_count(&section.content);

        if color.enabled() {
            writeln!(
                w,
                "[{}] {} {}",
                i + 1,
                section.title.bold(),
                format!("(p. {}, {} words)", section.page_number, words).dimmed()
            )?;
        } else {
            writeln!(
                w,
                "[{}] {} (p. {}, {} words)",
                i + 1,
                section.title,
                section.page_number,
                words
            )?;
        }
        writeln!(w, "    {}", preview)?;
    }
    Ok(())
}

/// Printed when no document produced a section; no report is written.
pub fn print_empty_corpus(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    let msg = "No sections could be extracted from the input documents; no report written.";
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), msg)
    } else {
        writeln!(w, "WARNING: {}", msg)
    }
}
