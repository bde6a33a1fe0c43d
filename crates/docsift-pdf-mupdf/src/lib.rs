use std::path::Path;

use mupdf::{Document, TextPageFlags};
use serde::Deserialize;

use docsift_core::{BackendError, Block, DocumentLayout, Line, Page, Span, SpanSource};

/// MuPDF-based implementation of [`SpanSource`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the analysis crates do not transitively
/// depend on it.
///
/// Header and footer bands are kept by default. Running heads in large
/// manuals can be dropped with [`with_header_exclusion`] and
/// [`with_footer_exclusion`].
///
/// [`with_header_exclusion`]: MupdfBackend::with_header_exclusion
/// [`with_footer_exclusion`]: MupdfBackend::with_footer_exclusion
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }
}

impl SpanSource for MupdfBackend {
    fn open_document(&self, path: &Path) -> Result<DocumentLayout, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();
        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let band = ExclusionBand::new(
                bounds.y0,
                bounds.y1,
                self.header_exclusion_ratio,
                self.footer_exclusion_ratio,
            );

            let json = page
                .stext_page_as_json_from_page(1.0)
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let glyphs: Vec<GlyphBlock> = text_page
                .blocks()
                .map(|block| {
                    block
                        .lines()
                        .map(|line| {
                            line.chars()
                                .map(|c| (c.char().unwrap_or('\u{FFFD}'), c.size()))
                                .collect()
                        })
                        .collect()
                })
                .collect();

            pages.push(page_from_stext_json(&json, &glyphs, index + 1, &band)?);
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "decoded layout");
        Ok(DocumentLayout { pages })
    }
}

/// Vertical band of a page whose blocks are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ExclusionBand {
    header_threshold: Option<f32>,
    footer_threshold: Option<f32>,
}

impl ExclusionBand {
    fn new(y0: f32, y1: f32, header_ratio: Option<f32>, footer_ratio: Option<f32>) -> Self {
        let height = y1 - y0;
        Self {
            header_threshold: header_ratio.map(|r| y0 + height * r),
            footer_threshold: footer_ratio.map(|r| y1 - height * r),
        }
    }

    fn keeps(&self, bbox: &BBox) -> bool {
        // blocks entirely within the header region
        if let Some(threshold) = self.header_threshold {
            if bbox.y + bbox.h <= threshold {
                return false;
            }
        }
        // blocks whose top edge is in the footer region
        if let Some(threshold) = self.footer_threshold {
            if bbox.y >= threshold {
                return false;
            }
        }
        true
    }
}

// Structured-text JSON as emitted by MuPDF's stext device.

#[derive(Debug, Deserialize)]
struct StextPage {
    #[serde(default)]
    blocks: Vec<StextBlock>,
}

#[derive(Debug, Deserialize)]
struct StextBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    bbox: BBox,
    #[serde(default)]
    lines: Vec<StextLine>,
}

#[derive(Debug, Deserialize)]
struct StextLine {
    #[serde(default)]
    font: StextFont,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct StextFont {
    #[serde(default)]
    name: String,
    #[serde(default)]
    weight: String,
    #[serde(default)]
    size: f32,
}

impl StextFont {
    fn is_bold(&self) -> bool {
        self.weight.eq_ignore_ascii_case("bold") || self.name.to_lowercase().contains("bold")
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct BBox {
    #[serde(default)]
    y: f32,
    #[serde(default)]
    h: f32,
}

/// Characters of one text line with their glyph sizes.
type GlyphLine = Vec<(char, f32)>;

/// Lines of one text block, as read from MuPDF's text page.
type GlyphBlock = Vec<GlyphLine>;

/// Sizes closer than this belong to the same run.
const SIZE_EPSILON: f32 = 0.01;

/// Split a line into spans of consecutive characters sharing a glyph size.
fn size_runs(glyphs: &[(char, f32)], bold: bool) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for &(c, size) in glyphs {
        match spans.last_mut() {
            Some(span) if (span.size - size).abs() < SIZE_EPSILON => span.text.push(c),
            _ => spans.push(Span::new(c.to_string(), size, bold)),
        }
    }
    spans
}

/// Spans of one stext line. Uses the per-character sizes in `glyphs` when
/// they spell the same text, otherwise one span at the line's font size.
fn line_spans(line: StextLine, glyphs: Option<&GlyphLine>) -> Vec<Span> {
    let bold = line.font.is_bold();
    match glyphs {
        Some(glyphs)
            if !glyphs.is_empty() && glyphs.iter().map(|&(c, _)| c).eq(line.text.chars()) =>
        {
            size_runs(glyphs, bold)
        }
        _ => vec![Span::new(line.text, line.font.size, bold)],
    }
}

/// Convert one page of stext JSON into layout blocks. Image blocks and
/// blocks outside the kept band are dropped. `glyphs` holds the page's
/// text blocks in the same order as the JSON text blocks.
fn page_from_stext_json(
    json: &str,
    glyphs: &[GlyphBlock],
    number: usize,
    band: &ExclusionBand,
) -> Result<Page, BackendError> {
    let stext: StextPage = serde_json::from_str(json)
        .map_err(|e| BackendError::ExtractionError(format!("page {number}: {e}")))?;

    let blocks = stext
        .blocks
        .into_iter()
        .filter(|b| b.kind == "text")
        .enumerate()
        .filter(|(_, b)| band.keeps(&b.bbox))
        .map(|(i, b)| {
            let block_glyphs = glyphs.get(i);
            Block::new(
                b.lines
                    .into_iter()
                    .enumerate()
                    .map(|(j, l)| Line::new(line_spans(l, block_glyphs.and_then(|g| g.get(j)))))
                    .collect(),
            )
        })
        .collect();

    Ok(Page { number, blocks })
}
