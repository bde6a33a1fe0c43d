use docsift_core::text_utils::word_count;
use docsift_core::{AnalysisConfig, Block, DocumentLayout, Section};

/// Appended after every body block. Consecutive blocks therefore never
/// form a blank line, and a section's content stays one paragraph.
pub const BLOCK_TERMINATOR: &str = "\n";

/// Block terminator used when `paragraph_per_block` is enabled: every body
/// block ends in a blank line and becomes its own paragraph candidate.
pub const BLANK_LINE_TERMINATOR: &str = "\n\n";

/// The rounded font size carrying the most characters in the document.
///
/// Blank spans are ignored. Ties go to the size seen first. Documents
/// without text fall back to `default`.
pub fn body_font_size(layout: &DocumentLayout, default: i32) -> i32 {
    // (size, chars) in first-seen order
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for span in layout.spans() {
        if span.text.trim().is_empty() {
            continue;
        }
        let size = span.rounded_size();
        let chars = span.text.chars().count();
        match counts.iter_mut().find(|(s, _)| *s == size) {
            Some(entry) => entry.1 += chars,
            None => counts.push((size, chars)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(i32, usize)>, (size, chars)| match best {
            Some((_, best_chars)) if best_chars >= chars => best,
            _ => Some((size, chars)),
        })
        .map(|(size, _)| size)
        .unwrap_or(default)
}

/// Heading predicate.
///
/// A block is a heading when its first span is larger than body text, or
/// bold and at least body size, and the block is short. The word cap keeps
/// emphasized body sentences from being read as headings.
pub fn is_heading(size: i32, bold: bool, words: usize, body_size: i32, max_words: usize) -> bool {
    let typographic = size > body_size || (bold && size >= body_size);
    typographic && words < max_words
}

/// Explicit flush/accumulate state threaded through the block walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterState {
    current_title: String,
    current_content: String,
    current_page_start: usize,
}

impl SegmenterState {
    /// Start accumulating under `initial_title` on page 1.
    pub fn new(initial_title: &str) -> Self {
        Self {
            current_title: initial_title.to_string(),
            current_content: String::new(),
            current_page_start: 1,
        }
    }

    pub fn current_title(&self) -> &str {
        &self.current_title
    }

    pub fn current_content(&self) -> &str {
        &self.current_content
    }

    pub fn current_page_start(&self) -> usize {
        self.current_page_start
    }

    /// A heading block: flush the running section (if it has content), then
    /// start a new one titled `title` on `page`.
    pub fn on_heading(&mut self, title: String, page: usize, document: &str) -> Option<Section> {
        let flushed = self.flush(document);
        self.current_title = title;
        self.current_content.clear();
        self.current_page_start = page;
        flushed
    }

    /// A body block: append each line's text followed by a space, then the
    /// block terminator.
    pub fn on_body(&mut self, block: &Block, terminator: &str) {
        for line in &block.lines {
            self.current_content.push_str(&line.text());
            self.current_content.push(' ');
        }
        self.current_content.push_str(terminator);
    }

    /// End of document: emit the trailing section if it has content.
    pub fn finish(self, document: &str) -> Option<Section> {
        self.flush(document)
    }

    fn flush(&self, document: &str) -> Option<Section> {
        let content = self.current_content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Section {
            document: document.to_string(),
            title: self.current_title.clone(),
            content: content.to_string(),
            page_number: self.current_page_start,
        })
    }
}

/// Split one document layout into titled sections, in document order.
pub fn segment_layout(layout: &DocumentLayout, document: &str, config: &AnalysisConfig) -> Vec<Section> {
    let body_size = body_font_size(layout, config.default_body_font_size());
    let terminator = if config.paragraph_per_block() {
        BLANK_LINE_TERMINATOR
    } else {
        BLOCK_TERMINATOR
    };

    let mut state = SegmenterState::new(config.default_section_title());
    let mut sections = Vec::new();

    for page in &layout.pages {
        for block in &page.blocks {
            let text = block.text();
            if text.is_empty() {
                continue;
            }
            let Some(first) = block.first_span() else {
                continue;
            };

            if is_heading(
                first.rounded_size(),
                first.bold,
                word_count(&text),
                body_size,
                config.heading_max_words(),
            ) {
                sections.extend(state.on_heading(text, page.number, document));
            } else {
                state.on_body(block, terminator);
            }
        }
    }

    sections.extend(state.finish(document));
    sections
}
