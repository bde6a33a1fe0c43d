use once_cell::sync::Lazy;
use regex::Regex;

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The first `n` characters of `text` (not bytes), never splitting a codepoint.
pub fn truncate_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Normalize an extracted passage for display.
///
/// Removes bullet glyphs, strips leading list markers (`-`, `*`) from every
/// line, rewrites degree markers such as `° F` or `º C` to `°F`/`°C`, and
/// collapses every whitespace run (newlines and blank lines included) to a
/// single space. Applying it twice gives the same result as applying it once.
pub fn refine_text(text: &str) -> String {
    static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*]\s*)+").unwrap());
    static DEGREE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[°º˚]\s*([CF])\b").unwrap());
    static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '•' | '\u{f0b7}'))
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect();

    let text = LIST_MARKER.replace_all(&text, "");
    let text = DEGREE.replace_all(&text, "°$1");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
