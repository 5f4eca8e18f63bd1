//! Visible-text rendering of raw HTML for the text-based extractors.

use regex::Regex;

/// Strips markup down to whitespace-collapsed visible text.
///
/// Script and style bodies and HTML comments are removed entirely,
/// block-level tags become line breaks, remaining tags become single
/// spaces, a handful of common entities are decoded, and blank runs
/// collapse to one space within each line. Text from different block
/// elements never runs together on one line — the name heuristics in the
/// coach extractor depend on that. Case is preserved — the coach extractor
/// also relies on capitalization.
#[must_use]
pub fn visible_text(html: &str) -> String {
    let script_re = Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid regex");
    let comment_re = Regex::new(r"(?s)<!--.*?-->").expect("valid regex");
    let block_re = Regex::new(
        r"(?is)</?(?:p|div|li|ul|ol|br|h[1-6]|table|tr|td|th|address|section|article|header|footer|blockquote)\b[^>]*>",
    )
    .expect("valid regex");
    let tag_re = Regex::new(r"(?s)<[^>]+>").expect("valid regex");

    let stripped = script_re.replace_all(html, " ");
    let stripped = comment_re.replace_all(&stripped, " ");
    let stripped = block_re.replace_all(&stripped, "\n");
    let stripped = tag_re.replace_all(&stripped, " ");

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    collapse_whitespace(&decoded)
}

/// Collapses blank runs within each line and drops empty lines. Line breaks
/// mark block boundaries.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
