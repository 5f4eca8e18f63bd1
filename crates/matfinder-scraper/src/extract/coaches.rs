//! Coach name extraction from team/instructor pages.

use regex::Regex;

use crate::extract::text::visible_text;
use crate::normalize::{dedupe, title_case};

/// Names detected on a page: an explicitly labeled head coach (if any) plus
/// the general coach list. The head coach is excluded from `coaches`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoachSignals {
    pub head_coach: Option<String>,
    pub coaches: Vec<String>,
}

/// Two-or-more capitalized words; the usual shape of a western name. Allows
/// hyphens and apostrophes inside words ("O'Brien", "Smith-Jones"). Words
/// join on spaces only, never across line breaks — `visible_text` renders
/// block boundaries as newlines, and names from adjacent page blocks must
/// not merge into one match.
fn name_re() -> Regex {
    Regex::new(r"\b[A-Z][a-zA-Z'\-]+(?: +[A-Z][a-zA-Z'\-]+)+\b").expect("valid regex")
}

/// Extracts coach names.
///
/// Tries a "head coach:" label first, then containers whose class names look
/// coach-related, then — as a last resort — any sentence-sized run of text
/// mentioning "coach". Names are title-cased and deduplicated.
pub fn extract_coaches(html: &str) -> CoachSignals {
    let text = visible_text(html);

    let head_coach = labeled_head_coach(&text);

    let mut names = coach_class_names(html);
    if names.is_empty() {
        names = coach_mention_names(&text);
    }

    let mut coaches: Vec<String> = names
        .into_iter()
        .map(|n| title_case(&n))
        .filter(|n| plausible_name(n))
        .collect();
    if let Some(head) = &head_coach {
        coaches.retain(|c| c != head);
    }

    CoachSignals {
        head_coach,
        coaches: dedupe(coaches),
    }
}

/// The capitalized-words heuristic happily matches label text and gym names;
/// reject candidates containing obvious non-name words.
fn plausible_name(name: &str) -> bool {
    const NOT_NAMES: &[&str] = &[
        "coach", "jiu", "jitsu", "academy", "gym", "club", "class", "belt", "martial",
    ];
    let lowered = name.to_lowercase();
    !NOT_NAMES.iter().any(|w| lowered.contains(w))
}

/// A name immediately following a "head coach" label.
fn labeled_head_coach(text: &str) -> Option<String> {
    let label_re = Regex::new(r"(?i)head\s+coach\s*[:\-]?\s*").expect("valid regex");
    let label = label_re.find(text)?;
    let after = &text[label.end()..];
    let window = trim_to_char_boundaries(after, 0, after.len().min(80));
    let name = name_re().find(window)?;
    // Only trust a name that starts right at the label.
    if name.start() > 2 {
        return None;
    }
    Some(title_case(name.as_str()))
}

/// Names inside elements whose class attribute looks coach-related.
fn coach_class_names(html: &str) -> Vec<String> {
    let container_re = Regex::new(
        r#"(?is)<[a-z][a-z0-9]*\b[^>]*class\s*=\s*["'][^"']*(?:coach|instructor|team-member|staff-member)[^"']*["'][^>]*>(.*?)</"#,
    )
    .expect("valid regex");

    let mut names = Vec::new();
    for cap in container_re.captures_iter(html) {
        let inner_text = visible_text(cap.get(1).map_or("", |m| m.as_str()));
        for name in name_re().find_iter(&inner_text) {
            names.push(name.as_str().to_owned());
        }
    }
    names
}

/// Last resort: names in text runs that mention "coach".
fn coach_mention_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let lowered = text.to_lowercase();
    for (idx, _) in lowered.match_indices("coach") {
        // A window around each mention keeps unrelated page names out.
        let start = idx.saturating_sub(60);
        let end = (idx + 60).min(text.len());
        let window = trim_to_char_boundaries(text, start, end);
        for name in name_re().find_iter(window) {
            names.push(name.as_str().to_owned());
        }
    }
    names
}

fn trim_to_char_boundaries(text: &str, mut start: usize, mut end: usize) -> &str {
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_head_coach_is_found_and_title_cased() {
        let html = "<p>Head Coach: MARCO SILVA (black belt)</p>";
        let signals = extract_coaches(html);
        assert_eq!(signals.head_coach.as_deref(), Some("Marco Silva"));
    }

    #[test]
    fn head_coach_excluded_from_general_list() {
        let html = r#"
            <p>Head coach: Marco Silva</p>
            <div class="coach-card">Marco Silva</div>
            <div class="coach-card">Ana Costa</div>
        "#;
        let signals = extract_coaches(html);
        assert_eq!(signals.head_coach.as_deref(), Some("Marco Silva"));
        assert_eq!(signals.coaches, vec!["Ana Costa"]);
    }

    #[test]
    fn class_containers_yield_names() {
        let html = r#"<div class="team-member">John O'Brien</div><div class="instructor-bio">Lucy Smith-Jones teaches the kids class</div>"#;
        let signals = extract_coaches(html);
        assert!(signals.coaches.contains(&"John O'brien".to_owned()));
        assert!(signals.coaches.contains(&"Lucy Smith-jones".to_owned()));
    }

    #[test]
    fn falls_back_to_coach_mentions_in_text() {
        let html = "<p>Our coach Pedro Alves welcomes beginners.</p>";
        let signals = extract_coaches(html);
        assert_eq!(signals.coaches, vec!["Pedro Alves"]);
        assert!(signals.head_coach.is_none());
    }

    #[test]
    fn head_coach_window_is_trimmed_to_character_boundaries() {
        // A multi-byte character straddling the 80-byte window boundary
        // must not panic the extractor.
        let html = format!("<p>Head coach: {}{}é</p>", "Ana Costa ", "b".repeat(69));
        let signals = extract_coaches(&html);
        assert_eq!(signals.head_coach.as_deref(), Some("Ana Costa"));
    }

    #[test]
    fn names_in_adjacent_blocks_do_not_merge() {
        let html = "<p>Our coaches:</p><p>Marco Silva</p><p>Ana Costa</p>";
        let signals = extract_coaches(html);
        assert_eq!(signals.coaches, vec!["Marco Silva", "Ana Costa"]);
        assert!(signals.head_coach.is_none());
    }

    #[test]
    fn no_names_on_unrelated_page() {
        let html = "<p>Timetable and pricing below.</p>";
        let signals = extract_coaches(html);
        assert!(signals.head_coach.is_none());
        assert!(signals.coaches.is_empty());
    }
}
