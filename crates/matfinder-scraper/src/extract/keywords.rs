//! Training-vocabulary detection over visible page text.

use regex::Regex;

use matfinder_core::types::KeywordDetection;

/// Detects the fixed vocabulary (gi, no-gi, open mat, drop-in) in
/// whitespace-collapsed visible text (see [`super::text::visible_text`]).
///
/// Flags are only ever set to `Some(true)`; absence stays `None` so the
/// persistence layer never writes a "not detected" value.
///
/// "gi" is tested against text with all no-gi mentions removed first,
/// and only as a standalone word — "no-gi classes" must not imply gi,
/// and "giant" must not match.
pub fn detect_keywords(text: &str) -> KeywordDetection {
    let nogi_re = Regex::new(r"no[\s\-]?gi\b").expect("valid regex");
    let gi_re = Regex::new(r"\bgi\b").expect("valid regex");
    let open_mat_re = Regex::new(r"open[\s\-]?mat\b").expect("valid regex");
    let drop_in_re = Regex::new(r"drop[\s\-]?in\b").expect("valid regex");

    let lowered = text.to_lowercase();
    let mut detected = KeywordDetection::default();

    if nogi_re.is_match(&lowered) {
        detected.nogi = Some(true);
    }
    let without_nogi = nogi_re.replace_all(&lowered, " ");
    if gi_re.is_match(&without_nogi) {
        detected.gi = Some(true);
    }
    if open_mat_re.is_match(&lowered) {
        detected.open_mat = Some(true);
    }
    if drop_in_re.is_match(&lowered) {
        detected.drop_in = Some(true);
    }

    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nogi_alone_does_not_set_gi() {
        let detected = detect_keywords("no-gi classes available");
        assert_eq!(detected.nogi, Some(true));
        assert_eq!(detected.gi, None);
    }

    #[test]
    fn gi_and_nogi_both_detected_when_both_present() {
        let detected = detect_keywords("gi and no-gi classes every week");
        assert_eq!(detected.gi, Some(true));
        assert_eq!(detected.nogi, Some(true));
    }

    #[test]
    fn nogi_single_token_matches() {
        let detected = detect_keywords("nogi fundamentals on Tuesdays");
        assert_eq!(detected.nogi, Some(true));
        assert_eq!(detected.gi, None);
    }

    #[test]
    fn open_matters_does_not_match_open_mat() {
        let detected = detect_keywords("open matters discussed at the AGM");
        assert_eq!(detected.open_mat, None);
    }

    #[test]
    fn giant_does_not_match_gi() {
        let detected = detect_keywords("a giant welcome to new members");
        assert_eq!(detected.gi, None);
    }

    #[test]
    fn open_mat_and_drop_in() {
        let detected = detect_keywords("Open Mat every Sunday, Drop-in welcome");
        assert_eq!(detected.open_mat, Some(true));
        assert_eq!(detected.drop_in, Some(true));
    }

    #[test]
    fn spacing_variants() {
        assert_eq!(detect_keywords("openmat friday").open_mat, Some(true));
        assert_eq!(detect_keywords("drop in anytime").drop_in, Some(true));
    }

    #[test]
    fn nothing_detected_on_unrelated_text() {
        let detected = detect_keywords("yoga and pilates studio");
        assert_eq!(detected, KeywordDetection::default());
    }
}
