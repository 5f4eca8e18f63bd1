//! Email and phone candidate extraction.
//!
//! Both extractors scan the raw HTML (not the rendered text) so `mailto:`
//! hrefs and numbers hidden inside attributes are still found. Matches are
//! returned verbatim, duplicates included — canonicalization and dedup are
//! [`crate::normalize`]'s job.

use regex::Regex;

pub fn extract_emails(html: &str) -> Vec<String> {
    let email_re =
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex");
    email_re
        .find_iter(html)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// UK-shaped phone candidates: `+44`, `(0)`, or bare leading `0`, followed by
/// 9–11 digits with optional space/dot/dash separators.
///
/// Any 0-prefixed digit run in range will match, reference IDs included.
/// That false-positive rate is accepted; disambiguation is not attempted.
pub fn extract_phones(html: &str) -> Vec<String> {
    let phone_re =
        Regex::new(r"(?:\+44|\(0\)|0)(?:[\s.\-]?\d){9,11}").expect("valid regex");
    phone_re
        .find_iter(html)
        .map(|m| m.as_str().to_owned())
        .collect()
}
