//! Canonicalization of extracted candidates.
//!
//! Extractors return raw matched substrings; everything here is
//! normalize-then-dedupe, so set semantics work on exact strings.

/// Lowercase + trim.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Canonicalizes a phone candidate to `+<countrycode><national>` form,
/// UK-specific: leading `0` becomes `+44`, a bare `44...` gains a `+`.
/// Numbers already in `+` form are left alone; anything else is returned as
/// bare digits (best effort for non-UK numbers).
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();

    if let Some(rest) = cleaned.strip_prefix("+44") {
        // "(0)" trunk prefixes survive digit-filtering as a stray 0.
        let national = rest.strip_prefix('0').unwrap_or(rest);
        return format!("+44{national}");
    }
    if cleaned.starts_with('+') {
        return cleaned;
    }
    if let Some(national) = cleaned.strip_prefix("44") {
        return format!("+44{national}");
    }
    if let Some(national) = cleaned.strip_prefix('0') {
        return format!("+44{national}");
    }
    cleaned
}

/// Order-preserving dedup by exact string match; empty entries are dropped.
#[must_use]
pub fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Reformats a UK postcode to canonical spacing: uppercase, with a single
/// space before the 3-character inward code (`XX1 1XX`). Idempotent, and
/// handles 5- to 7-character compact forms.
#[must_use]
pub fn normalize_postcode(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.len() > 3 {
        let (outward, inward) = compact.split_at(compact.len() - 3);
        format!("{outward} {inward}")
    } else {
        compact
    }
}

/// Title-cases each whitespace-separated word: first letter uppercase, rest
/// lowercase. Used for coach names from pages that shout in caps.
#[must_use]
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
