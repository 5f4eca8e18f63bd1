//! Best-effort street address and postcode extraction.

use regex::Regex;

use matfinder_core::types::AddressParts;

use crate::extract::text::visible_text;
use crate::normalize::normalize_postcode;

/// UK postcode shape: 1–2 letters, 1–2 digits, optional letter, then the
/// 3-character inward code.
fn postcode_re() -> Regex {
    Regex::new(r"\b[A-Za-z]{1,2}\d{1,2}[A-Za-z]?\s*\d[A-Za-z]{2}\b").expect("valid regex")
}

/// Extracts `{address, city, postcode}` from a page.
///
/// Strategy order:
/// 1. labeled block — text after the word "address" up to the next
///    phone/email/contact label;
/// 2. element scan — paragraph/list/div blocks whose text mentions
///    "address";
/// 3. postcode regex over the snippet, falling back to the whole page text.
///
/// The snippet is split on commas/newlines/dashes to approximate street
/// (first segment) and city (last usable segment); a postcode swallowed into
/// the city segment is stripped back out.
pub fn extract_address(html: &str) -> AddressParts {
    let text = visible_text(html);

    let snippet = labeled_address_block(&text).or_else(|| address_element_text(html));

    let postcode = snippet
        .as_deref()
        .and_then(|s| postcode_re().find(s))
        .or_else(|| postcode_re().find(&text))
        .map(|m| normalize_postcode(m.as_str()));

    let (address, city) = match &snippet {
        Some(block) => split_address_segments(block),
        None => (None, None),
    };

    AddressParts {
        address,
        city,
        postcode,
    }
}

/// Text following an "address" label, up to the next label-looking word.
fn labeled_address_block(text: &str) -> Option<String> {
    let label_re = Regex::new(
        r"(?im)\baddress\b\s*:?\s*(.{5,200}?)(?:\b(?:phone|tel|telephone|email|e-mail|contact)\b|$)",
    )
    .expect("valid regex");
    let captured = label_re.captures(text)?.get(1)?.as_str().trim();
    if captured.len() < 5 {
        return None;
    }
    Some(captured.to_owned())
}

/// Fallback: first paragraph/list-item/div/address element whose own text
/// mentions "address". The regex crate has no backreferences, so the close
/// tag is matched by name set, not by pairing — nested markup makes this
/// approximate; best effort.
fn address_element_text(html: &str) -> Option<String> {
    let element_re = Regex::new(r"(?is)<(?:p|li|address|div)\b[^>]*>(.*?)</(?:p|li|address|div)>")
        .expect("valid regex");
    for cap in element_re.captures_iter(html) {
        let inner = cap.get(1).map_or("", |m| m.as_str());
        let inner_text = visible_text(inner);
        if inner_text.to_lowercase().contains("address") && inner_text.len() > 10 {
            return Some(inner_text);
        }
    }
    None
}

/// First segment is the street; the city is the last trailing segment that
/// still has content once the postcode is stripped out of it.
fn split_address_segments(block: &str) -> (Option<String>, Option<String>) {
    let segments: Vec<&str> = block
        .split([',', '\n', '–'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let address = segments.first().map(|s| (*s).to_owned());
    let city = segments
        .iter()
        .skip(1)
        .rev()
        .map(|s| postcode_re().replace_all(s, "").trim().to_owned())
        .find(|s| !s.is_empty());
    (address, city)
}
