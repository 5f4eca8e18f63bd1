//! schema.org JSON-LD extraction.
//!
//! Many gym sites ship a `LocalBusiness`/`SportsActivityLocation` block with
//! a postal address, social links, and sometimes staff — far more reliable
//! than scraping the rendered markup. Malformed blocks are skipped, never
//! fatal. Singular fields keep the first non-empty value found; name lists
//! accumulate across all nodes.

use std::collections::HashSet;

use regex::Regex;
use serde_json::Value;

use matfinder_core::types::AddressParts;

use crate::normalize::{normalize_postcode, title_case};

/// JSON-LD node fields that hold person-or-organization staff references.
const STAFF_FIELDS: &[&str] = &["coach", "employee", "member", "trainer", "staff"];

/// Organizational affiliation fields, probed in order.
const AFFILIATION_FIELDS: &[&str] = &["memberOf", "affiliation", "brand", "parentOrganization"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsonLdSignals {
    pub address: Option<AddressParts>,
    pub instagram: Option<String>,
    pub affiliation: Option<String>,
    pub style_focus: Option<String>,
    pub head_coach: Option<String>,
    pub coaches: Vec<String>,
}

/// Walks every `<script type="application/ld+json">` block in the page.
pub fn extract_jsonld(html: &str) -> JsonLdSignals {
    let script_re = Regex::new(
        r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    let mut signals = JsonLdSignals::default();
    let mut seen_names: HashSet<String> = HashSet::new();

    for cap in script_re.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        if raw.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            continue;
        };

        for node in flatten_nodes(&value) {
            merge_node(&node, &mut signals, &mut seen_names);
        }
    }

    signals
}

/// Accept top-level object, array, or `@graph` container.
fn flatten_nodes(value: &Value) -> Vec<Value> {
    let mut nodes: Vec<Value> = if let Some(arr) = value.as_array() {
        arr.to_vec()
    } else {
        vec![value.clone()]
    };

    let mut expanded = Vec::new();
    for node in &nodes {
        if let Some(graph) = node.get("@graph").and_then(Value::as_array) {
            expanded.extend(graph.iter().cloned());
        }
    }
    nodes.extend(expanded);
    nodes
}

fn merge_node(node: &Value, signals: &mut JsonLdSignals, seen_names: &mut HashSet<String>) {
    if signals.address.is_none() {
        signals.address = read_address(node);
    }
    if signals.instagram.is_none() {
        signals.instagram = read_instagram(node);
    }
    if signals.affiliation.is_none() {
        signals.affiliation = AFFILIATION_FIELDS
            .iter()
            .filter_map(|field| node.get(field))
            .find_map(read_name);
    }
    if signals.style_focus.is_none() {
        signals.style_focus = node
            .get("sport")
            .and_then(read_name)
            .or_else(|| node.get("knowsAbout").and_then(read_name));
    }

    for field in STAFF_FIELDS {
        if let Some(value) = node.get(field) {
            for name in read_name_list(value) {
                let cased = title_case(&name);
                if seen_names.insert(cased.clone()) {
                    signals.coaches.push(cased);
                }
            }
        }
    }
    if signals.head_coach.is_none() {
        signals.head_coach = node.get("coach").and_then(read_name).map(|n| title_case(&n));
    }
}

/// An address-shaped object: either a `PostalAddress`-typed node itself or a
/// node with a nested `address` object.
fn read_address(node: &Value) -> Option<AddressParts> {
    let addr = if is_postal_address(node) {
        node
    } else {
        let nested = node.get("address")?;
        // "address": "1 Mat Lane, London" — a bare string, no parts.
        if let Some(text) = nested.as_str() {
            return Some(AddressParts {
                address: non_empty(text),
                city: None,
                postcode: None,
            });
        }
        nested
    };

    let parts = AddressParts {
        address: addr.get("streetAddress").and_then(Value::as_str).and_then(non_empty),
        city: addr
            .get("addressLocality")
            .and_then(Value::as_str)
            .and_then(non_empty),
        postcode: addr
            .get("postalCode")
            .and_then(Value::as_str)
            .map(normalize_postcode),
    };
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

fn is_postal_address(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("PostalAddress"),
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("PostalAddress")),
        _ => false,
    }
}

/// First `sameAs` link pointing at Instagram, normalized to drop queries and
/// trailing slashes.
fn read_instagram(node: &Value) -> Option<String> {
    let same_as = node.get("sameAs")?;
    let links: Vec<&str> = match same_as {
        Value::String(s) => vec![s.as_str()],
        Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    links
        .into_iter()
        .find(|link| link.contains("instagram.com"))
        .map(|link| {
            let trimmed = link.split(['?', '#']).next().unwrap_or(link);
            trimmed.trim_end_matches('/').to_owned()
        })
}

/// "Name or object with a name": a JSON-LD value that is either a plain
/// string or an object carrying a `name` field.
fn read_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(map) => map.get("name").and_then(Value::as_str).and_then(non_empty),
        Value::Array(arr) => arr.iter().find_map(read_name),
        _ => None,
    }
}

/// Like [`read_name`] but collects every name from an array value.
fn read_name_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(arr) => arr.iter().filter_map(read_name).collect(),
        other => read_name(other).into_iter().collect(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(block: &str) -> String {
        format!(r#"<html><head><script type="application/ld+json">{block}</script></head></html>"#)
    }

    #[test]
    fn reads_local_business_address() {
        let html = page(
            r#"{"@type": "LocalBusiness", "name": "Mat Monkeys",
                "address": {"@type": "PostalAddress", "streetAddress": "12 Mat Lane",
                            "addressLocality": "London", "postalCode": "e8 3rl"}}"#,
        );
        let signals = extract_jsonld(&html);
        let address = signals.address.unwrap();
        assert_eq!(address.address.as_deref(), Some("12 Mat Lane"));
        assert_eq!(address.city.as_deref(), Some("London"));
        assert_eq!(address.postcode.as_deref(), Some("E8 3RL"));
    }

    #[test]
    fn reads_instagram_from_same_as_array() {
        let html = page(
            r#"{"@type": "SportsActivityLocation",
                "sameAs": ["https://facebook.com/matmonkeys",
                           "https://www.instagram.com/matmonkeys/?hl=en"]}"#,
        );
        let signals = extract_jsonld(&html);
        assert_eq!(
            signals.instagram.as_deref(),
            Some("https://www.instagram.com/matmonkeys")
        );
    }

    #[test]
    fn reads_affiliation_from_member_of_object() {
        let html = page(r#"{"@type": "LocalBusiness", "memberOf": {"name": "Checkmat"}}"#);
        let signals = extract_jsonld(&html);
        assert_eq!(signals.affiliation.as_deref(), Some("Checkmat"));
    }

    #[test]
    fn collects_staff_names_across_graph_nodes() {
        let html = page(
            r#"{"@graph": [
                {"@type": "SportsActivityLocation", "coach": {"name": "marco silva"}},
                {"@type": "Organization", "employee": [{"name": "Ana Costa"}, "Pedro Alves"]}
            ]}"#,
        );
        let signals = extract_jsonld(&html);
        assert_eq!(signals.head_coach.as_deref(), Some("Marco Silva"));
        assert_eq!(signals.coaches, vec!["Marco Silva", "Ana Costa", "Pedro Alves"]);
    }

    #[test]
    fn malformed_block_is_skipped_not_fatal() {
        let html = format!(
            "{}{}",
            page("{not valid json"),
            page(r#"{"@type": "LocalBusiness", "sport": "Brazilian Jiu-Jitsu"}"#)
        );
        let signals = extract_jsonld(&html);
        assert_eq!(signals.style_focus.as_deref(), Some("Brazilian Jiu-Jitsu"));
    }

    #[test]
    fn bare_string_address_is_kept_whole() {
        let html = page(r#"{"@type": "LocalBusiness", "address": "1 Mat Lane, London"}"#);
        let signals = extract_jsonld(&html);
        assert_eq!(
            signals.address.unwrap().address.as_deref(),
            Some("1 Mat Lane, London")
        );
    }

    #[test]
    fn no_signals_without_jsonld_blocks() {
        let signals = extract_jsonld("<html><body>plain page</body></html>");
        assert_eq!(signals, JsonLdSignals::default());
    }
}
