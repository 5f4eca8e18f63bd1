//! Pure extractors: HTML/text in, structured candidates out.
//!
//! Each extractor is independently testable against literal HTML fixtures
//! and degrades to "no signal found" on malformed input.

pub mod address;
pub mod coaches;
pub mod contacts;
pub mod jsonld;
pub mod keywords;
pub mod text;

pub use address::extract_address;
pub use coaches::{extract_coaches, CoachSignals};
pub use contacts::{extract_emails, extract_phones};
pub use jsonld::{extract_jsonld, JsonLdSignals};
pub use keywords::detect_keywords;
pub use text::visible_text;
