//! Identifier scanning.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::Identifier;

static PAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").expect("Invalid regex pattern"));

/// Find every unique identifier in `text`, in order of first appearance.
///
/// Matching runs over the uppercased text, so `abcde1234f` and `ABCDE1234F`
/// are the same identifier.
pub fn scan_identifiers(text: &str) -> Vec<Identifier> {
    let upper = text.to_uppercase();
    let mut seen = HashSet::new();
    let mut identifiers = Vec::new();

    for m in PAN_PATTERN.find_iter(&upper) {
        if !seen.insert(m.as_str()) {
            continue;
        }
        if let Some(id) = Identifier::parse(m.as_str()) {
            identifiers.push(id);
        }
    }

    log::debug!("Scanned {} unique identifier(s)", identifiers.len());
    identifiers
}
