//! Template-based relation extraction (regex-based).
//!
//! Each template locates the identifier and captures its owner in the same
//! match. Templates are tried in priority order; the first that matches wins.

use regex::Regex;

use super::{EntityKind, Identifier};

const HONORIFICS: &str = r"(?:Mr\.|Ms\.|Mrs\.|Dr\.|Shri|Smt\.)";

/// Any identifier-shaped token; the matched value is compared afterwards.
const ID_GROUP: &str = r"(?P<id>[A-Z]{5}[0-9]{4}[A-Z])";

/// Capitalized name tokens on one line: words or single initials ("A", "A.").
const PERSON_NAME: &str =
    r"(?-i:(?P<name>[A-Z](?:[a-z]+|\.|\b)(?:[ \t]+[A-Z](?:[a-z]+|\.|\b))*))";

/// Capitalized phrase running up to and including the first corporate suffix.
const ORG_PHRASE: &str =
    r"(?P<name>(?-i:[A-Z])[A-Za-z\s&,\.]*?(?:Ltd|Limited|Pvt|Private|Corporation|Corp|Inc|Company|Enterprises|Industries)\b)";

/// One syntactic template: a pattern builder plus the kind it captures.
struct Template {
    name: &'static str,
    kind: EntityKind,
    build: fn(marker: &str) -> String,
}

/// "PAN: ABCDE1234F of Mr. John Smith"
fn marker_id_of_honorific_name(marker: &str) -> String {
    format!(
        r"(?i)\b{marker}[\s:]+{ID_GROUP}\s+(?:of|for|belonging to|issued to)\s+{HONORIFICS}\s*{PERSON_NAME}"
    )
}

/// "Mr. John Smith (PAN: ABCDE1234F)"
fn honorific_name_marker_id(marker: &str) -> String {
    format!(r"(?i){HONORIFICS}\s*{PERSON_NAME}\s*(?:\(|,|\s)\b{marker}[\s:]*{ID_GROUP}")
}

/// "Acme Industries Ltd - PAN: ABCDE1234F"
fn org_marker_id(marker: &str) -> String {
    format!(r"(?i){ORG_PHRASE}\s*(?:-|–|:|,)?\s*\b{marker}[\s:]*{ID_GROUP}")
}

/// "PAN ABCDE1234F in the name of Acme Industries Ltd"
fn marker_id_in_name_of_org(marker: &str) -> String {
    format!(r"(?i)\b{marker}[\s:]*{ID_GROUP}\s+(?:in the name of|belongs to|for)\s+{ORG_PHRASE}")
}

/// Priority order: first match wins.
static TEMPLATES: [Template; 4] = [
    Template {
        name: "marker_id_of_honorific_name",
        kind: EntityKind::Person,
        build: marker_id_of_honorific_name,
    },
    Template {
        name: "honorific_name_marker_id",
        kind: EntityKind::Person,
        build: honorific_name_marker_id,
    },
    Template {
        name: "org_marker_id",
        kind: EntityKind::Organization,
        build: org_marker_id,
    },
    Template {
        name: "marker_id_in_name_of_org",
        kind: EntityKind::Organization,
        build: marker_id_in_name_of_org,
    },
];

#[derive(Debug, Clone)]
struct CompiledTemplate {
    name: &'static str,
    kind: EntityKind,
    regex: Regex,
}

/// Applies the ordered relation templates for a given identifier marker.
///
/// Templates are compiled once per extractor and shared by every identifier.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    templates: Vec<CompiledTemplate>,
}

impl PatternExtractor {
    /// `marker` is the literal token that introduces an identifier, e.g. `PAN`.
    ///
    /// A template that fails to compile is logged and left out, so it never
    /// matches and the caller escalates to the recognizer path.
    pub fn new(marker: &str) -> Self {
        let marker = regex::escape(marker);
        let templates = TEMPLATES
            .iter()
            .filter_map(|template| match Regex::new(&(template.build)(&marker)) {
                Ok(regex) => Some(CompiledTemplate {
                    name: template.name,
                    kind: template.kind,
                    regex,
                }),
                Err(e) => {
                    log::warn!("Skipping template {}: {}", template.name, e);
                    None
                }
            })
            .collect();

        Self { templates }
    }

    /// Try each template against the full text and return the first capture
    /// whose identifier is `id`.
    pub fn extract(&self, text: &str, id: &Identifier) -> Option<(String, EntityKind)> {
        for template in &self.templates {
            let Some(caps) = template.regex.captures_iter(text).find(|caps| {
                caps.name("id")
                    .is_some_and(|m| m.as_str().eq_ignore_ascii_case(id.as_str()))
            }) else {
                continue;
            };
            let Some(name) = caps.name("name").map(|m| clean_capture(m.as_str())) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            log::debug!("{} matched template {} -> {}", id, template.name, name);
            return Some((name, template.kind));
        }

        None
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(super::IDENTIFIER_KIND)
    }
}

/// Trim whitespace and dangling separators left around a capture.
fn clean_capture(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == ',')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
