//! Offline, regex-based recognizer.
//!
//! Tuned for the phrasing of registers and filings: honorific-prefixed
//! person names, `Name:` form fields, and capitalized phrases that end in a
//! corporate suffix. High precision, no model, no network.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::{EntityLabel, RecognizedEntity, Recognizer};
use crate::error::Result;

const ORG_SUFFIXES: &str =
    r"(?:Ltd|Limited|Pvt|Private|Corporation|Corp|Inc|Company|Enterprises|Industries|LLP|LLC)";

static HONORIFIC_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Ms|Mrs|Dr|Shri|Smt)\.?\s+([A-Z](?:[a-z]+|\.|\b)(?:[ \t]+[A-Z](?:[a-z]+|\.|\b)){0,3})")
        .expect("Invalid regex pattern")
});

static LABELLED_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:name)\s*[:\-]\s*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){1,3})")
        .expect("Invalid regex pattern")
});

static ORGANIZATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b([A-Z][A-Za-z&]*(?:[ \t]+&?[ \t]*[A-Z][A-Za-z&]*){{0,5}}[ \t]+{}\b)",
        ORG_SUFFIXES
    ))
    .expect("Invalid regex pattern")
});

static ENDS_WITH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\s{}$", ORG_SUFFIXES)).expect("Invalid regex pattern")
});

/// Regex-based NER backend.
#[derive(Debug, Clone, Default)]
pub struct HeuristicRecognizer;

impl HeuristicRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`Recognizer::recognize`].
    pub fn recognize_sync(&self, span: &str) -> Vec<RecognizedEntity> {
        let mut entities = Vec::new();

        for re in [&*HONORIFIC_PERSON, &*LABELLED_PERSON] {
            for cap in re.captures_iter(span) {
                let Some(m) = cap.get(1) else { continue };
                // "Name: Acme Industries Ltd" is an organization, not a person.
                if ENDS_WITH_SUFFIX.is_match(m.as_str()) {
                    continue;
                }
                push_entity(&mut entities, span, m, EntityLabel::Person);
            }
        }

        for cap in ORGANIZATION.captures_iter(span) {
            if let Some(m) = cap.get(1) {
                push_entity(&mut entities, span, m, EntityLabel::Organization);
            }
        }

        entities.sort_by_key(|e| e.offset);
        entities
    }
}

fn push_entity(
    entities: &mut Vec<RecognizedEntity>,
    span: &str,
    m: regex::Match<'_>,
    label: EntityLabel,
) {
    let offset = span[..m.start()].chars().count();
    if entities.iter().any(|e| e.offset == offset && e.label == label) {
        return;
    }
    entities.push(RecognizedEntity {
        text: m.as_str().split_whitespace().collect::<Vec<_>>().join(" "),
        label,
        offset,
    });
}

#[async_trait]
impl Recognizer for HeuristicRecognizer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn recognize(&self, span: &str) -> Result<Vec<RecognizedEntity>> {
        Ok(self.recognize_sync(span))
    }
}
