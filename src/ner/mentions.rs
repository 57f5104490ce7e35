//! Person/organization mention extraction on top of a recognizer.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{RecognizedEntity, Recognizer};
use crate::error::Result;
use crate::relation::EntityKind;

/// A recognized name span that survived noise filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub kind: EntityKind,
    /// Character offset within the span the mention was extracted from.
    pub offset: usize,
}

/// Mentions from one recognizer call, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionSet {
    pub persons: Vec<EntityMention>,
    pub organizations: Vec<EntityMention>,
}

impl MentionSet {
    pub fn person_names(&self) -> Vec<String> {
        self.persons.iter().map(|m| m.text.clone()).collect()
    }

    pub fn organization_names(&self) -> Vec<String> {
        self.organizations.iter().map(|m| m.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.organizations.is_empty()
    }
}

/// Wraps the recognizer and drops trivial or noisy mentions.
///
/// Recognizer failures are returned as errors, never as "no mentions": a
/// broken dependency must not look like an unresolved identifier.
#[derive(Clone)]
pub struct MentionExtractor {
    recognizer: Arc<dyn Recognizer>,
}

impl MentionExtractor {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }

    /// Mentions of a single kind, in recognizer emission order.
    pub async fn extract(&self, span: &str, kind: EntityKind) -> Result<Vec<EntityMention>> {
        let entities = self.recognizer.recognize(span).await?;
        Ok(entities
            .into_iter()
            .filter_map(to_mention)
            .filter(|m| m.kind == kind)
            .collect())
    }

    /// Persons and organizations from a single recognizer call.
    pub async fn extract_all(&self, span: &str) -> Result<MentionSet> {
        let entities = self.recognizer.recognize(span).await?;
        let mut set = MentionSet::default();
        for mention in entities.into_iter().filter_map(to_mention) {
            match mention.kind {
                EntityKind::Person => set.persons.push(mention),
                EntityKind::Organization => set.organizations.push(mention),
            }
        }
        Ok(set)
    }
}

/// Keep persons and organizations whose text, with runs of whitespace
/// collapsed to one space, is longer than two characters and not purely
/// numeric.
fn to_mention(entity: RecognizedEntity) -> Option<EntityMention> {
    let kind = entity.label.kind()?;
    let text = entity.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= 2 || text.chars().all(char::is_numeric) {
        return None;
    }
    Some(EntityMention {
        text,
        kind,
        offset: entity.offset,
    })
}
