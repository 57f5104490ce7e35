//! Identifier-to-entity relation extraction.
//!
//! Scans PAN identifiers out of document text and links each one to the
//! person or organization that owns it: syntactic templates first, then
//! recognizer mentions ranked by proximity in a narrow and a wide window.

mod orchestrator;
mod patterns;
mod proximity;
mod scanner;
mod window;

pub use orchestrator::{ExtractionSettings, RelationExtractor, Resolution, ResolutionStage};
pub use patterns::PatternExtractor;
pub use proximity::resolve_nearest;
pub use scanner::scan_identifiers;
pub use window::{locate_window, ContextWindow};

pub(crate) use window::find_ignore_case;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier kind written to the `Entity_Type` column.
pub const IDENTIFIER_KIND: &str = "PAN";

/// Relation label written to the `Relation` column.
pub const RELATION_LABEL: &str = "PAN_Of";

/// Related entity placeholder for identifiers nobody could be linked to.
pub const NOT_FOUND: &str = "Not Found";

/// A PAN identifier: five letters, four digits, one letter, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Normalize and validate a candidate. Returns `None` when the shape is wrong.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != 10 {
            return None;
        }
        let well_formed = bytes[..5].iter().all(u8::is_ascii_uppercase)
            && bytes[5..9].iter().all(u8::is_ascii_digit)
            && bytes[9].is_ascii_uppercase();
        well_formed.then_some(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Identifier::parse(&value).ok_or_else(|| format!("malformed identifier: {}", value))
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Entity kinds the recognizer path and the templates can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Organization,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "Person",
            EntityKind::Organization => "Organization",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the entity on the far side of a relation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelatedEntityType {
    Person,
    Organization,
    Unknown,
}

impl RelatedEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelatedEntityType::Person => "Person",
            RelatedEntityType::Organization => "Organization",
            RelatedEntityType::Unknown => "Unknown",
        }
    }
}

impl From<EntityKind> for RelatedEntityType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Person => RelatedEntityType::Person,
            EntityKind::Organization => RelatedEntityType::Organization,
        }
    }
}

impl fmt::Display for RelatedEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the relation table (identifier --PAN_Of--> entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Identifier kind, always `PAN`.
    pub entity_type: String,
    /// The identifier itself.
    pub value: Identifier,
    /// Relation label, always `PAN_Of`.
    pub relation: String,
    pub related_entity_type: RelatedEntityType,
    /// Owner name, or `Not Found`.
    pub related_entity: String,
}

impl RelationRecord {
    pub fn resolved(value: Identifier, name: String, kind: EntityKind) -> Self {
        Self {
            entity_type: IDENTIFIER_KIND.to_string(),
            value,
            relation: RELATION_LABEL.to_string(),
            related_entity_type: kind.into(),
            related_entity: name,
        }
    }

    pub fn unresolved(value: Identifier) -> Self {
        Self {
            entity_type: IDENTIFIER_KIND.to_string(),
            value,
            relation: RELATION_LABEL.to_string(),
            related_entity_type: RelatedEntityType::Unknown,
            related_entity: NOT_FOUND.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.related_entity_type != RelatedEntityType::Unknown
    }
}
