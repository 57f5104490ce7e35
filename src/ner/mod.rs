//! Named-entity recognition capability.
//!
//! The recognizer is an injected dependency: the relation pipeline only sees
//! the [`Recognizer`] trait. Two backends ship with the crate, an HTTP client
//! for an external NER service and an offline regex heuristic.

mod heuristic;
mod http;
mod mentions;

pub use heuristic::HeuristicRecognizer;
pub use http::HttpRecognizer;
pub use mentions::{EntityMention, MentionExtractor, MentionSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::MentionCache;
use crate::config::RecognizerConfig;
use crate::error::{PanlinkError, Result};
use crate::relation::EntityKind;

/// Label attached to a recognized span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    Person,
    Organization,
    Other(String),
}

impl EntityLabel {
    /// Map a service label (`PERSON`, `ORG`, ...) onto the labels we use.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "PERSON" | "PER" => EntityLabel::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityLabel::Organization,
            other => EntityLabel::Other(other.to_string()),
        }
    }

    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            EntityLabel::Person => Some(EntityKind::Person),
            EntityLabel::Organization => Some(EntityKind::Organization),
            EntityLabel::Other(_) => None,
        }
    }
}

/// Raw recognizer output: the span text, its label and its character offset
/// within the recognized span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: EntityLabel,
    pub offset: usize,
}

/// Trait for pluggable NER backends.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Human-readable backend identifier (e.g. "http", "heuristic").
    fn name(&self) -> &str;

    /// Verify the backend can serve requests. Called once before a run.
    async fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Recognize entity mentions in `span`, in emission order.
    async fn recognize(&self, span: &str) -> Result<Vec<RecognizedEntity>>;
}

/// Build the configured recognizer backend.
pub fn build_recognizer(config: &RecognizerConfig) -> Result<Arc<dyn Recognizer>> {
    match config.provider.as_str() {
        "http" => {
            let mut recognizer = HttpRecognizer::from_config(config)?;
            if config.cache_capacity > 0 {
                recognizer = recognizer.with_cache(Arc::new(MentionCache::new(config.cache_capacity)));
            }
            Ok(Arc::new(recognizer))
        }
        "heuristic" => Ok(Arc::new(HeuristicRecognizer::new())),
        other => Err(PanlinkError::Config(format!(
            "Unknown recognizer provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(EntityLabel::from_label("PERSON"), EntityLabel::Person);
        assert_eq!(EntityLabel::from_label("per"), EntityLabel::Person);
        assert_eq!(EntityLabel::from_label("ORG"), EntityLabel::Organization);
        assert_eq!(
            EntityLabel::from_label("GPE"),
            EntityLabel::Other("GPE".to_string())
        );
        assert_eq!(EntityLabel::from_label("GPE").kind(), None);
    }

    #[test]
    fn test_build_heuristic() {
        let config = RecognizerConfig {
            provider: "heuristic".to_string(),
            ..RecognizerConfig::default()
        };
        let recognizer = build_recognizer(&config).unwrap();
        assert_eq!(recognizer.name(), "heuristic");
    }

    #[test]
    fn test_build_http() {
        let config = RecognizerConfig {
            provider: "http".to_string(),
            endpoint: Some("http://127.0.0.1:8080/ner".to_string()),
            ..RecognizerConfig::default()
        };
        let recognizer = build_recognizer(&config).unwrap();
        assert_eq!(recognizer.name(), "http");
    }

    #[test]
    fn test_build_unknown_provider() {
        let config = RecognizerConfig {
            provider: "spacy-in-process".to_string(),
            ..RecognizerConfig::default()
        };
        let err = build_recognizer(&config).err().unwrap();
        assert!(err.to_string().contains("spacy-in-process"));
    }
}
