//! Per-identifier resolution state machine.
//!
//! `START -> PATTERN_TRY -> NARROW_NER_TRY -> WIDE_NER_TRY -> RESOLVED | UNRESOLVED`
//!
//! Escalation only moves forward and the window radius never shrinks.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use super::{
    locate_window, resolve_nearest, scan_identifiers, EntityKind, Identifier, PatternExtractor,
    RelationRecord,
};
use crate::config::ExtractionConfig;
use crate::error::{PanlinkError, Result};
use crate::ner::{MentionExtractor, Recognizer};

/// Knobs for the resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub id_marker: String,
    pub narrow_radius: usize,
    pub wide_radius: usize,
    pub concurrency: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            id_marker: super::IDENTIFIER_KIND.to_string(),
            narrow_radius: 200,
            wide_radius: 400,
            concurrency: 4,
        }
    }
}

impl From<&ExtractionConfig> for ExtractionSettings {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            id_marker: config.id_marker.clone(),
            narrow_radius: config.narrow_radius,
            wide_radius: config.wide_radius,
            concurrency: config.concurrency,
        }
    }
}

/// Stage that produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStage {
    Pattern,
    NarrowWindow,
    WideWindow,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStage::Pattern => "pattern",
            ResolutionStage::NarrowWindow => "narrow_window",
            ResolutionStage::WideWindow => "wide_window",
        }
    }
}

/// Outcome for one identifier: the emitted record plus the stage that
/// resolved it (`None` when unresolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: RelationRecord,
    pub stage: Option<ResolutionStage>,
}

enum State {
    PatternTry,
    NerTry(ResolutionStage),
    Resolved(String, EntityKind, ResolutionStage),
    Unresolved,
}

/// Links every identifier in a text to its most probable owner.
///
/// Holds the recognizer as an injected dependency. Each identifier is
/// resolved independently against the shared, read-only text.
pub struct RelationExtractor {
    patterns: PatternExtractor,
    mentions: MentionExtractor,
    settings: ExtractionSettings,
}

impl RelationExtractor {
    /// Build an extractor without probing the recognizer.
    pub fn new(recognizer: Arc<dyn Recognizer>, settings: ExtractionSettings) -> Self {
        Self {
            patterns: PatternExtractor::new(&settings.id_marker),
            mentions: MentionExtractor::new(recognizer),
            settings,
        }
    }

    /// Build an extractor after confirming the recognizer is ready.
    ///
    /// A recognizer that cannot serve requests is fatal for the run.
    pub async fn initialize(
        recognizer: Arc<dyn Recognizer>,
        settings: ExtractionSettings,
    ) -> Result<Self> {
        recognizer.check_ready().await.map_err(|e| match e {
            PanlinkError::RecognizerUnavailable(_) => e,
            other => PanlinkError::RecognizerUnavailable(other.to_string()),
        })?;
        log::info!("Recognizer '{}' initialised", recognizer.name());
        Ok(Self::new(recognizer, settings))
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Relation records for every unique identifier in `text`, in discovery order.
    pub async fn extract_relations(&self, text: &str) -> Result<Vec<RelationRecord>> {
        Ok(self
            .resolve_all(text)
            .await?
            .into_iter()
            .map(|r| r.record)
            .collect())
    }

    /// Like [`extract_relations`](Self::extract_relations) but keeps the
    /// resolving stage of each record.
    pub async fn resolve_all(&self, text: &str) -> Result<Vec<Resolution>> {
        let identifiers = scan_identifiers(text);
        if identifiers.is_empty() {
            log::info!("No identifiers found");
            return Ok(Vec::new());
        }
        log::info!("Resolving {} identifier(s)", identifiers.len());

        // `buffered` yields results in input order regardless of completion order.
        stream::iter(identifiers)
            .map(|id| async move { self.resolve(text, id).await })
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await
    }

    /// Run the escalation state machine for a single identifier.
    pub async fn resolve(&self, text: &str, id: Identifier) -> Result<Resolution> {
        let mut state = State::PatternTry;

        loop {
            state = match state {
                State::PatternTry => match self.patterns.extract(text, &id) {
                    Some((name, kind)) => State::Resolved(name, kind, ResolutionStage::Pattern),
                    None => State::NerTry(ResolutionStage::NarrowWindow),
                },
                State::NerTry(stage) => {
                    let radius = match stage {
                        ResolutionStage::WideWindow => self.settings.wide_radius,
                        _ => self.settings.narrow_radius,
                    };
                    match self.resolve_in_window(text, &id, radius).await? {
                        Some((name, kind)) => State::Resolved(name, kind, stage),
                        None if stage == ResolutionStage::NarrowWindow => {
                            State::NerTry(ResolutionStage::WideWindow)
                        }
                        None => State::Unresolved,
                    }
                }
                State::Resolved(name, kind, stage) => {
                    log::debug!("{} -> {} ({}) via {}", id, name, kind, stage.as_str());
                    return Ok(Resolution {
                        record: RelationRecord::resolved(id, name, kind),
                        stage: Some(stage),
                    });
                }
                State::Unresolved => {
                    log::warn!("Could not find related entity for {}", id);
                    return Ok(Resolution {
                        record: RelationRecord::unresolved(id),
                        stage: None,
                    });
                }
            };
        }
    }

    /// One recognizer-backed attempt: window, mentions, nearest mention.
    async fn resolve_in_window(
        &self,
        text: &str,
        id: &Identifier,
        radius: usize,
    ) -> Result<Option<(String, EntityKind)>> {
        let Some(window) = locate_window(text, id, radius) else {
            log::debug!("{} not located in text, skipping radius {}", id, radius);
            return Ok(None);
        };

        let mentions = self.mentions.extract_all(&window.text).await?;
        if mentions.is_empty() {
            return Ok(None);
        }

        Ok(resolve_nearest(
            &window,
            &mentions.person_names(),
            &mentions.organization_names(),
        ))
    }
}
