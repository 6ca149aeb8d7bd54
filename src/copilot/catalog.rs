//! Canned-response catalog and trigger resolution
//!
//! Resolution is a deterministic lookup: the first entry, in declaration
//! order, whose trigger appears anywhere in the lower-cased question wins.
//! Triggers match inside other words too ("refunded", "prefund").

use crate::inbox::{Source, SourceKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const FALLBACK_CONTENT: &str =
    "I'm sorry, I didn't understand that. Could you please rephrase your question?";

const REFUND_CONTENT: &str = "We understand that sometimes a purchase may not meet your expectations. To help you with a refund, please provide your order ID and proof of purchase.";

/// A canned answer and the references backing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    /// Keyword selecting this answer; `None` for the fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ResponseDefinition {
    pub fn new(trigger: impl Into<String>, content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            trigger: Some(trigger.into()),
            content: content.into(),
            sources,
        }
    }

    pub fn fallback(content: impl Into<String>) -> Self {
        Self {
            trigger: None,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.trigger.is_none()
    }

    /// Body length in characters, the number of typing ticks it takes
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Who the assistant presents itself as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantProfile {
    pub name: String,
    pub avatar: String,
    pub greeting: String,
    pub instruction: String,
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self {
            name: "Fin".to_string(),
            avatar: "AI".to_string(),
            greeting: "Hi, I'm Fin AI Copilot".to_string(),
            instruction: "Ask me anything about this conversation.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("response #{0} has an empty trigger")]
    EmptyTrigger(usize),
    #[error("response #{0} has no trigger; only the fallback may omit it")]
    MissingTrigger(usize),
    #[error("response #{0} has an upper-case trigger; questions are lower-cased before matching")]
    UppercaseTrigger(usize),
}

/// File shape of an override catalog
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    assistant: AssistantProfile,
    responses: Vec<ResponseDefinition>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    fallback: Option<String>,
}

/// The full resolver universe: ordered entries plus the fallback
#[derive(Debug, Clone)]
pub struct Catalog {
    profile: AssistantProfile,
    entries: Vec<Arc<ResponseDefinition>>,
    fallback: Arc<ResponseDefinition>,
    suggestions: Vec<String>,
}

impl Catalog {
    /// Build a catalog from declared entries.
    ///
    /// Triggers are stored lower-cased so they can match the lower-cased
    /// question.
    ///
    /// # Errors
    ///
    /// Entries without a trigger or with an empty one; an empty trigger would
    /// match every question and shadow everything declared after it.
    /// Upper-case triggers can never match and are rejected too.
    pub fn new(
        profile: AssistantProfile,
        entries: Vec<ResponseDefinition>,
        fallback: ResponseDefinition,
        suggestions: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let trigger = entry.trigger.as_deref().ok_or(CatalogError::MissingTrigger(i))?;
                if trigger.trim().is_empty() {
                    return Err(CatalogError::EmptyTrigger(i));
                }
                if trigger.chars().any(char::is_uppercase) {
                    return Err(CatalogError::UppercaseTrigger(i));
                }
                Ok(Arc::new(entry))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            profile,
            entries,
            fallback: Arc::new(ResponseDefinition {
                trigger: None,
                ..fallback
            }),
            suggestions,
        })
    }

    /// The catalog shipped with the workspace
    pub fn builtin() -> Self {
        let refund = ResponseDefinition::new(
            "refund",
            REFUND_CONTENT,
            vec![
                Source::new(1, "Getting a refund", SourceKind::Document),
                Source::new(2, "Refund for an order placed by mistake", SourceKind::Policy),
                Source::new(3, "Refund for an unwanted gift", SourceKind::Policy),
            ],
        );
        Self {
            profile: AssistantProfile::default(),
            entries: vec![Arc::new(refund)],
            fallback: Arc::new(ResponseDefinition::fallback(FALLBACK_CONTENT)),
            suggestions: vec!["How do I get a refund?".to_string()],
        }
    }

    /// Parse an override catalog
    ///
    /// # Errors
    ///
    /// Malformed JSON or invalid triggers.
    pub fn from_json(data: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(data)?;
        let fallback = ResponseDefinition::fallback(
            file.fallback.unwrap_or_else(|| FALLBACK_CONTENT.to_string()),
        );
        Self::new(file.assistant, file.responses, fallback, file.suggestions)
    }

    /// Load an override catalog from disk
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Catalog::from_json`] rejects.
    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Pick the answer for a question
    pub fn resolve(&self, question: &str) -> &Arc<ResponseDefinition> {
        let question = question.to_lowercase();
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .trigger
                    .as_deref()
                    .is_some_and(|trigger| question.contains(trigger))
            })
            .unwrap_or(&self.fallback)
    }

    pub fn profile(&self) -> &AssistantProfile {
        &self.profile
    }

    pub fn entries(&self) -> impl Iterator<Item = &ResponseDefinition> {
        self.entries.iter().map(AsRef::as_ref)
    }

    pub fn fallback(&self) -> &ResponseDefinition {
        &self.fallback
    }

    /// Suggested questions offered as one-click prompts
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
