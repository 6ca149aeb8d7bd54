//! Workspace configuration
//!
//! Read from the environment at startup; every value has a default so an
//! empty environment yields the stock workspace.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const TYPING_TICK_VAR: &str = "INBOX_TYPING_TICK_MS";
pub const RESPONSE_DELAY_VAR: &str = "INBOX_RESPONSE_DELAY_MS";
pub const MAX_VISIBLE_MESSAGES_VAR: &str = "INBOX_MAX_VISIBLE_MESSAGES";
pub const SEED_PATH_VAR: &str = "INBOX_SEED_PATH";
pub const CATALOG_PATH_VAR: &str = "INBOX_CATALOG_PATH";

const DEFAULT_TYPING_TICK: Duration = Duration::from_millis(30);
const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_VISIBLE_MESSAGES: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Tunables of the simulated workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Delay between revealed characters
    pub typing_tick: Duration,
    /// Delay before typing starts and before the answer is committed
    pub response_delay: Duration,
    /// Most copilot entries the panel shows at once
    pub max_visible_messages: usize,
    /// Conversation seed file; the bundled contacts when unset
    pub seed_path: Option<PathBuf>,
    /// Response catalog file; the built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            typing_tick: DEFAULT_TYPING_TICK,
            response_delay: DEFAULT_RESPONSE_DELAY,
            max_visible_messages: DEFAULT_MAX_VISIBLE_MESSAGES,
            seed_path: None,
            catalog_path: None,
        }
    }
}

impl WorkspaceConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Malformed numeric variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Malformed numeric variables, or a zero visible-message cap.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let typing_tick = parse_number(&lookup, TYPING_TICK_VAR)?
            .map_or(defaults.typing_tick, Duration::from_millis);
        let response_delay = parse_number(&lookup, RESPONSE_DELAY_VAR)?
            .map_or(defaults.response_delay, Duration::from_millis);
        let max_visible_messages = match parse_number(&lookup, MAX_VISIBLE_MESSAGES_VAR)? {
            Some(0) => return Err(ConfigError::Zero(MAX_VISIBLE_MESSAGES_VAR)),
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
            None => defaults.max_visible_messages,
        };

        Ok(Self {
            typing_tick,
            response_delay,
            max_visible_messages,
            seed_path: non_empty(&lookup, SEED_PATH_VAR).map(PathBuf::from),
            catalog_path: non_empty(&lookup, CATALOG_PATH_VAR).map(PathBuf::from),
        })
    }

    #[must_use]
    pub fn with_typing_tick(mut self, typing_tick: Duration) -> Self {
        self.typing_tick = typing_tick;
        self
    }

    #[must_use]
    pub fn with_response_delay(mut self, response_delay: Duration) -> Self {
        self.response_delay = response_delay;
        self
    }

    #[must_use]
    pub fn with_max_visible_messages(mut self, max: usize) -> Self {
        self.max_visible_messages = max.max(1);
        self
    }

    #[must_use]
    pub fn with_seed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    non_empty(lookup, var)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { var, value })
        })
        .transpose()
}
