//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls the shared transport (timeout, connection
//! bound, User-Agent) and the cross-cutting request defaults handed to
//! every engine adapter.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::lang;

/// Highest safe-search level engines understand (0 = off, 1 = moderate, 2 = strict).
pub const MAX_SAFE_SEARCH: u8 = 2;

/// Configuration for the dispatcher and its shared HTTP transport.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-engine request timeout in seconds. Timeouts are reported, never retried.
    pub timeout_seconds: u64,
    /// Maximum number of concurrent outbound connections across all engines.
    /// Excess engine requests wait for a free slot.
    pub max_connections: usize,
    /// Safe-search level passed to engines (0–2).
    pub safe_search: u8,
    /// Language used when neither the request nor the classifier yields one.
    pub default_language: String,
    /// Custom User-Agent string. If `None`, one of a built-in list
    /// of realistic browser User-Agents is chosen.
    pub user_agent: Option<String>,
    /// Truncate the ranked list to this many entries. `None` keeps everything.
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            max_connections: 10,
            safe_search: MAX_SAFE_SEARCH,
            default_language: lang::DEFAULT_LANGUAGE.to_string(),
            user_agent: None,
            max_results: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - `max_connections` must be greater than 0
    /// - `safe_search` must be at most [`MAX_SAFE_SEARCH`]
    /// - `default_language` must be a 2–3 letter language code
    /// - `max_results`, when set, must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(SearchError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.safe_search > MAX_SAFE_SEARCH {
            return Err(SearchError::Config(format!(
                "safe_search must be between 0 and {MAX_SAFE_SEARCH}"
            )));
        }
        if lang::normalize_language_code(&self.default_language).is_none() {
            return Err(SearchError::Config(
                "default_language must be an ISO 639 language code".into(),
            ));
        }
        if self.max_results == Some(0) {
            return Err(SearchError::Config(
                "max_results must be greater than 0 when set".into(),
            ));
        }
        Ok(())
    }
}
