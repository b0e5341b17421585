//! Error types for the metasearch-core crate.
//!
//! Request-shape errors are rejected before any engine is contacted.
//! Per-engine errors are caught by the dispatcher and reported in the
//! per-engine error map. Configuration errors are fatal at startup.
//! No signing keys or other secrets appear in error messages.

/// Errors that can occur while parsing, dispatching or ranking a search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Nothing searchable remained after trimming and directive extraction.
    #[error("the search term is empty")]
    EmptyQuery,

    /// The requested search mode is not one of the supported values.
    #[error("invalid search mode: {0}")]
    InvalidMode(String),

    /// The requested page is missing, not a number, or below 1.
    #[error("invalid page number: {0}")]
    InvalidPage(String),

    /// An engine answered with a status outside the 2xx range.
    #[error("{status} {reason}")]
    StatusCode {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Canonical reason phrase for the status, if known.
        reason: String,
    },

    /// An engine response did not match its adapter's expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Connecting to or reading from an engine failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// An engine did not answer within the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// An engine definition or search configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Returns `true` for errors that reject the request before dispatch.
    pub fn is_request_shape(&self) -> bool {
        matches!(
            self,
            Self::EmptyQuery | Self::InvalidMode(_) | Self::InvalidPage(_)
        )
    }

    /// Returns `true` for errors attributable to a single engine.
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Self::StatusCode { .. } | Self::Parse(_) | Self::Transport(_) | Self::Timeout(_)
        )
    }
}

/// Convenience type alias for metasearch-core results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_empty_query() {
        assert_eq!(SearchError::EmptyQuery.to_string(), "the search term is empty");
    }

    #[test]
    fn display_status_code() {
        let err = SearchError::StatusCode {
            status: 429,
            reason: "Too Many Requests".into(),
        };
        assert_eq!(err.to_string(), "429 Too Many Requests");
    }

    #[test]
    fn display_parse() {
        let err = SearchError::Parse("missing title".into());
        assert_eq!(err.to_string(), "parse error: missing title");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("duplicate engine name".into());
        assert_eq!(err.to_string(), "config error: duplicate engine name");
    }

    #[test]
    fn request_shape_classification() {
        assert!(SearchError::EmptyQuery.is_request_shape());
        assert!(SearchError::InvalidMode("video".into()).is_request_shape());
        assert!(SearchError::InvalidPage("0".into()).is_request_shape());
        assert!(!SearchError::Parse("x".into()).is_request_shape());
        assert!(!SearchError::Config("x".into()).is_request_shape());
    }

    #[test]
    fn engine_failure_classification() {
        assert!(SearchError::Timeout("5s".into()).is_engine_failure());
        assert!(SearchError::Transport("refused".into()).is_engine_failure());
        assert!(!SearchError::EmptyQuery.is_engine_failure());
        assert!(!SearchError::Config("x".into()).is_engine_failure());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
