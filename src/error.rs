//! Error types for the metasearch application shell.

use metasearch_core::SearchError;

/// Top-level error type for configuration and startup.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Engine registration, search configuration or request failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// A required setting is missing.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
