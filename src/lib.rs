//! # metasearch
//!
//! Application shell around [`metasearch_core`]: reads the TOML
//! configuration, registers the configured engines once at startup and
//! exposes the ready-to-use [`Searcher`] and [`ImageProxy`].
//!
//! ```no_run
//! # async fn example() -> anyhow::Result<()> {
//! use metasearch::{config::AppConfig, SearchMode};
//! use metasearch_core::engines::StaticBackends;
//!
//! let config = AppConfig::from_file(&AppConfig::default_config_path())?;
//! let searcher = config.searcher(&StaticBackends::new())?;
//! let response = searcher.perform_search("rust", None, "", SearchMode::Web, 1).await?;
//! println!("{} results", response.results.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

pub use config::{AdapterConfig, AppConfig, EngineConfig, ImageProxyConfig};
pub use error::{AppError, Result};
pub use metasearch_core::{ImageProxy, SearchMode, SearchResponse, Searcher};
