//! # metasearch-core
//!
//! Query-side core of a metasearch aggregator: parse a raw query, pick the
//! engines able to answer it, query them concurrently and fuse their
//! rankings into one list.
//!
//! ## Design
//!
//! - Engines are configured, not coded: CSS-selector scrapers, JSONPath
//!   extractors, or definitions delegated to an external backend registry
//! - Capability filtering: `site:`, quoted phrases and paging are only sent
//!   to engines that declare support for them
//! - Bounded concurrency over one shared HTTP client, with an independent
//!   timeout per engine
//! - Graceful degradation: failing engines are reported per engine and
//!   never hide the results of the others
//! - Reciprocal-rank fusion, deterministic regardless of completion order
//!
//! ## Security
//!
//! - Image-proxy links are signed with a keyed BLAKE3 digest
//! - Search queries are logged only at trace level
//! - No network listeners; routing is left to the embedding application

pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod image_proxy;
pub mod lang;
pub mod metrics;
pub mod orchestrator;
pub mod params;
pub mod query;
pub mod registry;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use config::SearchConfig;
pub use engine::{Adapter, Engine, EngineAdapter, EngineInfo, HttpMethod};
pub use error::{Result, SearchError};
pub use image_proxy::ImageProxy;
pub use lang::LanguageClassifier;
pub use metrics::{ChannelMetrics, MetricEvent, MetricsSink, TracingMetrics};
pub use params::SearchParams;
pub use query::{Extension, ParsedQuery, QueryExtensions, QueryParser};
pub use registry::{EngineRegistry, RegistryBuilder};
pub use types::{RankedResult, SearchMode, SearchResult};

use orchestrator::Dispatcher;

/// Outcome of one search request.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// The parsed query that was dispatched.
    pub query: ParsedQuery,
    /// Fused results, best first.
    pub results: Vec<RankedResult>,
    /// Failures of individual engines, keyed by engine name.
    pub errors: BTreeMap<String, SearchError>,
}

/// The search entry point: registry, parser and dispatcher together.
#[derive(Debug, Clone)]
pub struct Searcher {
    registry: Arc<EngineRegistry>,
    parser: QueryParser,
    dispatcher: Dispatcher,
    max_results: Option<usize>,
}

impl Searcher {
    /// Create a searcher over `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(registry: EngineRegistry, config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            registry: Arc::new(registry),
            parser: QueryParser::default().with_default_language(&config.default_language),
            dispatcher: Dispatcher::new(config)?,
            max_results: config.max_results,
        })
    }

    /// Resolve undetermined query languages with `classifier`.
    pub fn with_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        let default = self.parser.default_language().to_string();
        self.parser = QueryParser::new(classifier).with_default_language(&default);
        self
    }

    /// Report per-engine outcomes to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics);
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_timeout(timeout);
        self
    }

    /// The engines this searcher dispatches to.
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Parse, dispatch and rank one search.
    ///
    /// `lang` is an explicit language choice; `accept_language` is the
    /// client's `Accept-Language` header (may be empty).
    ///
    /// # Errors
    ///
    /// Only request-shape errors ([`SearchError::EmptyQuery`],
    /// [`SearchError::InvalidPage`]) are returned; engine failures are
    /// listed in [`SearchResponse::errors`]. A query no engine is eligible
    /// for yields an empty response.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example(searcher: metasearch_core::Searcher) -> metasearch_core::Result<()> {
    /// use metasearch_core::SearchMode;
    ///
    /// let response = searcher
    ///     .perform_search("rust \"async io\"", None, "en-US,en;q=0.8", SearchMode::Web, 1)
    ///     .await?;
    /// for hit in &response.results {
    ///     println!("{:.2} {}", hit.score, hit.result.url());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn perform_search(
        &self,
        raw: &str,
        lang: Option<&str>,
        accept_language: &str,
        mode: SearchMode,
        page: u32,
    ) -> Result<SearchResponse> {
        let query = self.parser.parse_request(raw, lang, accept_language, mode, page)?;

        let engines = self.registry.eligible_engines(&query);
        if engines.is_empty() {
            tracing::debug!(mode = %query.mode(), lang = query.lang(), "no eligible engines");
            return Ok(SearchResponse {
                query,
                results: Vec::new(),
                errors: BTreeMap::new(),
            });
        }

        let outcome = self.dispatcher.dispatch(&query, &engines).await;
        let results = orchestrator::rank(&outcome.results, self.max_results);
        Ok(SearchResponse {
            query,
            results,
            errors: outcome.errors,
        })
    }

    /// [`Searcher::perform_search`] over already validated parameters.
    ///
    /// # Errors
    ///
    /// Same as [`Searcher::perform_search`].
    pub async fn search(
        &self,
        params: &SearchParams,
        lang: Option<&str>,
        accept_language: &str,
    ) -> Result<SearchResponse> {
        self.perform_search(&params.query, lang, accept_language, params.mode, params.page)
            .await
    }
}
