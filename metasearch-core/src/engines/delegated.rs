//! Delegated adapter over an external backend-definition registry.
//!
//! Well-known commercial engines are described by definitions maintained
//! outside this crate. A definition builds the request and parses the
//! response into its own loose [`NativeResult`] records; this adapter only
//! maps those records into [`SearchResult`] and surfaces the definition's
//! paging capability.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::{BaseParams, EngineAdapter, EngineInfo, RawResponse, RequestSpec};
use crate::error::SearchError;
use crate::query::{ParsedQuery, QueryExtensions};
use crate::types::{SearchMode, SearchResult};

/// Parameters handed to a [`BackendDefinition`] when building a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendParams {
    /// Result category requested from the backend.
    pub mode: SearchMode,
    /// Cross-cutting defaults, including the engine's HTTP method, which
    /// the definition may override.
    pub base: BaseParams,
}

/// A result record in the backend registry's native shape.
///
/// Every field is optional; which ones are set decides the result variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeResult {
    /// Target URL.
    pub url: Option<String>,
    /// Title of a web or image hit.
    pub title: Option<String>,
    /// Snippet text.
    pub content: Option<String>,
    /// Direct answer text.
    pub answer: Option<String>,
    /// Full-size image source.
    pub img_src: Option<String>,
    /// Thumbnail source, preferred over `img_src` when present.
    pub thumbnail_src: Option<String>,
    /// Estimated total hit count (a metadata record, not a result).
    pub number_of_results: Option<u64>,
    /// Query suggestion (a metadata record, not a result).
    pub suggestion: Option<String>,
}

/// One named definition from the external registry.
pub trait BackendDefinition: Send + Sync {
    /// Registry name of this definition.
    fn name(&self) -> &str;

    /// Whether the backend can serve pages beyond the first.
    fn supports_paging(&self) -> bool;

    /// Build the upstream request for the rendered query string.
    fn request(&self, query: &str, params: &BackendParams) -> Result<RequestSpec, SearchError>;

    /// Parse a non-empty 2xx response into native records.
    fn response(&self, response: &RawResponse) -> Result<Vec<NativeResult>, SearchError>;
}

/// Looks up backend definitions by name.
pub trait BackendRegistry: Send + Sync {
    /// Returns the definition registered as `name`, if any.
    fn load(&self, name: &str) -> Option<Arc<dyn BackendDefinition>>;
}

/// An in-memory [`BackendRegistry`] populated at startup.
#[derive(Default, Clone)]
pub struct StaticBackends {
    definitions: HashMap<String, Arc<dyn BackendDefinition>>,
}

impl StaticBackends {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under its own name, replacing any earlier one.
    pub fn register(&mut self, definition: Arc<dyn BackendDefinition>) {
        self.definitions
            .insert(definition.name().to_string(), definition);
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Debug for StaticBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.definitions.keys().collect();
        names.sort();
        f.debug_struct("StaticBackends").field("definitions", &names).finish()
    }
}

impl BackendRegistry for StaticBackends {
    fn load(&self, name: &str) -> Option<Arc<dyn BackendDefinition>> {
        self.definitions.get(name).cloned()
    }
}

/// Adapts a [`BackendDefinition`] to the engine contract.
pub struct DelegatedAdapter {
    definition: Arc<dyn BackendDefinition>,
}

impl fmt::Debug for DelegatedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedAdapter")
            .field("definition", &self.definition.name())
            .finish()
    }
}

impl DelegatedAdapter {
    /// Wrap a definition directly.
    pub fn new(definition: Arc<dyn BackendDefinition>) -> Self {
        Self { definition }
    }

    /// Load the definition called `name` from `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the registry has no such definition.
    pub fn load(registry: &dyn BackendRegistry, name: &str) -> Result<Self, SearchError> {
        registry
            .load(name)
            .map(Self::new)
            .ok_or_else(|| SearchError::Config(format!("backend definition {name:?} not found")))
    }
}

impl EngineAdapter for DelegatedAdapter {
    fn build_request(
        &self,
        info: &EngineInfo,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<RequestSpec, SearchError> {
        let params = BackendParams {
            mode: info.mode,
            base: base.clone(),
        };
        self.definition.request(&query.to_string(), &params)
    }

    fn parse_response(
        &self,
        info: &EngineInfo,
        response: &RawResponse,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for record in self.definition.response(response)? {
            if let Some(result) = adapt(record, response)? {
                results.push(result);
            }
        }

        tracing::debug!(engine = %info.name, count = results.len(), "delegated results adapted");
        Ok(results)
    }

    fn provided_extensions(&self) -> QueryExtensions {
        if self.definition.supports_paging() {
            QueryExtensions::PAGING
        } else {
            QueryExtensions::NONE
        }
    }
}

/// Map one native record. Metadata records and records without a URL
/// yield `None`.
fn adapt(record: NativeResult, response: &RawResponse) -> Result<Option<SearchResult>, SearchError> {
    if record.number_of_results.is_some() || record.suggestion.is_some() {
        return Ok(None);
    }
    let Some(link) = record.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let url = response.resolve(link)?;

    if let Some(answer) = &record.answer {
        return SearchResult::answer(answer, url).map(Some);
    }

    let title = record.title.as_deref().unwrap_or_default();

    let non_empty = |s: &&str| !s.trim().is_empty();
    let source = record
        .thumbnail_src
        .as_deref()
        .filter(non_empty)
        .or(record.img_src.as_deref().filter(non_empty));
    if let Some(src) = source {
        let image_url = response.resolve(&unescape_html(src))?;
        return SearchResult::image(title, url, record.content.as_deref(), image_url).map(Some);
    }

    SearchResult::web(title, url, record.content.as_deref()).map(Some)
}

/// Decode HTML character references (`&amp;`, `&#38;`, `&quot;`, ...).
/// Text that could parse as markup is left untouched.
fn unescape_html(raw: &str) -> String {
    if !raw.contains('&') || raw.contains('<') {
        return raw.to_string();
    }
    Html::parse_fragment(raw).root_element().text().collect()
}
