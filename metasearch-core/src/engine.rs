//! The engine contract shared by every upstream backend.
//!
//! An [`Engine`] couples immutable configuration ([`EngineInfo`]) with one
//! of three adapter families ([`Adapter`]). Adapters implement
//! [`EngineAdapter`]: they turn a [`ParsedQuery`] into a [`RequestSpec`]
//! and an upstream [`RawResponse`] into normalised [`SearchResult`]s. They
//! never perform I/O themselves; the dispatcher owns the transport.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use url::Url;

use crate::engines::{DelegatedAdapter, JsonAdapter, SelectorAdapter};
use crate::error::SearchError;
use crate::query::{ParsedQuery, QueryExtensions};
use crate::types::{SearchMode, SearchResult};

/// HTTP method used to reach an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET` with the query in the URL.
    #[default]
    Get,
    /// `POST` with the query in the body.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Cross-cutting request defaults an adapter may read or override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseParams {
    /// HTTP method configured for the engine.
    pub method: HttpMethod,
    /// Locale code handed to delegated definitions.
    pub locale: String,
    /// Resolved query language.
    pub language: String,
    /// Result page, starting at 1.
    pub page: u32,
    /// Safe-search level (0–2).
    pub safe_search: u8,
    /// Time-range restriction. Always `None` for now.
    pub time_range: Option<String>,
}

impl BaseParams {
    /// Derive the defaults for `query`. The method is `GET` until an
    /// engine stamps its own.
    pub fn for_query(query: &ParsedQuery, safe_search: u8) -> Self {
        Self {
            method: HttpMethod::Get,
            locale: query.lang().to_string(),
            language: query.lang().to_string(),
            page: query.page(),
            safe_search,
            time_range: None,
        }
    }

    /// A request to `url` with the configured method and no headers,
    /// cookies or body.
    pub fn request(&self, url: Url) -> RequestSpec {
        RequestSpec::new(self.method, url)
    }
}

/// A fully described outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL including any query string.
    pub url: Url,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Cookies sent with the request.
    pub cookies: BTreeMap<String, String>,
    /// Optional request body.
    pub body: Option<String>,
}

impl RequestSpec {
    /// A bodiless request with no extra headers or cookies.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            body: None,
        }
    }

    /// Renders the cookie map as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// An upstream response as seen by adapters.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for `status`.
    pub reason: String,
    /// Effective URL after redirects; relative links resolve against it.
    pub url: Url,
    /// Decoded response body.
    pub body: String,
    /// The request that produced this response.
    pub request: RequestSpec,
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with [`SearchError::StatusCode`] unless the status is 2xx.
    pub fn check_status(&self) -> Result<(), SearchError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SearchError::StatusCode {
                status: self.status,
                reason: self.reason.clone(),
            })
        }
    }

    /// Resolve a possibly relative link against the effective URL.
    pub fn resolve(&self, href: &str) -> Result<Url, SearchError> {
        self.url
            .join(href.trim())
            .map_err(|e| SearchError::Parse(format!("invalid link {href:?}: {e}")))
    }
}

/// Static configuration of one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineInfo {
    /// Unique registry key.
    pub name: String,
    /// Result category this engine serves.
    pub mode: SearchMode,
    /// Relative trust; scales every contribution this engine makes.
    pub weight: f64,
    /// ISO codes this engine serves. Empty means every language.
    pub supported_languages: BTreeSet<String>,
    /// Declared query capabilities.
    pub query_extensions: QueryExtensions,
    /// HTTP method used for requests.
    pub method: HttpMethod,
}

impl Default for EngineInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            mode: SearchMode::Web,
            weight: 1.0,
            supported_languages: BTreeSet::new(),
            query_extensions: QueryExtensions::NONE,
            method: HttpMethod::Get,
        }
    }
}

/// The request/response halves every adapter family implements.
///
/// Both operations are pure: they must not touch shared state or the
/// network, so they can run on any task of the dispatcher.
pub trait EngineAdapter: Send + Sync {
    /// Describe the upstream request for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the request cannot be expressed
    /// (for example an unbuildable URL).
    fn build_request(
        &self,
        info: &EngineInfo,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<RequestSpec, SearchError>;

    /// Parse a 2xx response into results, in the engine's own rank order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] on structurally invalid payloads.
    fn parse_response(
        &self,
        info: &EngineInfo,
        response: &RawResponse,
    ) -> Result<Vec<SearchResult>, SearchError>;

    /// Check the adapter against the engine configuration at construction.
    fn validate(&self, _info: &EngineInfo) -> Result<(), SearchError> {
        Ok(())
    }

    /// Capabilities the adapter provides on top of the declared ones.
    fn provided_extensions(&self) -> QueryExtensions {
        QueryExtensions::NONE
    }
}

/// The three adapter families, selected by configuration.
#[derive(Debug)]
pub enum Adapter {
    /// CSS-selector scraping of HTML pages.
    Selector(SelectorAdapter),
    /// JSONPath extraction from JSON documents.
    Json(JsonAdapter),
    /// A definition supplied by an external backend registry.
    Delegated(DelegatedAdapter),
}

impl Adapter {
    fn inner(&self) -> &dyn EngineAdapter {
        match self {
            Self::Selector(a) => a,
            Self::Json(a) => a,
            Self::Delegated(a) => a,
        }
    }

    /// Short family name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Selector(_) => "selector",
            Self::Json(_) => "json",
            Self::Delegated(_) => "delegated",
        }
    }
}

/// One configured upstream backend plus its adapter.
///
/// Immutable after construction. The registry assigns each engine its
/// registration position, which the ranker uses for stable tie-breaking.
#[derive(Debug)]
pub struct Engine {
    info: EngineInfo,
    adapter: Adapter,
    position: usize,
}

impl Engine {
    /// Validate and assemble an engine.
    ///
    /// Capabilities the adapter provides (such as delegated paging) are
    /// merged into the declared extension set.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an empty name, a non-positive or
    /// non-finite weight, or an adapter that rejects the configuration
    /// (for example an image engine without an image field).
    pub fn new(mut info: EngineInfo, adapter: Adapter) -> Result<Self, SearchError> {
        if info.name.trim().is_empty() {
            return Err(SearchError::Config("engine name must not be empty".into()));
        }
        if !(info.weight.is_finite() && info.weight > 0.0) {
            return Err(SearchError::Config(format!(
                "engine {}: weight must be a positive number",
                info.name
            )));
        }
        adapter.inner().validate(&info)?;
        info.query_extensions |= adapter.inner().provided_extensions();
        info.supported_languages = info
            .supported_languages
            .iter()
            .map(|code| code.trim().to_ascii_lowercase())
            .collect();

        Ok(Self {
            info,
            adapter,
            position: 0,
        })
    }

    pub(crate) fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Unique engine name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Served result category.
    pub fn mode(&self) -> SearchMode {
        self.info.mode
    }

    /// Ranking weight.
    pub fn weight(&self) -> f64 {
        self.info.weight
    }

    /// Effective capability set (declared plus adapter-provided).
    pub fn query_extensions(&self) -> QueryExtensions {
        self.info.query_extensions
    }

    /// Full static configuration.
    pub fn info(&self) -> &EngineInfo {
        &self.info
    }

    /// The adapter family backing this engine.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Registration position, 0 for engines outside a registry.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` if this engine serves `lang`.
    pub fn supports_language(&self, lang: &str) -> bool {
        self.info.supported_languages.is_empty() || self.info.supported_languages.contains(lang)
    }

    /// Describe the upstream request for `query`. See [`EngineAdapter::build_request`].
    ///
    /// The adapter sees `base` with this engine's HTTP method.
    pub fn build_request(
        &self,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<RequestSpec, SearchError> {
        let base = BaseParams {
            method: self.info.method,
            ..base.clone()
        };
        self.adapter.inner().build_request(&self.info, query, &base)
    }

    /// Parse a response. Non-2xx statuses are rejected before the adapter runs.
    pub fn parse_response(&self, response: &RawResponse) -> Result<Vec<SearchResult>, SearchError> {
        response.check_status()?;
        self.adapter.inner().parse_response(&self.info, response)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.name)
    }
}
