//! Selector-based HTML adapter.
//!
//! Configured with one result-container selector and one selector per
//! field. A field selector is a CSS selector optionally followed by
//! `@attribute`; without an attribute the element's text is used. An
//! empty CSS part (`"@href"`) addresses the container itself.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::custom::{self, CompiledRequest, RawFields, RequestTemplate};
use crate::engine::{BaseParams, EngineAdapter, EngineInfo, RawResponse, RequestSpec};
use crate::error::SearchError;
use crate::query::{ParsedQuery, QueryExtensions};
use crate::types::{SearchMode, SearchResult};

/// Configuration of a [`SelectorAdapter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorAdapterConfig {
    /// How the upstream request is built.
    #[serde(flatten)]
    pub request: RequestTemplate,
    /// Selects one node per result.
    pub result_selector: String,
    /// Title field, relative to the result node.
    pub title_selector: String,
    /// Link field; reads `href` unless another attribute is given.
    pub url_selector: String,
    /// Optional snippet field.
    pub text_selector: Option<String>,
    /// Image source field; reads `src` unless another attribute is given.
    /// Required for image-mode engines.
    pub image_selector: Option<String>,
}

#[derive(Debug)]
struct FieldSelector {
    selector: Option<Selector>,
    attr: Option<String>,
}

impl FieldSelector {
    fn parse(spec: &str, default_attr: Option<&str>) -> Result<Self, SearchError> {
        let (css, attr) = match spec.rsplit_once('@') {
            Some((css, attr)) => (css.trim(), Some(attr.trim().to_string())),
            None => (spec.trim(), default_attr.map(str::to_string)),
        };
        let selector = if css.is_empty() {
            None
        } else {
            Some(compile(css)?)
        };
        Ok(Self {
            selector,
            attr: attr.filter(|a| !a.is_empty()),
        })
    }

    /// First match only; blank values count as absent.
    fn extract(&self, root: ElementRef<'_>) -> Option<String> {
        let target = match &self.selector {
            Some(sel) => root.select(sel).next()?,
            None => root,
        };
        let value = match &self.attr {
            Some(attr) => target.value().attr(attr)?.trim().to_string(),
            None => target
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        };
        (!value.is_empty()).then_some(value)
    }
}

fn compile(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Config(format!("invalid selector {css:?}: {e:?}")))
}

/// Scrapes HTML result pages with CSS selectors.
#[derive(Debug)]
pub struct SelectorAdapter {
    request: CompiledRequest,
    results: Selector,
    title: FieldSelector,
    url: FieldSelector,
    text: Option<FieldSelector>,
    image: Option<FieldSelector>,
}

impl SelectorAdapter {
    /// Compile every selector up front.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid URL or selector, or
    /// an empty result/title/link selector.
    pub fn new(config: SelectorAdapterConfig) -> Result<Self, SearchError> {
        if config.result_selector.trim().is_empty() {
            return Err(SearchError::Config("result_selector must not be empty".into()));
        }
        if config.title_selector.trim().is_empty() || config.url_selector.trim().is_empty() {
            return Err(SearchError::Config(
                "title_selector and url_selector must not be empty".into(),
            ));
        }

        Ok(Self {
            request: CompiledRequest::compile(&config.request)?,
            results: compile(config.result_selector.trim())?,
            title: FieldSelector::parse(&config.title_selector, None)?,
            url: FieldSelector::parse(&config.url_selector, Some("href"))?,
            text: config
                .text_selector
                .as_deref()
                .map(|s| FieldSelector::parse(s, None))
                .transpose()?,
            image: config
                .image_selector
                .as_deref()
                .map(|s| FieldSelector::parse(s, Some("src")))
                .transpose()?,
        })
    }
}

impl EngineAdapter for SelectorAdapter {
    fn build_request(
        &self,
        info: &EngineInfo,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<RequestSpec, SearchError> {
        self.request.build(info, query, base)
    }

    fn parse_response(
        &self,
        info: &EngineInfo,
        response: &RawResponse,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let document = Html::parse_document(&response.body);

        let results = document
            .select(&self.results)
            .map(|node| {
                let fields = RawFields {
                    title: self.title.extract(node),
                    link: self.url.extract(node),
                    text: self.text.as_ref().and_then(|f| f.extract(node)),
                    image: self.image.as_ref().and_then(|f| f.extract(node)),
                };
                custom::assemble(info.mode, response, fields)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(engine = %info.name, count = results.len(), "selector results parsed");
        Ok(results)
    }

    fn validate(&self, info: &EngineInfo) -> Result<(), SearchError> {
        if info.mode == SearchMode::Images && self.image.is_none() {
            return Err(SearchError::Config(format!(
                "engine {}: image_selector is required for image search",
                info.name
            )));
        }
        Ok(())
    }

    fn provided_extensions(&self) -> QueryExtensions {
        self.request.extensions()
    }
}
