//! Path-based JSON adapter.
//!
//! Paths are JSONPath queries (RFC 9535). The result path selects one node
//! per result and may use wildcards and filter selectors; every field path
//! is evaluated with one selected node as its root, and the first node it
//! matches is the field value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json_path::JsonPath;

use super::custom::{self, CompiledRequest, RawFields, RequestTemplate};
use crate::engine::{BaseParams, EngineAdapter, EngineInfo, RawResponse, RequestSpec};
use crate::error::SearchError;
use crate::query::{ParsedQuery, QueryExtensions};
use crate::types::{SearchMode, SearchResult};

/// A JSONPath query such as `$.results[*]` or `$.info.title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Wrap a query string. Validity is checked by [`JsonAdapter::new`].
    pub fn new(query: &str) -> Self {
        Self(query.to_string())
    }

    /// The raw query text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn compile(&self) -> Result<JsonPath, SearchError> {
        JsonPath::parse(&self.0)
            .map_err(|e| SearchError::Config(format!("invalid json path {:?}: {e}", self.0)))
    }
}

/// Scalars of the first match are rendered as strings; null, arrays,
/// objects and blank strings count as absent.
fn first_text(path: &JsonPath, root: &Value) -> Option<String> {
    let value = match path.query(root).first()? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Configuration of a [`JsonAdapter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonAdapterConfig {
    /// How the upstream request is built.
    #[serde(flatten)]
    pub request: RequestTemplate,
    /// Selects the result nodes.
    pub result_path: FieldPath,
    /// Title field, relative to a result.
    pub title_path: FieldPath,
    /// Link field, relative to a result.
    pub url_path: FieldPath,
    /// Optional snippet field.
    pub text_path: Option<FieldPath>,
    /// Image source field. Required for image-mode engines.
    pub image_path: Option<FieldPath>,
}

/// Extracts results from JSON APIs with JSONPath queries.
#[derive(Debug)]
pub struct JsonAdapter {
    request: CompiledRequest,
    results: JsonPath,
    title: JsonPath,
    url: JsonPath,
    text: Option<JsonPath>,
    image: Option<JsonPath>,
}

impl JsonAdapter {
    /// Compile the request template and every path.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid URL or a path that is
    /// not a valid JSONPath query.
    pub fn new(config: JsonAdapterConfig) -> Result<Self, SearchError> {
        Ok(Self {
            request: CompiledRequest::compile(&config.request)?,
            results: config.result_path.compile()?,
            title: config.title_path.compile()?,
            url: config.url_path.compile()?,
            text: config.text_path.as_ref().map(FieldPath::compile).transpose()?,
            image: config.image_path.as_ref().map(FieldPath::compile).transpose()?,
        })
    }
}

impl EngineAdapter for JsonAdapter {
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
        let root: Value = serde_json::from_str(&response.body)
            .map_err(|e| SearchError::Parse(format!("invalid JSON: {e}")))?;

        let results = self
            .results
            .query(&root)
            .iter()
            .map(|item| {
                let fields = RawFields {
                    title: first_text(&self.title, item),
                    link: first_text(&self.url, item),
                    text: self.text.as_ref().and_then(|p| first_text(p, item)),
                    image: self.image.as_ref().and_then(|p| first_text(p, item)),
                };
                custom::assemble(info.mode, response, fields)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(engine = %info.name, count = results.len(), "json results parsed");
        Ok(results)
    }

    fn validate(&self, info: &EngineInfo) -> Result<(), SearchError> {
        if info.mode == SearchMode::Images && self.image.is_none() {
            return Err(SearchError::Config(format!(
                "engine {}: image_path is required for image search",
                info.name
            )));
        }
        Ok(())
    }

    fn provided_extensions(&self) -> QueryExtensions {
        self.request.extensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HttpMethod;
    use url::Url;

    fn config() -> JsonAdapterConfig {
        JsonAdapterConfig {
            request: RequestTemplate {
                url: "https://api.test/search".into(),
                ..Default::default()
            },
            result_path: FieldPath::new("$.results[*]"),
            title_path: FieldPath::new("$.title"),
            url_path: FieldPath::new("$.url"),
            text_path: Some(FieldPath::new("$.snippet")),
            image_path: None,
        }
    }

    fn info(mode: SearchMode) -> EngineInfo {
        EngineInfo {
            name: "api".into(),
            mode,
            ..Default::default()
        }
    }

    fn response(body: &str) -> RawResponse {
        let url = Url::parse("https://api.test/search?q=x").expect("url");
        RawResponse {
            status: 200,
            reason: "OK".into(),
            url: url.clone(),
            body: body.into(),
            request: RequestSpec::new(HttpMethod::Get, url),
        }
    }

    #[test]
    fn parses_results_array() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let body = r#"{"results": [
            {"title": "First", "url": "https://a.test/1", "snippet": "one"},
            {"title": "Second", "url": "/2", "snippet": ""}
        ]}"#;
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(body))
            .expect("parse");
        assert_eq!(results.len(), 2);

        let SearchResult::Web(second) = &results[1] else {
            panic!("expected web result");
        };
        assert_eq!(second.title, "Second");
        assert_eq!(second.url.as_str(), "https://api.test/2");
        assert!(second.snippet.is_none());
    }

    #[test]
    fn filter_selector_drops_untitled_entries() {
        let adapter = JsonAdapter::new(JsonAdapterConfig {
            result_path: FieldPath::new("$['结果'][?@['信息']['标题'] != '']"),
            title_path: FieldPath::new("$['信息']['标题']"),
            url_path: FieldPath::new("$['网址']"),
            text_path: Some(FieldPath::new("$['信息']['描述']")),
            ..config()
        })
        .expect("adapter");
        let body = r#"{"结果": [
            {"网址": "https://b.test/1", "信息": {"标题": "标题一", "描述": "描述"}},
            {"网址": "https://b.test/2", "信息": {"标题": ""}},
            {"网址": "https://b.test/3", "信息": {"标题": "标题三"}}
        ]}"#;
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(body))
            .expect("parse");
        let titles: Vec<&str> = results.iter().map(SearchResult::headline).collect();
        assert_eq!(titles, ["标题一", "标题三"]);
    }

    #[test]
    fn empty_array_returns_empty() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(r#"{"results": []}"#))
            .expect("parse");
        assert!(results.is_empty());
    }

    #[test]
    fn unmatched_result_path_returns_empty() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(r#"{"items": []}"#))
            .expect("parse");
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let err = adapter
            .parse_response(&info(SearchMode::Web), &response("<html>"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn missing_title_is_parse_error() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let body = r#"{"results": [{"url": "https://a.test"}]}"#;
        let err = adapter
            .parse_response(&info(SearchMode::Web), &response(body))
            .unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn numeric_fields_are_stringified() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        let body = r#"{"results": [{"title": 1999, "url": "https://a.test"}]}"#;
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(body))
            .expect("parse");
        assert_eq!(results[0].headline(), "1999");
    }

    #[test]
    fn first_match_wins_for_fields() {
        let adapter = JsonAdapter::new(JsonAdapterConfig {
            title_path: FieldPath::new("$.names[*]"),
            ..config()
        })
        .expect("adapter");
        let body = r#"{"results": [{"names": ["Primary", "Alias"], "url": "https://a.test"}]}"#;
        let results = adapter
            .parse_response(&info(SearchMode::Web), &response(body))
            .expect("parse");
        assert_eq!(results[0].headline(), "Primary");
    }

    #[test]
    fn image_mode_requires_image_path() {
        let adapter = JsonAdapter::new(config()).expect("adapter");
        assert!(adapter.validate(&info(SearchMode::Images)).is_err());

        let adapter = JsonAdapter::new(JsonAdapterConfig {
            image_path: Some(FieldPath::new("$.img")),
            ..config()
        })
        .expect("adapter");
        assert!(adapter.validate(&info(SearchMode::Images)).is_ok());
    }

    #[test]
    fn malformed_path_rejected() {
        for bad in ["title", "$.results[", ""] {
            let err = JsonAdapter::new(JsonAdapterConfig {
                title_path: FieldPath::new(bad),
                ..config()
            })
            .unwrap_err();
            assert!(matches!(err, SearchError::Config(_)), "{bad:?}");
        }
    }
}
