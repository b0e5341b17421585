//! Request construction and result assembly shared by the selector and
//! JSON adapters.
//!
//! Both families are configured with a base URL, the key under which the
//! rendered query is sent, fixed extra parameters and an optional page key.
//! They differ only in how fields are pulled out of a response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::engine::{BaseParams, EngineInfo, HttpMethod, RawResponse, RequestSpec};
use crate::error::SearchError;
use crate::query::{ParsedQuery, QueryExtensions};
use crate::types::{SearchMode, SearchResult};

/// How a custom engine's request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTemplate {
    /// Endpoint URL without the query parameters added here.
    pub url: String,
    /// Parameter carrying the rendered query.
    pub query_key: String,
    /// Fixed parameters sent with every request.
    pub params: BTreeMap<String, String>,
    /// Parameter carrying the page number. Setting it enables paging.
    pub page_key: Option<String>,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self {
            url: String::new(),
            query_key: "q".to_string(),
            params: BTreeMap::new(),
            page_key: None,
        }
    }
}

/// A [`RequestTemplate`] with its endpoint parsed.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRequest {
    endpoint: Url,
    query_key: String,
    params: BTreeMap<String, String>,
    page_key: Option<String>,
}

impl CompiledRequest {
    pub(crate) fn compile(template: &RequestTemplate) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&template.url)
            .map_err(|e| SearchError::Config(format!("invalid engine url {:?}: {e}", template.url)))?;
        if template.query_key.trim().is_empty() {
            return Err(SearchError::Config("query_key must not be empty".into()));
        }
        Ok(Self {
            endpoint,
            query_key: template.query_key.clone(),
            params: template.params.clone(),
            page_key: template.page_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    pub(crate) fn extensions(&self) -> QueryExtensions {
        if self.page_key.is_some() {
            QueryExtensions::PAGING
        } else {
            QueryExtensions::NONE
        }
    }

    /// GET sends every parameter in the query string; POST sends the same
    /// map as a JSON object body.
    pub(crate) fn build(
        &self,
        info: &EngineInfo,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<RequestSpec, SearchError> {
        let mut data: Vec<(String, String)> = vec![(self.query_key.clone(), query.to_string())];
        data.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(key) = &self.page_key {
            data.push((key.clone(), base.page.to_string()));
        }

        let spec = match base.method {
            HttpMethod::Get => {
                let mut url = self.endpoint.clone();
                url.query_pairs_mut().extend_pairs(data.iter());
                base.request(url)
            }
            HttpMethod::Post => {
                let body: serde_json::Map<String, serde_json::Value> = data
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                let body = serde_json::to_string(&body)
                    .map_err(|e| SearchError::Config(format!("cannot encode request body: {e}")))?;
                let mut spec = base.request(self.endpoint.clone());
                spec.headers
                    .insert("Content-Type".into(), "application/json".into());
                spec.body = Some(body);
                spec
            }
        };

        tracing::trace!(engine = %info.name, url = %spec.url, "custom request built");
        Ok(spec)
    }
}

/// Field values extracted from one result container, before validation.
#[derive(Debug, Default)]
pub(crate) struct RawFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
}

/// Turn extracted fields into a normalised result.
///
/// Title and link are required; the image source is required in image
/// mode. In answer mode the title field carries the answer text.
pub(crate) fn assemble(
    mode: SearchMode,
    response: &RawResponse,
    fields: RawFields,
) -> Result<SearchResult, SearchError> {
    let title = fields
        .title
        .ok_or_else(|| SearchError::Parse("result is missing its title".into()))?;
    let link = fields
        .link
        .ok_or_else(|| SearchError::Parse("result is missing its link".into()))?;
    let url = response.resolve(&link)?;

    match mode {
        SearchMode::Web => SearchResult::web(&title, url, fields.text.as_deref()),
        SearchMode::Images => {
            let src = fields
                .image
                .ok_or_else(|| SearchError::Parse("image result is missing its source".into()))?;
            let image_url = response.resolve(&src)?;
            SearchResult::image(&title, url, fields.text.as_deref(), image_url)
        }
        SearchMode::Answers => SearchResult::answer(&title, url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParser;

    fn info() -> EngineInfo {
        EngineInfo {
            name: "custom".into(),
            ..Default::default()
        }
    }

    fn base(q: &ParsedQuery, method: HttpMethod) -> BaseParams {
        BaseParams {
            method,
            ..BaseParams::for_query(q, 2)
        }
    }

    fn template() -> RequestTemplate {
        RequestTemplate {
            url: "https://api.test/search".into(),
            params: BTreeMap::from([("a".to_string(), "1".to_string())]),
            ..Default::default()
        }
    }

    fn query(raw: &str, page: u32) -> ParsedQuery {
        QueryParser::default()
            .parse_request(raw, None, "", SearchMode::Web, page)
            .expect("query")
    }

    fn response() -> RawResponse {
        let url = Url::parse("https://api.test/search").expect("url");
        RawResponse {
            status: 200,
            reason: "OK".into(),
            url: url.clone(),
            body: String::new(),
            request: RequestSpec::new(HttpMethod::Get, url),
        }
    }

    #[test]
    fn get_encodes_query_and_params() {
        let compiled = CompiledRequest::compile(&template()).expect("compile");
        let q = query("rust \"async io\"", 1);
        let spec = compiled
            .build(&info(), &q, &base(&q, HttpMethod::Get))
            .expect("build");
        assert_eq!(spec.method, HttpMethod::Get);
        let pairs: Vec<(String, String)> = spec.url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("q".to_string(), "rust \"async io\"".to_string()),
                ("a".to_string(), "1".to_string())
            ]
        );
        assert!(spec.body.is_none());
    }

    #[test]
    fn post_sends_json_body() {
        let compiled = CompiledRequest::compile(&template()).expect("compile");
        let q = query("rust", 1);
        let spec = compiled
            .build(&info(), &q, &base(&q, HttpMethod::Post))
            .expect("build");
        assert_eq!(spec.url.as_str(), "https://api.test/search");
        assert_eq!(spec.headers.get("Content-Type").map(String::as_str), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_str(spec.body.as_deref().expect("body")).expect("json");
        assert_eq!(body["q"], "rust");
        assert_eq!(body["a"], "1");
    }

    #[test]
    fn page_key_adds_paging_capability() {
        let compiled = CompiledRequest::compile(&RequestTemplate {
            page_key: Some("p".into()),
            ..template()
        })
        .expect("compile");
        assert_eq!(compiled.extensions(), QueryExtensions::PAGING);

        let q = query("rust", 3);
        let spec = compiled
            .build(&info(), &q, &base(&q, HttpMethod::Get))
            .expect("build");
        assert!(spec.url.query_pairs().any(|(k, v)| k == "p" && v == "3"));
    }

    #[test]
    fn invalid_url_is_config_error() {
        let err = CompiledRequest::compile(&RequestTemplate {
            url: "not a url".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn assemble_requires_title_and_link() {
        let err = assemble(SearchMode::Web, &response(), RawFields::default()).unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = assemble(
            SearchMode::Web,
            &response(),
            RawFields {
                title: Some("T".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("link"));
    }

    #[test]
    fn assemble_resolves_relative_links() {
        let result = assemble(
            SearchMode::Web,
            &response(),
            RawFields {
                title: Some("T".into()),
                link: Some("/doc".into()),
                ..Default::default()
            },
        )
        .expect("assemble");
        assert_eq!(result.url().as_str(), "https://api.test/doc");
    }

    #[test]
    fn image_mode_needs_source() {
        let fields = || RawFields {
            title: Some("Cat".into()),
            link: Some("/page".into()),
            ..Default::default()
        };
        assert!(assemble(SearchMode::Images, &response(), fields()).is_err());

        let result = assemble(
            SearchMode::Images,
            &response(),
            RawFields {
                image: Some("/cat.png".into()),
                ..fields()
            },
        )
        .expect("assemble");
        let SearchResult::Image(image) = result else {
            panic!("expected image result");
        };
        assert_eq!(image.image_url.as_str(), "https://api.test/cat.png");
    }

    #[test]
    fn answer_mode_uses_title_as_text() {
        let result = assemble(
            SearchMode::Answers,
            &response(),
            RawFields {
                title: Some("42".into()),
                link: Some("https://a.test".into()),
                ..Default::default()
            },
        )
        .expect("assemble");
        assert!(result.is_answer());
        assert_eq!(result.headline(), "42");
    }
}
