//! Core types for search modes and normalised results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::SearchError;

/// The result category an engine serves and a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Web pages.
    Web,
    /// Images.
    Images,
    /// Direct answers.
    Answers,
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Web
    }
}

impl SearchMode {
    /// Returns the lowercase wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Images => "images",
            Self::Answers => "answers",
        }
    }

    /// Returns all supported modes.
    pub fn all() -> &'static [SearchMode] {
        &[Self::Web, Self::Images, Self::Answers]
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "images" => Ok(Self::Images),
            "answers" => Ok(Self::Answers),
            other => Err(SearchError::InvalidMode(other.to_string())),
        }
    }
}

/// A web page hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    /// Non-empty page title.
    pub title: String,
    /// Absolute, normalised page URL.
    pub url: Url,
    /// Optional text snippet.
    pub snippet: Option<String>,
}

/// An image hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Non-empty image title.
    pub title: String,
    /// Absolute URL of the page hosting the image.
    pub url: Url,
    /// Optional text snippet.
    pub snippet: Option<String>,
    /// Absolute URL of the image itself (or its thumbnail).
    pub image_url: Url,
}

/// A direct answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Non-empty answer text.
    pub text: String,
    /// Source URL of the answer.
    pub url: Url,
}

/// A single normalised result returned by an engine adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchResult {
    /// Web page.
    Web(WebResult),
    /// Image.
    Image(ImageResult),
    /// Direct answer.
    Answer(AnswerResult),
}

impl SearchResult {
    /// Build a web result, rejecting an empty title.
    ///
    /// Blank snippets are mapped to `None`.
    pub fn web(title: &str, url: Url, snippet: Option<&str>) -> Result<Self, SearchError> {
        Ok(Self::Web(WebResult {
            title: required_text(title, "title")?,
            url,
            snippet: optional_text(snippet),
        }))
    }

    /// Build an image result, rejecting an empty title.
    pub fn image(
        title: &str,
        url: Url,
        snippet: Option<&str>,
        image_url: Url,
    ) -> Result<Self, SearchError> {
        Ok(Self::Image(ImageResult {
            title: required_text(title, "title")?,
            url,
            snippet: optional_text(snippet),
            image_url,
        }))
    }

    /// Build an answer result, rejecting empty text.
    pub fn answer(text: &str, url: Url) -> Result<Self, SearchError> {
        Ok(Self::Answer(AnswerResult {
            text: required_text(text, "answer text")?,
            url,
        }))
    }

    /// The URL this result points at.
    pub fn url(&self) -> &Url {
        match self {
            Self::Web(r) => &r.url,
            Self::Image(r) => &r.url,
            Self::Answer(r) => &r.url,
        }
    }

    /// The headline text: title for web/image hits, answer text otherwise.
    pub fn headline(&self) -> &str {
        match self {
            Self::Web(r) => &r.title,
            Self::Image(r) => &r.title,
            Self::Answer(r) => &r.text,
        }
    }

    /// Returns `true` for answer results.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }
}

fn required_text(value: &str, field: &str) -> Result<String, SearchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SearchError::Parse(format!("{field} is empty")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A merged, scored entry of the final ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// The surviving representative (first-seen title and snippet).
    pub result: SearchResult,
    /// Summed reciprocal-rank contributions across engines.
    pub score: f64,
    /// Names of every engine that returned this result, in registration order.
    pub engines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("web".parse::<SearchMode>(), Ok(SearchMode::Web));
        assert_eq!(" Images ".parse::<SearchMode>(), Ok(SearchMode::Images));
        assert_eq!("ANSWERS".parse::<SearchMode>(), Ok(SearchMode::Answers));
    }

    #[test]
    fn unknown_mode_rejected() {
        let err = "videos".parse::<SearchMode>().unwrap_err();
        assert_eq!(err, SearchError::InvalidMode("videos".into()));
    }

    #[test]
    fn mode_display_matches_wire_name() {
        for mode in SearchMode::all() {
            assert_eq!(mode.to_string().parse::<SearchMode>(), Ok(*mode));
        }
    }

    #[test]
    fn web_result_rejects_blank_title() {
        let err = SearchResult::web("   ", url("https://a.test"), None).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn blank_snippet_becomes_none() {
        let result = SearchResult::web("Title", url("https://a.test"), Some("  ")).expect("valid");
        let SearchResult::Web(web) = result else {
            panic!("expected web result");
        };
        assert!(web.snippet.is_none());
        assert_eq!(web.title, "Title");
    }

    #[test]
    fn answer_rejects_empty_text() {
        assert!(SearchResult::answer("", url("https://a.test")).is_err());
    }

    #[test]
    fn url_parse_lowercases_scheme_and_host() {
        let result = SearchResult::web("T", url("HTTPS://X.TEST/Path"), None).expect("valid");
        assert_eq!(result.url().as_str(), "https://x.test/Path");
    }

    #[test]
    fn serialised_result_is_tagged() {
        let result = SearchResult::answer("42", url("https://a.test")).expect("valid");
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["kind"], "answer");
        assert_eq!(json["text"], "42");
    }
}
