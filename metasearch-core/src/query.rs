//! Query parsing into an extension-aware [`ParsedQuery`].
//!
//! Raw text is split into free terms, exact-match phrases (text inside a
//! matched pair of double quotes) and an optional `site:` directive. The
//! query language is resolved from an explicit parameter, then the
//! `Accept-Language` hint, then an external [`LanguageClassifier`], then
//! [`DEFAULT_LANGUAGE`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::error::SearchError;
use crate::lang::{self, LanguageClassifier, NoClassifier, DEFAULT_LANGUAGE};
use crate::types::SearchMode;

const SITE_PREFIX: &str = "site:";

/// An optional query capability an engine may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    /// `site:` domain restriction.
    Site,
    /// Exact-match quoted phrases.
    Quotes,
    /// Result pages beyond the first.
    Paging,
}

impl Extension {
    /// Lowercase configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Quotes => "quotes",
            Self::Paging => "paging",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Site => 0b001,
            Self::Quotes => 0b010,
            Self::Paging => 0b100,
        }
    }
}

/// Bitset over [`Extension`].
///
/// An engine is eligible for a query only if its declared set is a
/// superset of the query's required set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Extension>", into = "Vec<Extension>")]
pub struct QueryExtensions(u8);

impl QueryExtensions {
    /// No extensions.
    pub const NONE: Self = Self(0);
    /// `site:` domain restriction.
    pub const SITE: Self = Self(0b001);
    /// Exact-match quoted phrases.
    pub const QUOTES: Self = Self(0b010);
    /// Result pages beyond the first.
    pub const PAGING: Self = Self(0b100);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the given extension is set.
    pub fn has(self, extension: Extension) -> bool {
        self.0 & extension.bit() != 0
    }

    /// Returns `true` if no extension is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Lists the set extensions in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Extension> {
        [Extension::Site, Extension::Quotes, Extension::Paging]
            .into_iter()
            .filter(move |e| self.has(*e))
    }
}

impl BitOr for QueryExtensions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryExtensions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<Extension> for QueryExtensions {
    fn from(extension: Extension) -> Self {
        Self(extension.bit())
    }
}

impl From<Vec<Extension>> for QueryExtensions {
    fn from(extensions: Vec<Extension>) -> Self {
        extensions.into_iter().collect()
    }
}

impl From<QueryExtensions> for Vec<Extension> {
    fn from(extensions: QueryExtensions) -> Self {
        extensions.iter().collect()
    }
}

impl FromIterator<Extension> for QueryExtensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::NONE, |acc, e| acc | Self::from(e))
    }
}

/// An immutable, structured search query.
///
/// Invariants: `terms` is non-empty, `page >= 1`, and there is at most one
/// site filter. Only [`QueryParser`] constructs values of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    terms: Vec<String>,
    quoted_phrases: Vec<String>,
    site_filter: Option<String>,
    lang: String,
    mode: SearchMode,
    page: u32,
}

impl ParsedQuery {
    /// Free terms in input order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Exact-match phrases in order of first appearance, without duplicates.
    pub fn quoted_phrases(&self) -> &[String] {
        &self.quoted_phrases
    }

    /// Domain from the `site:` directive, lowercased.
    pub fn site_filter(&self) -> Option<&str> {
        self.site_filter.as_deref()
    }

    /// Resolved ISO language code.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Requested result category.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Requested result page, starting at 1.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Extensions an engine must support to answer this query.
    pub fn required_extensions(&self) -> QueryExtensions {
        let mut required = QueryExtensions::NONE;
        if self.site_filter.is_some() {
            required |= QueryExtensions::SITE;
        }
        if !self.quoted_phrases.is_empty() {
            required |= QueryExtensions::QUOTES;
        }
        if self.page > 1 {
            required |= QueryExtensions::PAGING;
        }
        required
    }
}

/// Renders the query the way it is sent upstream:
/// terms, then quoted phrases, then the site directive.
impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.terms.clone();
        parts.extend(self.quoted_phrases.iter().map(|p| format!("\"{p}\"")));
        if let Some(site) = &self.site_filter {
            parts.push(format!("{SITE_PREFIX}{site}"));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Turns raw query text and locale hints into a [`ParsedQuery`].
#[derive(Clone)]
pub struct QueryParser {
    classifier: Arc<dyn LanguageClassifier>,
    default_language: String,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(Arc::new(NoClassifier))
    }
}

impl fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryParser")
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}

impl QueryParser {
    /// Create a parser backed by the given language classifier.
    pub fn new(classifier: Arc<dyn LanguageClassifier>) -> Self {
        Self {
            classifier,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Override the language used when every other source declines.
    ///
    /// Invalid codes are ignored and the built-in default is kept.
    pub fn with_default_language(mut self, code: &str) -> Self {
        if let Some(code) = lang::normalize_language_code(code) {
            self.default_language = code;
        }
        self
    }

    /// Language used when every other source declines.
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Parse `raw` as a first-page web query.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyQuery`] if no free terms remain after
    /// extracting quoted phrases and the site directive.
    pub fn parse(&self, raw: &str, locale_hint: &str) -> Result<ParsedQuery, SearchError> {
        self.parse_request(raw, None, locale_hint, SearchMode::Web, 1)
    }

    /// Parse `raw` with an explicit language, mode and page.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPage`] if `page` is 0 and
    /// [`SearchError::EmptyQuery`] if no free terms remain.
    pub fn parse_request(
        &self,
        raw: &str,
        explicit_lang: Option<&str>,
        locale_hint: &str,
        mode: SearchMode,
        page: u32,
    ) -> Result<ParsedQuery, SearchError> {
        if page == 0 {
            return Err(SearchError::InvalidPage("page must be at least 1".into()));
        }

        let (free_text, quoted_phrases) = split_quoted(raw);

        let mut terms = Vec::new();
        let mut site_filter = None;
        for token in free_text.split_whitespace() {
            match site_domain(token) {
                Some(domain) => {
                    // First directive wins; later ones are dropped.
                    site_filter.get_or_insert(domain);
                }
                None => terms.push(token.to_string()),
            }
        }

        if terms.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let lang = self.resolve_language(raw, explicit_lang, locale_hint);
        tracing::trace!(lang = %lang, ?mode, page, "query parsed");

        Ok(ParsedQuery {
            terms,
            quoted_phrases,
            site_filter,
            lang,
            mode,
            page,
        })
    }

    fn resolve_language(&self, raw: &str, explicit: Option<&str>, locale_hint: &str) -> String {
        explicit
            .and_then(lang::normalize_language_code)
            .or_else(|| lang::best_language(locale_hint))
            .or_else(|| {
                self.classifier
                    .classify(raw)
                    .as_deref()
                    .and_then(lang::normalize_language_code)
            })
            .unwrap_or_else(|| self.default_language.clone())
    }
}

/// Split `raw` into the text outside quotes and the phrases inside matched
/// pairs. An unmatched trailing quote is dropped and its tail kept as free text.
fn split_quoted(raw: &str) -> (String, Vec<String>) {
    let mut free = String::with_capacity(raw.len());
    let mut phrases: Vec<String> = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('"') {
        free.push_str(&rest[..open]);
        free.push(' ');
        let after = &rest[open + 1..];
        match after.find('"') {
            Some(close) => {
                let phrase = &after[..close];
                if !phrase.trim().is_empty() && !phrases.iter().any(|p| p == phrase) {
                    phrases.push(phrase.to_string());
                }
                free.push(' ');
                rest = &after[close + 1..];
            }
            None => {
                rest = after;
                break;
            }
        }
    }
    free.push_str(rest);

    (free, phrases)
}

/// Returns the lowercased domain of a `site:` token, or `None` for any
/// other token (including a bare `site:`).
fn site_domain(token: &str) -> Option<String> {
    let prefix = token.get(..SITE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(SITE_PREFIX) {
        return None;
    }
    let domain = token[SITE_PREFIX.len()..].trim_end_matches('/');
    (!domain.is_empty()).then(|| domain.to_ascii_lowercase())
}
