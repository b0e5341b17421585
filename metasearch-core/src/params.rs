//! Validation of raw search request parameters.

use crate::error::SearchError;
use crate::types::SearchMode;

/// A validated `(query, mode, page)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Raw query text, trimmed, non-empty.
    pub query: String,
    /// Requested mode; web when absent.
    pub mode: SearchMode,
    /// Requested page; 1 when absent.
    pub page: u32,
}

impl SearchParams {
    /// Validate the raw strings a routing layer received.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmptyQuery`] for a missing or blank query,
    /// [`SearchError::InvalidMode`] for an unknown mode and
    /// [`SearchError::InvalidPage`] for a page that is not a positive integer.
    pub fn parse(q: Option<&str>, mode: Option<&str>, page: Option<&str>) -> Result<Self, SearchError> {
        let query = q.map(str::trim).filter(|q| !q.is_empty()).ok_or(SearchError::EmptyQuery)?;

        let mode = match mode.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.parse()?,
            None => SearchMode::Web,
        };

        let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => match p.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(SearchError::InvalidPage(p.to_string())),
            },
            None => 1,
        };

        Ok(Self {
            query: query.to_string(),
            mode,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let params = SearchParams::parse(Some(" cats "), None, None).expect("params");
        assert_eq!(params.query, "cats");
        assert_eq!(params.mode, SearchMode::Web);
        assert_eq!(params.page, 1);
    }

    #[test]
    fn explicit_values() {
        let params = SearchParams::parse(Some("cats"), Some("images"), Some("3")).expect("params");
        assert_eq!(params.mode, SearchMode::Images);
        assert_eq!(params.page, 3);
    }

    #[test]
    fn blank_query_rejected() {
        assert_eq!(SearchParams::parse(Some("   "), None, None), Err(SearchError::EmptyQuery));
        assert_eq!(SearchParams::parse(None, None, None), Err(SearchError::EmptyQuery));
    }

    #[test]
    fn bad_mode_rejected() {
        let err = SearchParams::parse(Some("x"), Some("videos"), None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidMode(m) if m == "videos"));
    }

    #[test]
    fn bad_page_rejected() {
        for page in ["0", "-1", "two", "1.5"] {
            let err = SearchParams::parse(Some("x"), None, Some(page)).unwrap_err();
            assert_eq!(err, SearchError::InvalidPage(page.to_string()));
        }
    }
}
