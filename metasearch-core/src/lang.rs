//! Query language resolution helpers.
//!
//! The language-identification model itself lives outside this crate and
//! is reached through [`LanguageClassifier`]. Everything here is a pure
//! function of its inputs.

/// Language assumed when nothing else yields a usable code.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Guesses the language of free text.
///
/// Implementations wrap an external model. They must behave as a pure
/// function from text to code and may decline by returning `None`
/// (for example when the model is not loaded).
pub trait LanguageClassifier: Send + Sync {
    /// Returns an ISO 639 language code for `text`, or `None` if unsure.
    fn classify(&self, text: &str) -> Option<String>;
}

/// A classifier that always declines, so resolution falls through to the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClassifier;

impl LanguageClassifier for NoClassifier {
    fn classify(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Reduce a language tag such as `"de-AT"` or `"PT_br"` to its lowercase
/// primary subtag.
///
/// Returns `None` unless the primary subtag is 2 or 3 ASCII letters.
pub fn normalize_language_code(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next()?;
    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| primary.to_ascii_lowercase())
}

/// Pick the best primary language subtag from an `Accept-Language` header.
///
/// Entries are ranked by their `q` weight (default 1.0); ties keep header
/// order. Wildcards, zero weights and malformed tags are ignored.
///
/// ```
/// use metasearch_core::lang::best_language;
///
/// assert_eq!(best_language("fr-CH, fr;q=0.9, en;q=0.8").as_deref(), Some("fr"));
/// assert_eq!(best_language("en;q=0.5, de").as_deref(), Some("de"));
/// assert_eq!(best_language(""), None);
/// ```
pub fn best_language(accept_language: &str) -> Option<String> {
    let mut best: Option<(f32, String)> = None;

    for entry in accept_language.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let weight = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .next()
            .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok());
        let Some(weight) = weight.filter(|w| *w > 0.0) else {
            continue;
        };

        let Some(code) = normalize_language_code(tag) else {
            continue;
        };

        let better = match &best {
            Some((w, _)) => weight > *w,
            None => true,
        };
        if better {
            best = Some((weight, code));
        }
    }

    best.map(|(_, code)| code)
}
