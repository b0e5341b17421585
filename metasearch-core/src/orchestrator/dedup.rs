//! Merging of equivalent results across engines.
//!
//! Web and image hits are keyed by normalised URL, answers by their text.
//! Hits sharing a key sum their contributions; the first-seen hit stays
//! the representative and later engines are recorded as provenance.

use std::collections::HashMap;

use crate::engine::Engine;
use crate::types::SearchResult;

use super::scoring::contribution;
use super::url_normalize::normalize_url;

/// Identity of a result for merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Normalised page URL of a web or image hit.
    Page(String),
    /// Answer text.
    Answer(String),
}

impl DedupKey {
    /// Key of `result`.
    pub fn of(result: &SearchResult) -> Self {
        match result {
            SearchResult::Web(_) | SearchResult::Image(_) => Self::Page(normalize_url(result.url())),
            SearchResult::Answer(r) => Self::Answer(r.text.clone()),
        }
    }
}

/// A merged result before sorting.
#[derive(Debug, Clone)]
pub struct MergedResult {
    /// First-seen representative.
    pub result: SearchResult,
    /// Summed contributions.
    pub score: f64,
    /// Contributing engines in the order they were merged.
    pub engines: Vec<String>,
}

/// Merge per-engine result lists.
///
/// `outcomes` must already be in engine registration order; the output
/// keeps first-seen order, which later serves as the sort tie-breaker.
/// An engine listing the same key twice only contributes its best rank.
pub fn merge<'a, I>(outcomes: I) -> Vec<MergedResult>
where
    I: IntoIterator<Item = (&'a Engine, &'a [SearchResult])>,
{
    let mut merged: Vec<MergedResult> = Vec::new();
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for (engine, results) in outcomes {
        for (rank, result) in results.iter().enumerate() {
            let score = contribution(engine.weight(), rank);
            let key = DedupKey::of(result);
            match index.get(&key) {
                Some(&slot) => {
                    let entry = &mut merged[slot];
                    if entry.engines.iter().any(|e| e == engine.name()) {
                        continue;
                    }
                    entry.score += score;
                    entry.engines.push(engine.name().to_string());
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(MergedResult {
                        result: result.clone(),
                        score,
                        engines: vec![engine.name().to_string()],
                    });
                }
            }
        }
    }

    merged
}
