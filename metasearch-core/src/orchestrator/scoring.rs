//! Reciprocal-rank scoring.
//!
//! A hit at 0-indexed rank `r` in an engine's own list contributes
//! `weight / (r + 1)`. Contributions of merged hits are summed.

/// Contribution of one hit.
///
/// ```
/// use metasearch_core::orchestrator::scoring::contribution;
///
/// assert_eq!(contribution(1.0, 0), 1.0);
/// assert_eq!(contribution(1.3, 1), 0.65);
/// ```
pub fn contribution(weight: f64, rank: usize) -> f64 {
    weight / (rank as f64 + 1.0)
}

/// Descending order on scores, for use with stable sorts.
pub(crate) fn by_score_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}
