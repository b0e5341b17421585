//! Rank fusion over settled dispatch outcomes.

use std::sync::Arc;

use crate::engine::Engine;
use crate::types::{RankedResult, SearchResult};

use super::dedup::{merge, MergedResult};
use super::scoring::by_score_desc;

/// Fuse per-engine result lists into one ordered list.
///
/// Deterministic for a given multiset of outcomes: lists are first put in
/// engine registration order, so completion order never matters. The
/// single best answer (if any) comes first, then web and image hits by
/// descending score, ties keeping first-seen order. `max_results`
/// truncates the final list.
pub fn rank(
    outcomes: &[(Arc<Engine>, Vec<SearchResult>)],
    max_results: Option<usize>,
) -> Vec<RankedResult> {
    let mut ordered: Vec<&(Arc<Engine>, Vec<SearchResult>)> = outcomes.iter().collect();
    ordered.sort_by(|a, b| {
        a.0.position()
            .cmp(&b.0.position())
            .then_with(|| a.0.name().cmp(b.0.name()))
    });

    let merged = merge(
        ordered
            .into_iter()
            .map(|(engine, results)| (engine.as_ref(), results.as_slice())),
    );

    let (answers, mut hits): (Vec<MergedResult>, Vec<MergedResult>) =
        merged.into_iter().partition(|m| m.result.is_answer());

    let mut best_answer: Option<MergedResult> = None;
    for answer in answers {
        let better = match &best_answer {
            Some(best) => answer.score > best.score,
            None => true,
        };
        if better {
            best_answer = Some(answer);
        }
    }

    hits.sort_by(|a, b| by_score_desc(a.score, b.score));

    let mut ranked: Vec<RankedResult> = best_answer
        .into_iter()
        .chain(hits)
        .map(|m| RankedResult {
            result: m.result,
            score: m.score,
            engines: m.engines,
        })
        .collect();

    if let Some(limit) = max_results {
        ranked.truncate(limit);
    }

    tracing::debug!(count = ranked.len(), "results ranked");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Adapter, EngineInfo};
    use crate::engines::{FieldPath, JsonAdapter, JsonAdapterConfig, RequestTemplate};
    use crate::registry::EngineRegistry;
    use url::Url;

    fn engine(name: &str, weight: f64) -> Engine {
        let adapter = JsonAdapter::new(JsonAdapterConfig {
            request: RequestTemplate {
                url: "https://api.test/search".into(),
                ..Default::default()
            },
            result_path: FieldPath::new("$.results[*]"),
            title_path: FieldPath::new("$.title"),
            url_path: FieldPath::new("$.url"),
            ..Default::default()
        })
        .expect("adapter");
        Engine::new(
            EngineInfo {
                name: name.into(),
                weight,
                ..Default::default()
            },
            Adapter::Json(adapter),
        )
        .expect("engine")
    }

    fn registry(engines: &[(&str, f64)]) -> EngineRegistry {
        EngineRegistry::from_engines(engines.iter().map(|(n, w)| engine(n, *w))).expect("registry")
    }

    fn web(title: &str, url: &str) -> SearchResult {
        SearchResult::web(title, Url::parse(url).expect("url"), None).expect("result")
    }

    fn answer(text: &str) -> SearchResult {
        SearchResult::answer(text, Url::parse("https://answers.test").expect("url")).expect("answer")
    }

    fn outcome(
        registry: &EngineRegistry,
        name: &str,
        results: Vec<SearchResult>,
    ) -> (Arc<Engine>, Vec<SearchResult>) {
        (Arc::clone(registry.get(name).expect("engine")), results)
    }

    #[test]
    fn world_news_scenario() {
        let reg = registry(&[("x", 1.0), ("y", 1.3)]);
        let outcomes = vec![
            outcome(&reg, "y", vec![web("Y first", "https://y.test/z"), web("World News (Y)", "https://x.test/a")]),
            outcome(&reg, "x", vec![web("World News", "https://x.test/a")]),
        ];
        let ranked = rank(&outcomes, None);
        assert_eq!(ranked.len(), 2);
        assert!((ranked[0].score - 1.65).abs() < 1e-9);
        assert_eq!(ranked[0].result.headline(), "World News");
        assert_eq!(ranked[0].engines, ["x", "y"]);
        assert!((ranked[1].score - 1.3).abs() < 1e-9);
    }

    #[test]
    fn image_hits_fuse_on_page_url() {
        let reg = registry(&[("x", 1.0), ("y", 1.3)]);
        let image = |src: &str| {
            SearchResult::image(
                "Cat",
                Url::parse("https://photos.test/cat").expect("url"),
                None,
                Url::parse(src).expect("url"),
            )
            .expect("image")
        };
        let outcomes = vec![
            outcome(&reg, "x", vec![image("https://thumbs.x.test/1.jpg")]),
            outcome(&reg, "y", vec![image("https://img.y.test/cat-small.png")]),
        ];
        let ranked = rank(&outcomes, None);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 2.3).abs() < 1e-9);
        assert_eq!(ranked[0].engines, ["x", "y"]);
    }

    #[test]
    fn completion_order_does_not_matter() {
        let reg = registry(&[("a", 1.0), ("b", 1.0), ("c", 2.0)]);
        let a = outcome(&reg, "a", vec![web("A1", "https://a.test/1"), web("S", "https://shared.test")]);
        let b = outcome(&reg, "b", vec![web("S b", "https://shared.test/"), web("B2", "https://b.test/2")]);
        let c = outcome(&reg, "c", vec![web("C1", "https://c.test/1")]);

        let forward = rank(&[a.clone(), b.clone(), c.clone()], None);
        let backward = rank(&[c, b, a], None);
        assert_eq!(forward, backward);
    }

    #[test]
    fn ranking_twice_is_identical() {
        let reg = registry(&[("a", 1.0), ("b", 1.7)]);
        let outcomes = vec![
            outcome(&reg, "a", vec![web("A1", "https://a.test/1"), web("S", "https://s.test")]),
            outcome(&reg, "b", vec![web("S", "https://s.test"), answer("yes")]),
        ];
        assert_eq!(rank(&outcomes, None), rank(&outcomes, None));
    }

    #[test]
    fn ties_keep_registration_order() {
        let reg = registry(&[("first", 1.0), ("second", 1.0)]);
        let outcomes = vec![
            outcome(&reg, "second", vec![web("Second", "https://second.test")]),
            outcome(&reg, "first", vec![web("First", "https://first.test")]),
        ];
        let ranked = rank(&outcomes, None);
        let titles: Vec<&str> = ranked.iter().map(|r| r.result.headline()).collect();
        assert_eq!(titles, ["First", "Second"]);
    }

    #[test]
    fn single_best_answer_leads() {
        let reg = registry(&[("a", 1.0), ("b", 3.0)]);
        let outcomes = vec![
            outcome(&reg, "a", vec![answer("low"), web("Page", "https://p.test")]),
            outcome(&reg, "b", vec![web("Heavy", "https://h.test"), answer("high")]),
        ];
        let ranked = rank(&outcomes, None);
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].result.is_answer());
        assert_eq!(ranked[0].result.headline(), "high");
        assert!(ranked[1..].iter().all(|r| !r.result.is_answer()));
        assert_eq!(ranked[1].result.headline(), "Heavy");
    }

    #[test]
    fn max_results_truncates_after_sorting() {
        let reg = registry(&[("a", 1.0), ("b", 5.0)]);
        let outcomes = vec![
            outcome(&reg, "a", vec![web("A1", "https://a.test/1"), web("A2", "https://a.test/2")]),
            outcome(&reg, "b", vec![web("B1", "https://b.test/1")]),
        ];
        let ranked = rank(&outcomes, Some(1));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].result.headline(), "B1");
    }

    #[test]
    fn no_outcomes_rank_to_empty() {
        assert!(rank(&[], None).is_empty());
        let reg = registry(&[("a", 1.0)]);
        assert!(rank(&[outcome(&reg, "a", Vec::new())], None).is_empty());
    }
}
