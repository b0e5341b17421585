//! Engine registry and capability filter.
//!
//! Engines are registered once at startup through [`RegistryBuilder`];
//! the resulting [`EngineRegistry`] is immutable and shared read-only by
//! every dispatch.

use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::SearchError;
use crate::query::ParsedQuery;

/// Collects engines in registration order.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    engines: Vec<Engine>,
    names: HashSet<String>,
}

impl RegistryBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an engine.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if an engine with the same name is
    /// already registered.
    pub fn register(&mut self, engine: Engine) -> Result<&mut Self, SearchError> {
        if !self.names.insert(engine.name().to_string()) {
            return Err(SearchError::Config(format!(
                "engine {:?} is registered twice",
                engine.name()
            )));
        }
        let position = self.engines.len();
        self.engines.push(engine.with_position(position));
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> EngineRegistry {
        EngineRegistry {
            engines: self.engines.into_iter().map(Arc::new).collect(),
        }
    }
}

/// The immutable set of configured engines.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<Engine>>,
}

impl EngineRegistry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from engines in order.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryBuilder::register`].
    pub fn from_engines(engines: impl IntoIterator<Item = Engine>) -> Result<Self, SearchError> {
        let mut builder = RegistryBuilder::new();
        for engine in engines {
            builder.register(engine)?;
        }
        Ok(builder.build())
    }

    /// All engines in registration order.
    pub fn engines(&self) -> &[Arc<Engine>] {
        &self.engines
    }

    /// Look an engine up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Engine>> {
        self.engines.iter().find(|e| e.name() == name)
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Returns `true` if no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Engines able to answer `query`, in registration order.
    ///
    /// An engine is eligible iff its mode equals the query's mode, it
    /// serves the query's language (or every language), and its
    /// capabilities are a superset of the query's required extensions.
    pub fn eligible_engines(&self, query: &ParsedQuery) -> Vec<Arc<Engine>> {
        let required = query.required_extensions();
        self.engines
            .iter()
            .filter(|e| e.mode() == query.mode())
            .filter(|e| e.supports_language(query.lang()))
            .filter(|e| e.query_extensions().contains(required))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Adapter, EngineInfo};
    use crate::engines::{FieldPath, JsonAdapter, JsonAdapterConfig, RequestTemplate};
    use crate::query::{QueryExtensions, QueryParser};
    use crate::types::SearchMode;
    use std::collections::BTreeSet;

    fn engine(name: &str, mode: SearchMode, langs: &[&str], ext: QueryExtensions) -> Engine {
        let adapter = JsonAdapter::new(JsonAdapterConfig {
            request: RequestTemplate {
                url: "https://api.test/search".into(),
                ..Default::default()
            },
            result_path: FieldPath::new("$.results[*]"),
            title_path: FieldPath::new("$.title"),
            url_path: FieldPath::new("$.url"),
            image_path: Some(FieldPath::new("$.img")),
            ..Default::default()
        })
        .expect("adapter");
        Engine::new(
            EngineInfo {
                name: name.into(),
                mode,
                supported_languages: langs.iter().map(|l| l.to_string()).collect::<BTreeSet<_>>(),
                query_extensions: ext,
                ..Default::default()
            },
            Adapter::Json(adapter),
        )
        .expect("engine")
    }

    fn registry() -> EngineRegistry {
        EngineRegistry::from_engines([
            engine("plain", SearchMode::Web, &[], QueryExtensions::NONE),
            engine("site", SearchMode::Web, &[], QueryExtensions::SITE),
            engine("english", SearchMode::Web, &["en"], QueryExtensions::SITE | QueryExtensions::QUOTES),
            engine("pictures", SearchMode::Images, &[], QueryExtensions::SITE),
        ])
        .expect("registry")
    }

    fn names(engines: &[Arc<Engine>]) -> Vec<&str> {
        engines.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = EngineRegistry::from_engines([
            engine("dup", SearchMode::Web, &[], QueryExtensions::NONE),
            engine("dup", SearchMode::Images, &[], QueryExtensions::NONE),
        ])
        .unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn positions_follow_registration_order() {
        let registry = registry();
        let positions: Vec<usize> = registry.engines().iter().map(|e| e.position()).collect();
        assert_eq!(positions, [0, 1, 2, 3]);
        assert_eq!(registry.get("english").map(|e| e.position()), Some(2));
    }

    #[test]
    fn plain_query_matches_every_web_engine_for_language() {
        let parser = QueryParser::default();
        let q = parser.parse("cats", "en").expect("query");
        assert_eq!(names(&registry().eligible_engines(&q)), ["plain", "site", "english"]);

        let q = parser.parse("katzen", "de").expect("query");
        assert_eq!(names(&registry().eligible_engines(&q)), ["plain", "site"]);
    }

    #[test]
    fn site_query_requires_site_capability() {
        let q = QueryParser::default()
            .parse("site:example.com cats", "en")
            .expect("query");
        assert_eq!(names(&registry().eligible_engines(&q)), ["site", "english"]);
    }

    #[test]
    fn mode_always_matches() {
        let q = QueryParser::default()
            .parse_request("cats", None, "", SearchMode::Images, 1)
            .expect("query");
        let eligible = registry().eligible_engines(&q);
        assert!(eligible.iter().all(|e| e.mode() == SearchMode::Images));
        assert_eq!(names(&eligible), ["pictures"]);
    }

    #[test]
    fn paging_without_capability_yields_nothing() {
        let q = QueryParser::default()
            .parse_request("cats", None, "", SearchMode::Web, 2)
            .expect("query");
        assert!(registry().eligible_engines(&q).is_empty());
    }
}
