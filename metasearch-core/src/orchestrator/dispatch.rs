//! Concurrent fan-out of one query to its eligible engines.
//!
//! Every engine call runs concurrently with [`futures::future::join_all`].
//! Calls share one HTTP client and a semaphore bounding in-flight
//! connections; the per-request timeout starts once a connection slot is
//! held. Failures are recorded per engine and never affect siblings.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::config::SearchConfig;
use crate::engine::{BaseParams, Engine};
use crate::error::SearchError;
use crate::http;
use crate::metrics::{MetricsSink, TracingMetrics};
use crate::query::ParsedQuery;
use crate::types::SearchResult;

/// Everything one dispatch produced, once all engines have settled.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Result lists of the engines that succeeded, in input order.
    pub results: Vec<(Arc<Engine>, Vec<SearchResult>)>,
    /// Failure of every other engine, keyed by engine name.
    pub errors: BTreeMap<String, SearchError>,
}

/// Executes engine requests over a bounded shared transport.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    pool: Arc<Semaphore>,
    timeout: Duration,
    safe_search: u8,
    metrics: Arc<dyn MetricsSink>,
}

impl Dispatcher {
    /// Build a dispatcher with its own client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid config or if the HTTP
    /// client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            client: http::build_client(config)?,
            pool: Arc::new(Semaphore::new(config.max_connections)),
            timeout: Duration::from_secs(config.timeout_seconds),
            safe_search: config.safe_search,
            metrics: Arc::new(TracingMetrics),
        })
    }

    /// Report outcomes to `metrics` instead of the tracing sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query every engine in `engines` and wait for all of them.
    pub async fn dispatch(&self, query: &ParsedQuery, engines: &[Arc<Engine>]) -> DispatchOutcome {
        let base = BaseParams::for_query(query, self.safe_search);
        tracing::trace!(query = %query, engines = engines.len(), "dispatching");

        let calls = engines.iter().map(|engine| {
            let base = &base;
            async move {
                let started = Instant::now();
                let outcome = self.query_engine(engine, query, base).await;
                (Arc::clone(engine), outcome, started.elapsed())
            }
        });
        let settled = futures::future::join_all(calls).await;

        let mut outcome = DispatchOutcome::default();
        for (engine, result, elapsed) in settled {
            match result {
                Ok(results) => {
                    tracing::debug!(engine = %engine, count = results.len(), "engine returned results");
                    self.metrics.record_success(engine.name(), results.len(), elapsed);
                    outcome.results.push((engine, results));
                }
                Err(err) => {
                    tracing::warn!(engine = %engine, error = %err, "engine query failed");
                    self.metrics.record_error(engine.name(), &err);
                    outcome.errors.insert(engine.name().to_string(), err);
                }
            }
        }
        outcome
    }

    async fn query_engine(
        &self,
        engine: &Engine,
        query: &ParsedQuery,
        base: &BaseParams,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let spec = engine.build_request(query, base)?;

        let response = {
            let _permit = self
                .pool
                .acquire()
                .await
                .map_err(|_| SearchError::Transport("connection pool closed".into()))?;
            tokio::time::timeout(self.timeout, http::execute(&self.client, spec))
                .await
                .map_err(|_| {
                    SearchError::Timeout(format!("no response within {:?}", self.timeout))
                })??
        };

        engine.parse_response(&response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("available_connections", &self.pool.available_permits())
            .field("timeout", &self.timeout)
            .field("safe_search", &self.safe_search)
            .finish_non_exhaustive()
    }
}
