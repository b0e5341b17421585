//! Shared HTTP transport with User-Agent rotation.
//!
//! Provides one configured [`reqwest::Client`] for every engine and the
//! function that turns a [`RequestSpec`] into a [`RawResponse`].

use crate::config::SearchConfig;
use crate::engine::{HttpMethod, RawResponse, RequestSpec};
use crate::error::SearchError;
use rand::seq::SliceRandom;

/// Realistic browser User-Agent strings.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build the shared [`reqwest::Client`].
///
/// The client has:
/// - No request timeout of its own; the dispatcher bounds each call
/// - At most `max_connections` idle connections kept per host
/// - Random User-Agent from the built-in rotation list (or custom if configured)
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_connections)
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const array
        .unwrap_or(USER_AGENTS[0])
}

/// Perform `spec` and read the whole body.
///
/// Non-2xx statuses are returned as responses; classifying them is left
/// to the caller.
///
/// # Errors
///
/// Returns [`SearchError::Timeout`] when reqwest reports a timeout and
/// [`SearchError::Transport`] for every other connection or body failure.
pub async fn execute(client: &reqwest::Client, spec: RequestSpec) -> Result<RawResponse, SearchError> {
    let mut builder = match spec.method {
        HttpMethod::Get => client.get(spec.url.clone()),
        HttpMethod::Post => client.post(spec.url.clone()),
    };
    for (name, value) in &spec.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(cookie) = spec.cookie_header() {
        builder = builder.header(reqwest::header::COOKIE, cookie);
    }
    if let Some(body) = &spec.body {
        builder = builder.body(body.clone());
    }

    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.map_err(transport_error)?;
    tracing::trace!(%url, status = status.as_u16(), bytes = body.len(), "upstream response read");

    Ok(RawResponse {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        url,
        body,
        request: spec,
    })
}

fn transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(err.to_string())
    } else {
        SearchError::Transport(err.to_string())
    }
}
