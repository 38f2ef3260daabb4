//! Probe service — one-shot outbound check against an endpoint's target.
//!
//! DESIGN
//! ======
//! A probe plays the role of the forwarding layer for a single request: it
//! records a hit (so credential selection and the usage ledger behave
//! exactly as they would for real traffic), then issues one GET to the
//! target with the injected headers and the chosen key attached. No
//! retries, no state.

use std::time::Instant;

use tracing::info;

use crate::model::{AuthConfig, KeyLocation};
use crate::services::hit::{self, HitError};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Hit(#[from] HitError),
    #[error("unknown path prefix: {0}")]
    UnknownPrefix(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProbeReport {
    /// The URL the probe actually requested.
    pub url: String,
    pub status: u16,
    pub elapsed_ms: u64,
}

// =============================================================================
// PROBE
// =============================================================================

/// Probe an endpoint's target through one of its configured prefixes.
///
/// # Errors
///
/// Propagates hit recording failures; `UnknownPrefix` if a prefix was
/// given that the endpoint does not configure; `Upstream` on transport
/// failure.
pub async fn probe_endpoint(
    state: &AppState,
    id: &str,
    prefix: Option<&str>,
    sub_path: Option<&str>,
) -> Result<ProbeReport, ProbeError> {
    let outcome = hit::record_hit(state, id).await?;
    let endpoint = outcome.endpoint;

    let prefix = match prefix {
        Some(p) => {
            if !endpoint.path_prefixes.iter().any(|known| known == p) {
                return Err(ProbeError::UnknownPrefix(p.to_owned()));
            }
            p.to_owned()
        }
        None => endpoint.path_prefixes.first().cloned().unwrap_or_default(),
    };

    let url = build_probe_url(&endpoint.target_url, &prefix, sub_path.unwrap_or(""));

    let mut request = reqwest::Client::new().get(&url);
    if let Some(headers) = &endpoint.headers_to_add {
        for (name, value) in headers {
            request = request.header(name, value);
        }
    }
    if let (Some(key), Some(AuthConfig::ApiKey { name, location, .. })) =
        (&outcome.chosen_key, &endpoint.auth_config)
    {
        request = match location {
            KeyLocation::Header => request.header(name, key),
            KeyLocation::Query => request.query(&[(name.as_str(), key.as_str())]),
        };
    }

    let started = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|e| ProbeError::Upstream(e.to_string()))?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let status = response.status().as_u16();
    info!(endpoint_id = %id, status, elapsed_ms, "probe completed");
    Ok(ProbeReport { url, status, elapsed_ms })
}

/// Join target, prefix, and optional sub path into the final probe URL.
///
/// A query string embedded in the prefix survives: the sub path is spliced
/// in front of the `?` rather than appended after it.
fn build_probe_url(target_url: &str, prefix: &str, sub_path: &str) -> String {
    let base = format!("{}{}", target_url.trim_end_matches('/'), prefix);
    let base = base.trim_end_matches('/');
    let sub = sub_path.trim_start_matches('/');

    if let Some((path, query)) = base.split_once('?') {
        if sub.is_empty() {
            base.to_owned()
        } else {
            format!("{path}/{sub}?{query}")
        }
    } else if sub.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{sub}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_target_and_prefix() {
        assert_eq!(
            build_probe_url("https://api.example.com", "/posts", ""),
            "https://api.example.com/posts"
        );
    }

    #[test]
    fn appends_sub_path() {
        assert_eq!(
            build_probe_url("https://api.example.com", "/posts", "1"),
            "https://api.example.com/posts/1"
        );
    }

    #[test]
    fn normalizes_slashes() {
        assert_eq!(
            build_probe_url("https://api.example.com/", "/posts/", "/1"),
            "https://api.example.com/posts/1"
        );
    }

    #[test]
    fn preserves_embedded_query_string() {
        assert_eq!(
            build_probe_url(
                "https://generativelanguage.googleapis.com",
                "/v1beta/models/gemini:streamGenerateContent?alt=sse",
                ""
            ),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn splices_sub_path_before_query() {
        assert_eq!(
            build_probe_url("https://api.example.com", "/search?limit=5", "users"),
            "https://api.example.com/search/users?limit=5"
        );
    }
}
