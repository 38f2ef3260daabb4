//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the endpoint store behind its trait and a registry of per-endpoint
//! hit locks. The lock registry serializes the read-select-mutate-persist
//! sequence per endpoint id so concurrent hits cannot race on a key's
//! ledger; waits are bounded, never indefinite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::store::EndpointStore;

const DEFAULT_HIT_LOCK_TIMEOUT_MS: u64 = 2_000;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// HIT LOCKS
// =============================================================================

/// Per-endpoint mutex registry for hit recording.
///
/// Locks are created on first use and never evicted; the registry grows
/// with the number of distinct endpoint ids ever hit, which tracks the
/// configured collection size.
#[derive(Clone)]
pub struct HitLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    timeout: Duration,
}

impl HitLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            timeout: Duration::from_millis(env_parse(
                "HIT_LOCK_TIMEOUT_MS",
                DEFAULT_HIT_LOCK_TIMEOUT_MS,
            )),
        }
    }

    /// The lock guarding hit recording for one endpoint id.
    #[must_use]
    pub fn for_endpoint(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.to_owned()).or_default().clone()
    }

    /// Upper bound on how long a hit may wait for its endpoint lock.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HitLocks {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EndpointStore>,
    pub hit_locks: HitLocks,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self { store, hit_locks: HitLocks::new() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::model::{ApiKey, AuthConfig, Endpoint, KeyLocation, RateLimit};
    use crate::store::MemoryStore;

    /// Create a test `AppState` backed by a fresh in-memory store.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()))
    }

    /// Seed an endpoint into the store and return its id.
    pub async fn seed_endpoint(state: &AppState, endpoint: Endpoint) -> String {
        let saved = state.store.save(endpoint).await;
        saved.id
    }

    /// A bare endpoint with no auth.
    #[must_use]
    pub fn dummy_endpoint(id: &str) -> Endpoint {
        Endpoint {
            id: id.into(),
            path_prefixes: vec!["/posts".into()],
            target_url: "https://jsonplaceholder.typicode.com".into(),
            headers_to_add: None,
            auth_config: Some(AuthConfig::None),
            cors_config: None,
        }
    }

    /// An endpoint authenticating with the given key pool via query param.
    #[must_use]
    pub fn keyed_endpoint(id: &str, values: Vec<ApiKey>) -> Endpoint {
        Endpoint {
            auth_config: Some(AuthConfig::ApiKey {
                name: "key".into(),
                location: KeyLocation::Query,
                values,
            }),
            ..dummy_endpoint(id)
        }
    }

    /// A key capped at `rpm` requests per minute.
    #[must_use]
    pub fn rpm_key(value: &str, rpm: u64) -> ApiKey {
        ApiKey {
            rate_limit: Some(RateLimit {
                requests_per_minute: Some(rpm),
                ..RateLimit::default()
            }),
            ..ApiKey::new(value)
        }
    }
}
