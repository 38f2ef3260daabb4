//! Hit recorder — the atomic usage update applied on every forwarded hit.
//!
//! DESIGN
//! ======
//! A hit is a read-select-mutate-persist sequence against one endpoint:
//! look the endpoint up, pick the first eligible key, stamp its ledger, and
//! save the whole endpoint back. The sequence runs under that endpoint's
//! lock so concurrent hits cannot both pick the last eligible key or lose a
//! ledger append. There is no I/O inside the critical section.
//!
//! ERROR HANDLING
//! ==============
//! Exhaustion is a policy signal, not a transient fault: on
//! `AllKeysRateLimited` nothing is mutated or persisted and no retry or
//! backoff happens here — the caller decides when to try again.

use tracing::info;

use crate::model::Endpoint;
use crate::rate_limit::now_ms;
use crate::selector::{self, SelectError};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HitError {
    #[error("endpoint not found: {0}")]
    NotFound(String),
    #[error("all API keys for endpoint '{0}' are currently rate-limited")]
    AllKeysRateLimited(String),
    #[error("hit recording timed out waiting for endpoint '{0}'")]
    Busy(String),
}

/// Result of a recorded hit: the persisted endpoint plus the credential the
/// caller should attach to the outbound request (absent when the endpoint
/// has no API key auth).
#[derive(Debug, Clone)]
pub struct HitOutcome {
    pub endpoint: Endpoint,
    pub chosen_key: Option<String>,
}

// =============================================================================
// RECORD
// =============================================================================

/// Record one hit against an endpoint at the current time.
///
/// # Errors
///
/// `NotFound` for an unknown id, `AllKeysRateLimited` when the whole pool
/// is exhausted, `Busy` if the endpoint lock cannot be acquired within the
/// bounded wait.
pub async fn record_hit(state: &AppState, id: &str) -> Result<HitOutcome, HitError> {
    record_hit_at(state, id, now_ms()).await
}

/// Record a hit with an explicit timestamp (for testing).
pub(crate) async fn record_hit_at(
    state: &AppState,
    id: &str,
    now_ms: u64,
) -> Result<HitOutcome, HitError> {
    let lock = state.hit_locks.for_endpoint(id);
    let Ok(_guard) = tokio::time::timeout(state.hit_locks.timeout(), lock.lock()).await else {
        return Err(HitError::Busy(id.to_owned()));
    };

    let mut endpoint = state
        .store
        .get(id)
        .await
        .ok_or_else(|| HitError::NotFound(id.to_owned()))?;

    let chosen = match endpoint.key_pool_mut() {
        None => None,
        Some(pool) if pool.is_empty() => None,
        Some(pool) => {
            // Pool is non-empty here, so the only selection failure left is
            // exhaustion. Nothing is persisted on that path: the stored
            // ledger stays exactly as it was.
            let index = selector::choose(pool, now_ms).map_err(|_: SelectError| {
                HitError::AllKeysRateLimited(id.to_owned())
            })?;
            let key = &mut pool[index];
            key.usage += 1;
            key.last_used = Some(now_ms);
            key.usage_history.push(now_ms);
            Some((index, key.value.clone()))
        }
    };

    match chosen {
        None => {
            // Nothing to rotate: a hit against `none` auth or an empty pool
            // is a no-op success and the endpoint is returned unchanged.
            info!(endpoint_id = %id, "hit recorded, no API key to rotate");
            Ok(HitOutcome { endpoint, chosen_key: None })
        }
        Some((index, value)) => {
            let endpoint = state.store.save(endpoint).await;
            info!(endpoint_id = %id, key_index = index, "hit recorded");
            Ok(HitOutcome { endpoint, chosen_key: Some(value) })
        }
    }
}

#[cfg(test)]
#[path = "hit_test.rs"]
mod tests;
