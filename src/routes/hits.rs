//! Hit recording, statistics, and probe routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::model::{ApiKey, Endpoint, LimitKind};
use crate::rate_limit::{self, now_ms};
use crate::services::hit::{self, HitError};
use crate::services::probe::{self, ProbeError, ProbeReport};
use crate::state::AppState;

pub(crate) fn hit_error_to_status(err: HitError) -> StatusCode {
    match err {
        HitError::NotFound(_) => StatusCode::NOT_FOUND,
        HitError::AllKeysRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        HitError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn probe_error_to_status(err: ProbeError) -> StatusCode {
    match err {
        ProbeError::Hit(inner) => hit_error_to_status(inner),
        ProbeError::UnknownPrefix(_) => StatusCode::BAD_REQUEST,
        ProbeError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

/// `POST /api/endpoints/:id/hit` — record one hit, rotating the key pool.
pub async fn record_hit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Endpoint>, StatusCode> {
    let outcome = hit::record_hit(&state, &id)
        .await
        .map_err(hit_error_to_status)?;
    Ok(Json(outcome.endpoint))
}

// =============================================================================
// STATS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct KeyStats {
    /// Masked key value; full secrets stay out of the stats surface.
    pub key: String,
    pub usage: u64,
    pub last_used: Option<u64>,
    pub in_last_minute: u64,
    pub in_last_hour: u64,
    pub in_last_day: u64,
    pub limited: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub id: String,
    pub keys: Vec<KeyStats>,
}

/// `GET /api/endpoints/:id/stats` — per-key sliding-window view.
pub async fn endpoint_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndpointStats>, StatusCode> {
    let endpoint = state.store.get(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let now = now_ms();

    let keys = endpoint
        .key_pool()
        .unwrap_or_default()
        .iter()
        .map(|key| KeyStats {
            key: mask_key(&key.value),
            usage: key.usage,
            last_used: key.last_used,
            in_last_minute: window_count(key, now, LimitKind::RequestsPerMinute),
            in_last_hour: window_count(key, now, LimitKind::RequestsPerHour),
            in_last_day: window_count(key, now, LimitKind::RequestsPerDay),
            limited: rate_limit::is_limited(key, now),
        })
        .collect();

    Ok(Json(EndpointStats { id: endpoint.id, keys }))
}

fn window_count(key: &ApiKey, now: u64, kind: LimitKind) -> u64 {
    rate_limit::count_within(&key.usage_history, now, kind.window_ms())
}

fn mask_key(value: &str) -> String {
    if value.len() <= 8 {
        "********".to_owned()
    } else {
        let prefix: String = value.chars().take(8).collect();
        format!("{prefix}…")
    }
}

// =============================================================================
// PROBE
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProbeBody {
    /// Which configured prefix to probe through; defaults to the first.
    pub prefix: Option<String>,
    /// Extra path appended behind the prefix.
    pub path: Option<String>,
}

/// `POST /api/endpoints/:id/probe` — one-shot GET against the target.
pub async fn probe_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProbeBody>, JsonRejection>,
) -> Result<Json<ProbeReport>, StatusCode> {
    // The body is optional: probing without one uses the first prefix.
    let body = body.map(|Json(inner)| inner).unwrap_or_default();
    let report = probe::probe_endpoint(&state, &id, body.prefix.as_deref(), body.path.as_deref())
        .await
        .map_err(probe_error_to_status)?;
    Ok(Json(report))
}

#[cfg(test)]
#[path = "hits_test.rs"]
mod tests;
