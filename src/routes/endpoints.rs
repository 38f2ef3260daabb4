//! Endpoint management routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};

use crate::model::Endpoint;
use crate::services::endpoint::{self, EndpointError};
use crate::state::AppState;

pub(crate) fn endpoint_error_to_status(err: EndpointError) -> StatusCode {
    match err {
        EndpointError::NotFound(_) => StatusCode::NOT_FOUND,
        EndpointError::DuplicateId(_) => StatusCode::CONFLICT,
        EndpointError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
    }
}

/// `GET /api/endpoints` — list the configured endpoints.
pub async fn list_endpoints(State(state): State<AppState>) -> Json<Vec<Endpoint>> {
    Json(endpoint::list_endpoints(&state).await)
}

/// `POST /api/endpoints` — create one endpoint.
pub async fn create_endpoint(
    State(state): State<AppState>,
    Json(body): Json<Endpoint>,
) -> Result<(StatusCode, Json<Endpoint>), StatusCode> {
    let created = endpoint::add_endpoint(&state, body)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/endpoints/:id` — fetch one endpoint.
pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Endpoint>, StatusCode> {
    let found = endpoint::get_endpoint(&state, &id)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok(Json(found))
}

/// `PUT /api/endpoints/:id` — replace one endpoint.
pub async fn update_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Endpoint>,
) -> Result<Json<Endpoint>, StatusCode> {
    let updated = endpoint::update_endpoint(&state, &id, body)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok(Json(updated))
}

/// `DELETE /api/endpoints/:id` — delete one endpoint.
pub async fn delete_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    endpoint::delete_endpoint(&state, &id)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `POST /api/endpoints/:id/clone` — duplicate under a fresh `-copy` id.
pub async fn clone_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Endpoint>), StatusCode> {
    let cloned = endpoint::clone_endpoint(&state, &id)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok((StatusCode::CREATED, Json(cloned)))
}

/// `GET /api/config/export` — download the whole collection as JSON.
pub async fn export_config(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let endpoints = endpoint::export_config(&state).await;
    let body = serde_json::to_string_pretty(&endpoints)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"proxyboard-config.json\"",
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, serde::Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// `POST /api/config/import` — overwrite the whole collection.
pub async fn import_config(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ImportResponse>, StatusCode> {
    let imported = endpoint::import_config(&state, body)
        .await
        .map_err(endpoint_error_to_status)?;
    Ok(Json(ImportResponse { imported }))
}

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod tests;
