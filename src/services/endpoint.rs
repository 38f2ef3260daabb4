//! Endpoint service — CRUD, clone, and whole-collection import/export.
//!
//! DESIGN
//! ======
//! Endpoint ids are caller-supplied and immutable after creation. Import is
//! all-or-nothing: the incoming collection is validated in full before the
//! store is touched, so a rejected import never leaves a partial state.

use std::collections::HashSet;

use tracing::info;

use crate::model::Endpoint;
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint not found: {0}")]
    NotFound(String),
    #[error("endpoint already exists: {0}")]
    DuplicateId(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// CRUD
// =============================================================================

/// Fetch one endpoint by id.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn get_endpoint(state: &AppState, id: &str) -> Result<Endpoint, EndpointError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| EndpointError::NotFound(id.to_owned()))
}

/// Snapshot of the whole collection, in configured order.
pub async fn list_endpoints(state: &AppState) -> Vec<Endpoint> {
    state.store.list().await
}

/// Create a new endpoint.
///
/// # Errors
///
/// Returns `DuplicateId` if the id is taken, `InvalidConfig` if the
/// configuration violates an invariant.
pub async fn add_endpoint(state: &AppState, endpoint: Endpoint) -> Result<Endpoint, EndpointError> {
    endpoint.validate().map_err(EndpointError::InvalidConfig)?;
    if state.store.get(&endpoint.id).await.is_some() {
        return Err(EndpointError::DuplicateId(endpoint.id));
    }
    let saved = state.store.save(endpoint).await;
    info!(endpoint_id = %saved.id, "endpoint created");
    Ok(saved)
}

/// Replace an existing endpoint wholesale. The id is immutable: the body
/// must carry the same id the endpoint was created with.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, `InvalidConfig` on an id mismatch
/// or an invariant violation.
pub async fn update_endpoint(
    state: &AppState,
    id: &str,
    endpoint: Endpoint,
) -> Result<Endpoint, EndpointError> {
    if endpoint.id != id {
        return Err(EndpointError::InvalidConfig(format!(
            "endpoint id is immutable: expected '{id}', got '{}'",
            endpoint.id
        )));
    }
    endpoint.validate().map_err(EndpointError::InvalidConfig)?;
    if state.store.get(id).await.is_none() {
        return Err(EndpointError::NotFound(id.to_owned()));
    }
    let saved = state.store.save(endpoint).await;
    info!(endpoint_id = %id, "endpoint updated");
    Ok(saved)
}

/// Delete one endpoint.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn delete_endpoint(state: &AppState, id: &str) -> Result<(), EndpointError> {
    if !state.store.remove(id).await {
        return Err(EndpointError::NotFound(id.to_owned()));
    }
    info!(endpoint_id = %id, "endpoint deleted");
    Ok(())
}

// =============================================================================
// CLONE
// =============================================================================

/// Deep-copy an endpoint under the first free `-copy` id.
///
/// The copy keeps everything including key usage state, matching the
/// behavior of export-then-reimport of a single entry.
///
/// # Errors
///
/// Returns `NotFound` if the source id is unknown.
pub async fn clone_endpoint(state: &AppState, id: &str) -> Result<Endpoint, EndpointError> {
    let source = get_endpoint(state, id).await?;
    let taken: HashSet<String> = state
        .store
        .list()
        .await
        .into_iter()
        .map(|ep| ep.id)
        .collect();

    let mut new_id = format!("{id}-copy");
    let mut counter = 2;
    while taken.contains(&new_id) {
        new_id = format!("{id}-copy-{counter}");
        counter += 1;
    }

    let cloned = Endpoint { id: new_id, ..source };
    let saved = state.store.save(cloned).await;
    info!(source_id = %id, endpoint_id = %saved.id, "endpoint cloned");
    Ok(saved)
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

/// Ordered snapshot of the collection for export.
pub async fn export_config(state: &AppState) -> Vec<Endpoint> {
    state.store.list().await
}

/// Overwrite the whole collection from an untyped JSON document.
///
/// Returns the number of endpoints imported.
///
/// # Errors
///
/// Returns `InvalidConfig` if the document is not an array, an element does
/// not parse, or an element lacks a non-empty id/target_url (or repeats an
/// id). Nothing is applied on rejection.
pub async fn import_config(
    state: &AppState,
    value: serde_json::Value,
) -> Result<usize, EndpointError> {
    let serde_json::Value::Array(items) = value else {
        return Err(EndpointError::InvalidConfig(
            "configuration must be a JSON array of endpoints".to_owned(),
        ));
    };

    let mut endpoints = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let endpoint: Endpoint = serde_json::from_value(item).map_err(|e| {
            EndpointError::InvalidConfig(format!("element {index}: {e}"))
        })?;
        if endpoint.id.trim().is_empty() {
            return Err(EndpointError::InvalidConfig(format!(
                "element {index}: endpoint id must not be blank"
            )));
        }
        if endpoint.target_url.trim().is_empty() {
            return Err(EndpointError::InvalidConfig(format!(
                "element {index}: target_url must not be blank"
            )));
        }
        endpoints.push(endpoint);
    }

    let mut seen = HashSet::new();
    for endpoint in &endpoints {
        if !seen.insert(endpoint.id.clone()) {
            return Err(EndpointError::InvalidConfig(format!(
                "duplicate endpoint id: {}",
                endpoint.id
            )));
        }
    }

    let count = endpoints.len();
    state.store.replace_all(endpoints).await;
    info!(count, "configuration imported");
    Ok(count)
}

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;
