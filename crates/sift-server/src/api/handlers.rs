//! Search API endpoint handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use serde_json::Value;
use sift_core::{SearchParams, SearchResult, StorageError};

use super::error::ApiError;
use super::state::AppState;

/// Run a search
///
/// Body: `{queries, search_type, top_k, alpha}`; response: `{results, total_found}`.
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchParams>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(params) = payload?;
    let result = state.engine.search_params(params).await?;
    Ok(Json(result))
}

/// Liveness plus document count
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let storage = state.engine.storage().clone();
    let documents = tokio::task::spawn_blocking(move || storage.count_documents())
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))??;

    let status = if documents == 0 { "empty" } else { "healthy" };

    Ok(Json(serde_json::json!({
        "status": status,
        "documents": documents,
        "model": state.engine.model_name(),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
