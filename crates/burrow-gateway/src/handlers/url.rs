use crate::error::{AppError, Result};
use crate::model::{BatchRequestItem, BatchResponseItem, ShortenRequest, ShortenResponse};
use crate::owner::OwnerId;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use burrow_core::StorageError;
use serde::de::DeserializeOwned;
use tracing::debug;

/// `POST /` with the URL as a plain-text body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: String,
) -> Result<(StatusCode, String)> {
    shorten(&state, &owner, &body).await
}

/// `POST /api/shorten` with `{"url": ".."}`.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<(StatusCode, Json<ShortenResponse>)> {
    let request: ShortenRequest = parse_json(&body)?;
    let (status, result) = shorten(&state, &owner, &request.url).await?;
    Ok((status, Json(ShortenResponse { result })))
}

/// `POST /api/shorten/batch`. URLs that are already shortened resolve to
/// their existing short URL.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<BatchResponseItem>>)> {
    let items: Vec<BatchRequestItem> = parse_json(&body)?;
    if items.is_empty() {
        return Err(AppError::BadRequest("batch is empty".to_string()));
    }

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let (_, short_url) = shorten(&state, &owner, &item.original_url).await?;
        results.push(BatchResponseItem {
            correlation_id: item.correlation_id,
            short_url,
        });
    }

    Ok((StatusCode::CREATED, Json(results)))
}

/// Stores `url` exactly as received; only blank input is rejected.
async fn shorten(state: &AppState, owner: &OwnerId, url: &str) -> Result<(StatusCode, String)> {
    if url.trim().is_empty() {
        return Err(AppError::BadRequest("url must not be empty".to_string()));
    }

    match state.storage().add(url, owner.as_str()).await {
        Ok(token) => {
            debug!(token = %token, owner = owner.as_str(), "url shortened");
            Ok((StatusCode::CREATED, state.short_url(&token)))
        }
        Err(StorageError::DuplicateUrl(existing)) => {
            Ok((StatusCode::CONFLICT, state.short_url(&existing)))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid json: {e}")))
}
