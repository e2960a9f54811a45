use crate::error::Result;
use crate::handlers::url::parse_json;
use crate::model::UserUrl;
use crate::owner::OwnerId;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use burrow_core::ShortToken;
use tracing::debug;

/// Live links of the caller; `204` when there are none.
pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Response> {
    let urls: Vec<UserUrl> = state
        .storage()
        .items_of_user(owner.as_str())
        .await?
        .into_iter()
        .filter(|record| !record.is_deleted())
        .map(|record| UserUrl {
            short_url: state.short_url(&record.token),
            original_url: record.original_url,
        })
        .collect();

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(urls).into_response())
}

/// Deletes the listed tokens owned by the caller. Tokens that are malformed,
/// unknown or owned by someone else are skipped.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<StatusCode> {
    let raw: Vec<String> = parse_json(&body)?;
    let tokens: Vec<ShortToken> = raw
        .iter()
        .filter_map(|token| match ShortToken::parse(token) {
            Ok(token) => Some(token),
            Err(err) => {
                debug!(error = %err, "skipping malformed token");
                None
            }
        })
        .collect();

    state.storage().delete(&tokens, owner.as_str()).await?;
    Ok(StatusCode::ACCEPTED)
}
