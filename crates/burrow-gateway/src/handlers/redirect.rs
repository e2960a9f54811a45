use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use burrow_core::ShortToken;

pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let token = ShortToken::parse(&token).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let original_url = state.storage().get(&token).await?;

    let location = HeaderValue::from_str(&original_url).map_err(|e| {
        AppError::Internal(format!("stored url for {token} is not a valid header: {e}"))
    })?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
}
