use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;

/// Healthy whenever the active backend answers its ping, whichever backend it is.
pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode> {
    state.storage().ping().await?;
    Ok(StatusCode::OK)
}
