//! Anonymous owner identity carried in the `userID` cookie.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::state::AppState;

pub const OWNER_COOKIE: &str = "userID";

/// Owner of the current request, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attaches an [`OwnerId`] to every request.
///
/// The id comes from the `userID` cookie; a request without one gets a freshly
/// generated id. The response always echoes the cookie back.
pub async fn identify_owner(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let owner = match owner_from_cookies(request.headers()) {
        Some(id) => id,
        None => {
            let id = state.generator().generate().into_inner();
            debug!(owner = %id, "issued new owner id");
            id
        }
    };

    let cookie = HeaderValue::from_str(&format!("{OWNER_COOKIE}={owner}; Path=/"));
    request.extensions_mut().insert(OwnerId(owner));

    let mut response = next.run(request).await;
    if let Ok(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn owner_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == OWNER_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
