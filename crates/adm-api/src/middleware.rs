//! Bearer-token authentication middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::extractors::AppState;

/// Reject requests without a valid bearer token
///
/// On success the `CurrentUser` is stored in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = state
        .authenticator()
        .authenticate(header)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    tracing::debug!(user_id = user.id, "Authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
