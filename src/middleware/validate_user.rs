use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use serde_json::Value;

use crate::app::AppState;
use crate::authz::Principal;
use crate::error::ApiError;

/// Middleware that re-loads the caller's account. The account must still be
/// active, and its role and school must match the token.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation").into_parts())?;

    let user = state
        .services
        .users
        .find_active(principal.user_id())
        .await
        .map_err(|e| ApiError::from(e).into_parts())?
        .ok_or_else(|| {
            tracing::warn!("User validation failed: user {} not found or inactive", principal.user_id());
            ApiError::unauthorized("User is not active or does not exist").into_parts()
        })?;

    // Verify that JWT claims match the stored account
    let current = user.principal().map_err(|e| ApiError::from(e).into_parts())?;
    if current != principal {
        tracing::warn!(
            "User validation failed: token for {} says {} / {:?}, account says {} / {:?}",
            user.id,
            principal.role(),
            principal.tenant_id(),
            current.role(),
            current.tenant_id()
        );
        return Err(ApiError::unauthorized("User access level changed, please log in again").into_parts());
    }

    tracing::debug!("User validation successful: {} ({})", user.username, user.role);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
