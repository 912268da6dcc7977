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

/// Middleware that requires a tenant administrator's school to be active.
/// Global administrators pass through.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before school validation").into_parts())?;

    let Some(tenant) = principal.tenant_id() else {
        return Ok(next.run(request).await);
    };

    let school = state
        .store
        .schools
        .find_by_id(tenant.as_uuid())
        .await
        .map_err(|e| ApiError::from(e).into_parts())?
        .ok_or_else(|| {
            tracing::warn!("School validation failed: school {} not found or inactive", tenant);
            ApiError::forbidden("School is not active or does not exist").into_parts()
        })?;

    tracing::debug!("School validation successful: {} ({})", school.name, school.id);
    request.extensions_mut().insert(school);

    Ok(next.run(request).await)
}
