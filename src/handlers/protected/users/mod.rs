// handlers/protected/users/mod.rs - POST /api/users handler

use axum::extract::{rejection::JsonRejection, Extension, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AuthSession, CreateUser};

/// POST /api/users - Create an administrator account (superadmin only)
///
/// Input: `{ "username", "email", "password", "role": "superadmin" | "school_admin", "school_id"? }`
///
/// Returns the new account with a token for it.
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let Json(input) = payload?;
    let session = state.services.users.create(&principal, input).await?;
    Ok(ApiResponse::created(session))
}
