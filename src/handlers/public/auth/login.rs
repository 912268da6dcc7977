// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AuthSession, LoginRequest};

/// POST /auth/login - Authenticate with email and password
///
/// Input: `{ "email": "string", "password": "string" }`
///
/// Output: `{ "success": true, "data": { "user": {...}, "token": "eyJ..." } }`
///
/// Unknown email or wrong password is 401, an inactive account 403.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthSession> {
    let Json(input) = payload?;
    let session = state.services.users.login(input).await?;
    Ok(ApiResponse::success(session))
}
