// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - The authenticated caller's profile
pub async fn whoami_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<UserProfile> {
    let profile = state.services.users.profile(&principal).await?;
    Ok(ApiResponse::success(profile))
}
