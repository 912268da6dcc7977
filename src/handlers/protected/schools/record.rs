use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::School;
use crate::handlers::protected::record_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SchoolInput;

/// GET /api/schools/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<School> {
    let id = record_id(path)?;
    Ok(ApiResponse::success(state.services.schools.get(&principal, id).await?))
}

/// PUT /api/schools/:id - Partial update; absent fields are left as they are
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SchoolInput>, JsonRejection>,
) -> ApiResult<School> {
    let id = record_id(path)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.services.schools.update(&principal, id, input).await?))
}

/// DELETE /api/schools/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let id = record_id(path)?;
    state.services.schools.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
