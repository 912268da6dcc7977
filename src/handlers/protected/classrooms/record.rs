use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::Classroom;
use crate::handlers::protected::record_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UpdateClassroom;

/// GET /api/classrooms/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Classroom> {
    let id = record_id(path)?;
    Ok(ApiResponse::success(state.services.classrooms.get(&principal, id).await?))
}

/// PUT /api/classrooms/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateClassroom>, JsonRejection>,
) -> ApiResult<Classroom> {
    let id = record_id(path)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.services.classrooms.update(&principal, id, input).await?))
}

/// DELETE /api/classrooms/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let id = record_id(path)?;
    state.services.classrooms.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
