use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::Student;
use crate::handlers::protected::record_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{TransferStudent, UpdateStudent};

/// GET /api/students/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Student> {
    let id = record_id(path)?;
    Ok(ApiResponse::success(state.services.students.get(&principal, id).await?))
}

/// PUT /api/students/:id - Name and email only; use /transfer to move classrooms
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStudent>, JsonRejection>,
) -> ApiResult<Student> {
    let id = record_id(path)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.services.students.update(&principal, id, input).await?))
}

/// DELETE /api/students/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let id = record_id(path)?;
    state.services.students.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// PUT /api/students/:id/transfer - Input: `{ "classroom_id": "uuid" }`
pub async fn transfer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TransferStudent>, JsonRejection>,
) -> ApiResult<Student> {
    let id = record_id(path)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.services.students.transfer(&principal, id, input).await?))
}
