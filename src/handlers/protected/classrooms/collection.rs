use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::Classroom;
use crate::handlers::protected::{list_query, ListQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CreateClassroom;

/// GET /api/classrooms?school_id= - `school_id` only narrows a superadmin's view
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Classroom>> {
    let query = list_query(query)?;
    let classrooms = state
        .services
        .classrooms
        .list(&principal, query.school_id, query.page())
        .await?;
    Ok(ApiResponse::success(classrooms))
}

/// POST /api/classrooms - `school_id` is required for a superadmin and
/// defaults to the caller's school otherwise
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateClassroom>, JsonRejection>,
) -> ApiResult<Classroom> {
    let Json(input) = payload?;
    let classroom = state.services.classrooms.create(&principal, input).await?;
    Ok(ApiResponse::created(classroom))
}
