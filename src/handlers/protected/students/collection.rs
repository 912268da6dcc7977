use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::Student;
use crate::handlers::protected::{list_query, ListQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CreateStudent;

/// GET /api/students?school_id=&classroom_id=
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Student>> {
    let query = list_query(query)?;
    let students = state
        .services
        .students
        .list(&principal, query.school_id, query.classroom_id, query.page())
        .await?;
    Ok(ApiResponse::success(students))
}

/// POST /api/students
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateStudent>, JsonRejection>,
) -> ApiResult<Student> {
    let Json(input) = payload?;
    let student = state.services.students.create(&principal, input).await?;
    Ok(ApiResponse::created(student))
}
