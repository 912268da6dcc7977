use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::database::models::School;
use crate::handlers::protected::{list_query, ListQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SchoolInput;

/// GET /api/schools - Schools visible to the caller
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<School>> {
    let query = list_query(query)?;
    let schools = state.services.schools.list(&principal, query.page()).await?;
    Ok(ApiResponse::success(schools))
}

/// POST /api/schools - Create a school (superadmin only)
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<SchoolInput>, JsonRejection>,
) -> ApiResult<School> {
    let Json(input) = payload?;
    let school = state.services.schools.create(&principal, input).await?;
    Ok(ApiResponse::created(school))
}
