// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT → active user → active school (tenant admins)
// Route Prefix: /api
// Every handler receives the caller's `Principal` from request extensions
// and passes it to the services; authorization happens there.
pub mod auth;
pub mod classrooms;
pub mod schools;
pub mod students;
pub mod users;

use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Path, Query,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::Page;

/// Query string accepted by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub school_id: Option<Uuid>,
    pub classroom_id: Option<Uuid>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl ListQuery {
    pub fn page(&self) -> Page {
        Page { limit: self.limit, offset: self.offset }
    }
}

pub(crate) fn list_query(query: Result<Query<ListQuery>, QueryRejection>) -> Result<ListQuery, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::bad_request(format!("Invalid query parameters: {}", e.body_text())))
}

pub(crate) fn record_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid id: expected a UUID"))
}
