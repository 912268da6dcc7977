pub mod classroom_service;
pub mod error;
pub mod school_service;
pub mod student_service;
pub mod user_service;
pub mod validate;

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::config;
use crate::authz::AuthzEngine;
use crate::database::{Document, Store};
use crate::filter::{Filter, FilterData};

pub use classroom_service::{ClassroomService, CreateClassroom, UpdateClassroom};
pub use error::{ServiceError, ServiceResult};
pub use school_service::{SchoolInput, SchoolService};
pub use student_service::{CreateStudent, StudentService, TransferStudent, UpdateStudent};
pub use user_service::{AuthSession, CreateUser, LoginRequest, UserService};

/// Paging requested by a list call.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl Page {
    /// A filter for `T` with `conditions`, ordered by creation time. The page
    /// size defaults to, and is capped at, `filter.max_limit`.
    fn filter<T: Document>(&self, conditions: Option<Value>) -> ServiceResult<Filter> {
        let data = FilterData {
            where_clause: conditions,
            order: Some(json!("created_at asc")),
            limit: config().clamp_limit(self.limit),
            offset: self.offset,
            ..Default::default()
        };
        Ok(T::filter(data)?)
    }
}

/// Every resource service, sharing one engine and store.
#[derive(Clone)]
pub struct Services {
    pub schools: Arc<SchoolService>,
    pub classrooms: Arc<ClassroomService>,
    pub students: Arc<StudentService>,
    pub users: Arc<UserService>,
}

impl Services {
    pub fn new(engine: Arc<AuthzEngine>, store: Store, keys: JwtKeys) -> Self {
        Self {
            schools: Arc::new(SchoolService::new(engine.clone(), store.clone())),
            classrooms: Arc::new(ClassroomService::new(engine.clone(), store.clone())),
            students: Arc::new(StudentService::new(engine.clone(), store.clone())),
            users: Arc::new(UserService::new(engine, store, keys)),
        }
    }
}
