use std::sync::Arc;
use uuid::Uuid;

use crate::authz::AuthzEngine;
use crate::config::AppConfig;
use crate::database::models::{Classroom, School};
use crate::database::Store;
use crate::services::{CreateClassroom, CreateStudent, CreateUser, SchoolInput};

/// Engine over the embedded default hierarchy.
pub fn engine() -> Arc<AuthzEngine> {
    let registry = AppConfig::development()
        .load_hierarchy()
        .expect("embedded hierarchy must load");
    Arc::new(AuthzEngine::new(registry))
}

pub fn school_input(email: &str) -> SchoolInput {
    SchoolInput {
        name: Some("Springfield Elementary".to_string()),
        address: Some("19 Plympton Street".to_string()),
        email: Some(email.to_string()),
        phone: None,
    }
}

pub fn classroom_input(school_id: Option<Uuid>, name: &str) -> CreateClassroom {
    CreateClassroom {
        school_id,
        name: Some(name.to_string()),
        capacity: Some(30),
        resources: Some(vec!["projector".to_string()]),
    }
}

pub fn student_input(school_id: Option<Uuid>, classroom_id: Option<Uuid>, email: &str) -> CreateStudent {
    CreateStudent {
        school_id,
        classroom_id,
        name: Some("Bart Simpson".to_string()),
        email: Some(email.to_string()),
    }
}

pub fn user_input(username: &str, email: &str, role: &str, school_id: Option<Uuid>) -> CreateUser {
    CreateUser {
        username: Some(username.to_string()),
        email: Some(email.to_string()),
        password: Some("Admin@1234".to_string()),
        role: Some(role.to_string()),
        school_id,
    }
}

/// Writes a school straight to the store, bypassing the services.
pub async fn seed_school(store: &Store, email: &str) -> School {
    let school = School::new(
        "Springfield Elementary".to_string(),
        "19 Plympton Street".to_string(),
        email.to_string(),
        None,
    );
    store.schools.insert(school).await.expect("seed school")
}

pub async fn seed_classroom(store: &Store, school: &School, name: &str) -> Classroom {
    let classroom = Classroom::new(school.tenant_id(), name.to_string(), 30, vec![]);
    store.classrooms.insert(classroom).await.expect("seed classroom")
}
