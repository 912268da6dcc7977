use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{AsResource, ParentLookup, ResourceInstance, ResourceKind};
use crate::config::{DatabaseConfig, StoreBackend};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::memory::MemoryRepository;
use crate::database::models::{Classroom, School, Student, User};
use crate::database::postgres::PgRepository;
use crate::database::repository::{Document, Repository};

/// One repository per collection, all on the same backend.
#[derive(Clone)]
pub struct Store {
    pub schools: Arc<dyn Repository<School>>,
    pub classrooms: Arc<dyn Repository<Classroom>>,
    pub students: Arc<dyn Repository<Student>>,
    pub users: Arc<dyn Repository<User>>,
    pool: Option<PgPool>,
}

impl Store {
    pub fn memory() -> Self {
        Self {
            schools: Arc::new(MemoryRepository::new()),
            classrooms: Arc::new(MemoryRepository::new()),
            students: Arc::new(MemoryRepository::new()),
            users: Arc::new(MemoryRepository::new()),
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            schools: Arc::new(PgRepository::new(pool.clone())),
            classrooms: Arc::new(PgRepository::new(pool.clone())),
            students: Arc::new(PgRepository::new(pool.clone())),
            users: Arc::new(PgRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Opens the configured backend. Postgres gets its schema applied.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(Self::memory())
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(config).await?;
                DatabaseManager::apply_schema(&pool).await?;
                Ok(Self::postgres(pool))
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.pool {
            Some(pool) => DatabaseManager::health_check(pool).await,
            None => Ok(()),
        }
    }

    pub fn school_lookup(&self) -> RepositoryLookup<School> {
        RepositoryLookup::new(self.schools.clone())
    }

    pub fn classroom_lookup(&self) -> RepositoryLookup<Classroom> {
        RepositoryLookup::new(self.classrooms.clone())
    }
}

/// Parent lookup over a repository; only active documents are returned.
pub struct RepositoryLookup<T: Document> {
    repo: Arc<dyn Repository<T>>,
}

impl<T: Document> RepositoryLookup<T> {
    pub fn new(repo: Arc<dyn Repository<T>>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<T: Document + AsResource> ParentLookup for RepositoryLookup<T> {
    fn kind(&self) -> ResourceKind {
        T::resource_kind()
    }

    async fn find_active(&self, id: Uuid) -> anyhow::Result<Option<ResourceInstance>> {
        let found = self.repo.find_by_id(id).await?;
        Ok(found.filter(|r| r.is_active()).map(|r| r.to_instance()))
    }
}
