use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{insert_document, update_document, QueryBuilder};
use crate::database::repository::{Document, Repository};
use crate::filter::Filter;

/// Postgres-backed repository. Unique constraints live in the schema as
/// indexes and surface as `DatabaseError::UniqueViolation`.
pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _phantom: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T: Document> Repository<T> for PgRepository<T> {
    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        let document = serde_json::to_value(&record)?;
        insert_document(&self.pool, T::TABLE, &document).await
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        let document = serde_json::to_value(&record)?;
        update_document(&self.pool, T::TABLE, record.id(), &document)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, record.id())))
    }

    async fn select_any(&self, filter: Filter) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(filter).select_all(&self.pool).await
    }

    async fn count(&self, filter: Filter) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(filter).count(&self.pool).await
    }
}
