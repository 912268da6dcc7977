use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData};

/// A uniqueness constraint a stored document takes part in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: &'static str,
    pub fields: Vec<(&'static str, String)>,
    /// Only active documents collide.
    pub active_only: bool,
}

impl UniqueKey {
    pub fn global(field: &'static str, value: &str) -> Self {
        Self { name: field, fields: vec![(field, value.to_string())], active_only: false }
    }

    pub fn active(name: &'static str, fields: &[(&'static str, String)]) -> Self {
        Self { name, fields: fields.to_vec(), active_only: true }
    }
}

/// A record type held in a collection (table).
pub trait Document:
    Clone + Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    /// Column holding the owning tenant's id.
    const TENANT_FIELD: &'static str;

    fn id(&self) -> Uuid;
    fn is_active(&self) -> bool;

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![]
    }

    fn filter(data: FilterData) -> Result<Filter, DatabaseError> {
        Ok(Filter::from_data(Self::TABLE, data)?)
    }
}

/// Storage for one document type. Queries exclude inactive documents
/// unless the filter asks for them.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    async fn insert(&self, record: T) -> Result<T, DatabaseError>;

    /// Replaces the stored document with the same id.
    async fn update(&self, record: T) -> Result<T, DatabaseError>;

    async fn select_any(&self, filter: Filter) -> Result<Vec<T>, DatabaseError>;

    async fn count(&self, filter: Filter) -> Result<i64, DatabaseError>;

    async fn select_one(&self, mut filter: Filter) -> Result<Option<T>, DatabaseError> {
        filter.limit(1, None)?;
        Ok(self.select_any(filter).await?.into_iter().next())
    }

    /// The active document with `id`, if any.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(T::filter(FilterData::with_where(json!({ "id": id })))?).await
    }
}
