use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::repository::{Document, Repository, UniqueKey};
use crate::filter::{Filter, FilterMatcher};

/// In-process repository. Documents are kept in insertion order and queried
/// through their JSON form, so filters behave as they do against Postgres.
pub struct MemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self { records: RwLock::new(Vec::new()) }
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> MemoryRepository<T> {
    fn check_unique(records: &[T], candidate: &T) -> Result<(), DatabaseError> {
        for key in candidate.unique_keys() {
            if key.active_only && !candidate.is_active() {
                continue;
            }
            let clash = records
                .iter()
                .filter(|r| r.id() != candidate.id())
                .filter(|r| !key.active_only || r.is_active())
                .any(|r| r.unique_keys().iter().any(|other| same_key(&key, other)));
            if clash {
                return Err(DatabaseError::UniqueViolation(format!("{}_{}_key", T::TABLE, key.name)));
            }
        }
        Ok(())
    }

    fn documents(records: &[T]) -> Result<Vec<Value>, DatabaseError> {
        records.iter().map(|r| serde_json::to_value(r).map_err(DatabaseError::from)).collect()
    }

    async fn query(&self, filter: &Filter) -> Result<Vec<T>, DatabaseError> {
        let docs = {
            let records = self.records.read().await;
            Self::documents(&records)?
        };
        FilterMatcher::apply(filter, docs)?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(DatabaseError::from))
            .collect()
    }
}

fn same_key(a: &UniqueKey, b: &UniqueKey) -> bool {
    a.name == b.name && a.fields == b.fields
}

#[async_trait]
impl<T: Document> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(DatabaseError::UniqueViolation(format!("{}_pkey", T::TABLE)));
        }
        Self::check_unique(&records, &record)?;
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, DatabaseError> {
        let mut records = self.records.write().await;
        Self::check_unique(&records, &record)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, record.id())))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn select_any(&self, filter: Filter) -> Result<Vec<T>, DatabaseError> {
        self.query(&filter).await
    }

    // Paging does not apply, as with SELECT COUNT(*).
    async fn count(&self, filter: Filter) -> Result<i64, DatabaseError> {
        let matcher = FilterMatcher::new(&filter)?;
        let records = self.records.read().await;
        let docs = Self::documents(&records)?;
        Ok(docs.iter().filter(|d| matcher.matches(d)).count() as i64)
    }
}
