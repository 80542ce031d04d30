//! Partitioned document storage.
//!
//! A [`DocumentContainer`] is the raw store: JSON documents grouped by
//! partition key. [`DocumentStore`] sits on top of a container and maps any
//! [`Entity`] to and from those documents.

pub mod adapter;
pub mod memory;
pub mod postgres;
pub mod query;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use adapter::DocumentStore;
pub use memory::MemoryContainer;
pub use postgres::PgContainer;
pub use query::{Order, Page, Predicate, Query};

/// A type that can be stored generically.
///
/// `tenant_id` is used as the partition key, so every document lives in
/// exactly one tenant's partition.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    fn id(&self) -> &str;
    fn tenant_id(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("document conflict: {0}")]
    Conflict(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid store request: {0}")]
    Invalid(String),
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Raw access to a container of JSON documents partitioned by key.
///
/// `create_item` and `replace_item` fail with [`StoreError::Conflict`] when
/// a unique key of the container would be violated within the partition.
/// `read_item`, `replace_item` and `delete_item` fail with
/// [`StoreError::NotFound`] when the id is absent from the partition.
#[async_trait]
pub trait DocumentContainer: Send + Sync {
    fn name(&self) -> &str;

    async fn create_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError>;

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Value, StoreError>;

    async fn replace_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError>;

    async fn delete_item(&self, partition_key: &str, id: &str) -> Result<(), StoreError>;

    async fn query_items(&self, partition_key: &str, query: &Query)
        -> Result<Vec<Value>, StoreError>;
}

pub type SharedContainer = Arc<dyn DocumentContainer>;

/// Container and unique key names end up in SQL identifiers.
pub(crate) fn validate_identifier(kind: &str, value: &str) -> Result<(), StoreError> {
    let valid = !value.is_empty()
        && value.len() <= 40
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!(
            "{kind} '{value}' must be 1-40 ASCII letters, digits or underscores"
        )))
    }
}
