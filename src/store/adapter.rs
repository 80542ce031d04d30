use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use super::{Entity, Query, SharedContainer, StoreError};

/// Typed access to a container for one entity type.
///
/// Every container call is bounded by `timeout`; an expired call is a
/// [`StoreError::Timeout`], never a not-found.
pub struct DocumentStore<T> {
    container: SharedContainer,
    timeout: Duration,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            timeout: self.timeout,
            entity: PhantomData,
        }
    }
}

impl<T: Entity> DocumentStore<T> {
    pub fn new(container: SharedContainer, timeout: Duration) -> Self {
        Self {
            container,
            timeout,
            entity: PhantomData,
        }
    }

    /// Insert into the partition of `item.tenant_id()`.
    pub async fn create(&self, item: &T) -> Result<(), StoreError> {
        let document = Self::to_document(item)?;
        self.bounded(
            self.container
                .create_item(item.tenant_id(), item.id(), document),
        )
        .await
    }

    pub async fn read(&self, id: &str, partition_key: &str) -> Result<T, StoreError> {
        let document = self
            .bounded(self.container.read_item(partition_key, id))
            .await?;
        Ok(serde_json::from_value(document)?)
    }

    /// Full replace of an existing document.
    pub async fn update(&self, item: &T) -> Result<(), StoreError> {
        let document = Self::to_document(item)?;
        self.bounded(
            self.container
                .replace_item(item.tenant_id(), item.id(), document),
        )
        .await
    }

    pub async fn delete(&self, id: &str, partition_key: &str) -> Result<(), StoreError> {
        self.bounded(self.container.delete_item(partition_key, id))
            .await
    }

    pub async fn search(&self, query: &Query, partition_key: &str) -> Result<Vec<T>, StoreError> {
        query.validate()?;
        let documents = self
            .bounded(self.container.query_items(partition_key, query))
            .await?;

        documents
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(StoreError::from)
    }

    fn to_document(item: &T) -> Result<serde_json::Value, StoreError> {
        if item.id().is_empty() {
            return Err(StoreError::Invalid("document id is empty".to_string()));
        }
        if item.tenant_id().is_empty() {
            return Err(StoreError::Invalid("partition key is empty".to_string()));
        }
        Ok(serde_json::to_value(item)?)
    }

    async fn bounded<R>(
        &self,
        call: impl Future<Output = Result<R, StoreError>>,
    ) -> Result<R, StoreError> {
        tokio::time::timeout(self.timeout, call).await.map_err(|_| {
            tracing::warn!(
                container = self.container.name(),
                timeout_ms = self.timeout.as_millis(),
                "Store call timed out"
            );
            StoreError::Timeout(self.timeout)
        })?
    }
}
