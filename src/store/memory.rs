use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{DocumentContainer, Order, Query, StoreError};

struct StoredDocument {
    seq: u64,
    body: Value,
}

type Partition = HashMap<String, StoredDocument>;

/// In-process container. Each partition is locked as a unit, so the unique
/// key check and the write it guards are atomic.
pub struct MemoryContainer {
    name: String,
    unique_keys: Vec<String>,
    partitions: DashMap<String, Partition>,
    sequence: AtomicU64,
}

impl MemoryContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_keys: Vec::new(),
            partitions: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_unique_keys(mut self, keys: &[&str]) -> Self {
        self.unique_keys = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_unique(
        &self,
        partition: &Partition,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError> {
        for key in &self.unique_keys {
            let Some(value) = document.get(key.as_str()) else {
                continue;
            };
            let taken = partition
                .iter()
                .any(|(other_id, other)| other_id != id && other.body.get(key.as_str()) == Some(value));
            if taken {
                return Err(StoreError::Conflict(format!(
                    "unique key '{key}' already used in partition"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError> {
        let mut partition = self
            .partitions
            .entry(partition_key.to_string())
            .or_default();

        if partition.contains_key(id) {
            return Err(StoreError::Conflict(format!(
                "document '{id}' already exists in partition"
            )));
        }
        self.check_unique(&partition, id, &document)?;

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        partition.insert(id.to_string(), StoredDocument { seq, body: document });
        Ok(())
    }

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Value, StoreError> {
        self.partitions
            .get(partition_key)
            .and_then(|partition| partition.get(id).map(|doc| doc.body.clone()))
            .ok_or(StoreError::NotFound)
    }

    async fn replace_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError> {
        let mut partition = self
            .partitions
            .get_mut(partition_key)
            .ok_or(StoreError::NotFound)?;

        if !partition.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        self.check_unique(&partition, id, &document)?;

        if let Some(existing) = partition.get_mut(id) {
            existing.body = document;
        }
        Ok(())
    }

    async fn delete_item(&self, partition_key: &str, id: &str) -> Result<(), StoreError> {
        let mut partition = self
            .partitions
            .get_mut(partition_key)
            .ok_or(StoreError::NotFound)?;
        partition.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn query_items(
        &self,
        partition_key: &str,
        query: &Query,
    ) -> Result<Vec<Value>, StoreError> {
        let Some(partition) = self.partitions.get(partition_key) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<(&String, &StoredDocument)> = partition
            .iter()
            .filter(|(_, doc)| query.matches(&doc.body))
            .collect();

        match query.effective_order() {
            Order::NewestFirst => {
                matching.sort_by(|a, b| b.1.seq.cmp(&a.1.seq).then_with(|| a.0.cmp(b.0)));
            }
            Order::OldestFirst => {
                matching.sort_by(|a, b| a.1.seq.cmp(&b.1.seq).then_with(|| a.0.cmp(b.0)));
            }
        }

        let (offset, limit) = query.page_spec().map_or((0, usize::MAX), |page| {
            (
                usize::try_from(page.offset).unwrap_or(usize::MAX),
                usize::try_from(page.limit).unwrap_or(usize::MAX),
            )
        });

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, doc)| doc.body.clone())
            .collect())
    }
}
