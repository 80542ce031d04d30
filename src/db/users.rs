use crate::models::user::TENANT_FIELD;
use crate::models::{User, UserFilter};
use crate::store::{DocumentStore, Query, StoreError};

/// Fields that must be unique within a tenant's partition of the users container.
pub const UNIQUE_KEYS: &[&str] = &["email"];

#[derive(Clone)]
pub struct UserRepository {
    store: DocumentStore<User>,
}

impl UserRepository {
    pub fn new(store: DocumentStore<User>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.store.create(user).await
    }

    /// `None` when the user does not exist in the tenant's partition.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<User>, StoreError> {
        match self.store.read(id, tenant_id).await {
            Ok(user) if user.id.is_empty() => Ok(None),
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Search within one tenant. The tenant predicate always comes first and
    /// cannot be left out by the filter.
    pub async fn search(&self, tenant_id: &str, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let mut query = Query::new().filter(TENANT_FIELD, tenant_id);

        if let Some(nom) = &filter.nom {
            query = query.filter("nom", nom.as_str());
        }
        if let Some(email) = &filter.email {
            query = query.filter("email", email.as_str());
        }
        if filter.limit > 0 {
            query = query.page(filter.offset, filter.limit);
        }

        self.store.search(&query, tenant_id).await
    }

    /// Returns `false` when the user does not exist.
    pub async fn update(&self, user: &User) -> Result<bool, StoreError> {
        match self.store.update(user).await {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Returns `false` when the user does not exist.
    pub async fn delete(&self, tenant_id: &str, id: &str) -> Result<bool, StoreError> {
        match self.store.delete(id, tenant_id).await {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
