use serde::{Deserialize, Serialize};

use crate::store::Entity;

/// JSON field holding the partition key of a user document.
pub const TENANT_FIELD: &str = "tenantID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    pub id: String,
    pub email: String,
    pub nom: String,
    pub prenom: String,
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

/// Client-supplied fields for a new user. Identity fields (`id`,
/// `tenantID`) are not part of it and are dropped if sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub prenom: String,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub nom: Option<String>,
    pub prenom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub email: Option<String>,
    pub nom: Option<String>,
    pub offset: u64,
    pub limit: u64,
}
