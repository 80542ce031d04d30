use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::users::UserRepository;
use crate::models::{CreateUserInput, UpdateUserInput, User, UserFilter};
use crate::store::StoreError;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("invalid input for field '{field}': {message}")]
    InvalidInput {
        field: &'static str,
        message: &'static str,
    },
    #[error("missing tenant context")]
    Unauthorized,
    #[error("user not found")]
    NotFound,
    #[error("email already registered for this tenant")]
    EmailAlreadyExists,
    #[error("failed to {action}: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl UserError {
    fn invalid(field: &'static str, message: &'static str) -> Self {
        UserError::InvalidInput { field, message }
    }

    fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| UserError::Store { action, source }
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        input: CreateUserInput,
    ) -> Result<User, UserError> {
        let tenant_id = require_tenant(ctx)?;
        let email = normalize_email(&input.email)?;
        let nom = required("nom", &input.nom)?;

        // Soft check; the unique key on the container catches the race.
        self.ensure_email_available(tenant_id, &email, None).await?;

        let user = User {
            tenant_id: tenant_id.to_string(),
            id: Uuid::now_v7().to_string(),
            email,
            nom,
            prenom: input.prenom.trim().to_string(),
        };

        self.repo.create(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => UserError::EmailAlreadyExists,
            source => UserError::Store {
                action: "create user",
                source,
            },
        })?;

        tracing::info!(tenant_id, user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, ctx: &RequestContext, id: &str) -> Result<User, UserError> {
        let tenant_id = require_tenant(ctx)?;
        let id = parse_id(id)?;

        let user = self
            .repo
            .get_by_id(tenant_id, &id)
            .await
            .map_err(UserError::store("get user"))?
            .ok_or(UserError::NotFound)?;

        if user.tenant_id != tenant_id {
            tracing::error!(
                requested_tenant = tenant_id,
                record_tenant = %user.tenant_id,
                user_id = %user.id,
                request_id = ctx.request_id.as_deref().unwrap_or("n/a"),
                operation_id = ctx.trace_id.as_deref().unwrap_or("n/a"),
                "Cross-tenant record returned by repository"
            );
            return Err(UserError::NotFound);
        }

        Ok(user)
    }

    pub async fn search_users(
        &self,
        ctx: &RequestContext,
        mut filter: UserFilter,
    ) -> Result<Vec<User>, UserError> {
        let tenant_id = require_tenant(ctx)?;

        filter.limit = match filter.limit {
            0 => DEFAULT_LIMIT,
            limit => limit.min(MAX_LIMIT),
        };
        filter.email = filter
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());
        filter.nom = filter
            .nom
            .map(|nom| nom.trim().to_string())
            .filter(|nom| !nom.is_empty());

        self.repo
            .search(tenant_id, &filter)
            .await
            .map_err(UserError::store("search users"))
    }

    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateUserInput,
    ) -> Result<User, UserError> {
        let email = input.email.as_deref().map(normalize_email).transpose()?;
        let nom = input.nom.as_deref().map(|nom| required("nom", nom)).transpose()?;

        let mut user = self.get_user(ctx, id).await?;

        if let Some(email) = email {
            if email != user.email {
                self.ensure_email_available(&user.tenant_id, &email, Some(user.id.as_str()))
                    .await?;
                user.email = email;
            }
        }
        if let Some(nom) = nom {
            user.nom = nom;
        }
        if let Some(prenom) = input.prenom {
            user.prenom = prenom.trim().to_string();
        }

        let updated = self.repo.update(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => UserError::EmailAlreadyExists,
            source => UserError::Store {
                action: "update user",
                source,
            },
        })?;
        if !updated {
            return Err(UserError::NotFound);
        }

        tracing::info!(tenant_id = %user.tenant_id, user_id = %user.id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, ctx: &RequestContext, id: &str) -> Result<(), UserError> {
        let tenant_id = require_tenant(ctx)?;
        let id = parse_id(id)?;

        let deleted = self
            .repo
            .delete(tenant_id, &id)
            .await
            .map_err(UserError::store("delete user"))?;
        if !deleted {
            return Err(UserError::NotFound);
        }

        tracing::info!(tenant_id, user_id = %id, "User deleted");
        Ok(())
    }

    async fn ensure_email_available(
        &self,
        tenant_id: &str,
        email: &str,
        except_id: Option<&str>,
    ) -> Result<(), UserError> {
        let filter = UserFilter {
            email: Some(email.to_string()),
            limit: 1,
            ..UserFilter::default()
        };
        let existing = self
            .repo
            .search(tenant_id, &filter)
            .await
            .map_err(UserError::store("check existing email"))?;

        if existing.iter().any(|user| Some(user.id.as_str()) != except_id) {
            return Err(UserError::EmailAlreadyExists);
        }
        Ok(())
    }
}

fn require_tenant(ctx: &RequestContext) -> Result<&str, UserError> {
    let tenant_id = ctx.tenant_id();
    if tenant_id.is_empty() {
        return Err(UserError::Unauthorized);
    }
    Ok(tenant_id)
}

/// Trimmed and lower-cased; must be non-empty and contain `@`.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(UserError::invalid("email", "cannot be empty"));
    }
    if !email.contains('@') {
        return Err(UserError::invalid("email", "invalid format"));
    }
    Ok(email)
}

fn required(field: &'static str, raw: &str) -> Result<String, UserError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(UserError::invalid(field, "cannot be empty"));
    }
    Ok(value.to_string())
}

/// Canonical hyphenated form of a well-formed UUID.
fn parse_id(raw: &str) -> Result<String, UserError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| UserError::invalid("id", "invalid UUID format"))
}
