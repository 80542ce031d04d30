use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{validate_identifier, DocumentContainer, Order, Query, StoreError};

const MAX_IDENTIFIER_LEN: usize = 63;

/// Container backed by the shared `documents` table.
///
/// Documents of all containers share the table; `container` and
/// `partition_key` scope every statement.
pub struct PgContainer {
    pool: PgPool,
    name: String,
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

impl PgContainer {
    /// Open a container, creating a partial unique index for each unique key.
    pub async fn open(pool: PgPool, name: &str, unique_keys: &[&str]) -> Result<Self, StoreError> {
        validate_identifier("container name", name)?;

        for key in unique_keys {
            let index = unique_index_name(name, key)?;
            // Identifiers were validated above; they cannot be bound as parameters in DDL.
            let ddl = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{index}\"
                 ON documents (partition_key, (body ->> '{key}'))
                 WHERE container = '{name}'"
            );
            sqlx::query(&ddl).execute(&pool).await?;
            tracing::debug!(container = name, key, index = %index, "Unique key ensured");
        }

        Ok(Self {
            pool,
            name: name.to_string(),
        })
    }
}

/// Name of the index enforcing `key` in `container`. Identifiers cannot
/// contain `:`, so distinct pairs never share a name; names Postgres would
/// truncate are rejected.
pub fn unique_index_name(container: &str, key: &str) -> Result<String, StoreError> {
    validate_identifier("container name", container)?;
    validate_identifier("unique key", key)?;

    let index = format!("documents_uq:{container}:{key}");
    if index.len() > MAX_IDENTIFIER_LEN {
        return Err(StoreError::Invalid(format!(
            "index name for unique key '{key}' of container '{container}' exceeds \
             {MAX_IDENTIFIER_LEN} bytes"
        )));
    }
    Ok(index)
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(db_err.message().to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl DocumentContainer for PgContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (container, partition_key, id, body)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&self.name)
        .bind(partition_key)
        .bind(id)
        .bind(Json(document))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Value, StoreError> {
        let body = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT body FROM documents
             WHERE container = $1 AND partition_key = $2 AND id = $3",
        )
        .bind(&self.name)
        .bind(partition_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|Json(value)| value).ok_or(StoreError::NotFound)
    }

    async fn replace_item(
        &self,
        partition_key: &str,
        id: &str,
        document: Value,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = $4, updated_at = now()
             WHERE container = $1 AND partition_key = $2 AND id = $3",
        )
        .bind(&self.name)
        .bind(partition_key)
        .bind(id)
        .bind(Json(document))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_item(&self, partition_key: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE container = $1 AND partition_key = $2 AND id = $3",
        )
        .bind(&self.name)
        .bind(partition_key)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn query_items(
        &self,
        partition_key: &str,
        query: &Query,
    ) -> Result<Vec<Value>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE container = ");
        builder.push_bind(self.name.as_str());
        builder.push(" AND partition_key = ");
        builder.push_bind(partition_key);

        for predicate in query.predicates() {
            builder.push(" AND body -> ");
            builder.push_bind(predicate.field);
            builder.push(" = ");
            builder.push_bind(Json(predicate.value.clone()));
        }

        builder.push(match query.effective_order() {
            Order::NewestFirst => " ORDER BY seq DESC, id ASC",
            Order::OldestFirst => " ORDER BY seq ASC, id ASC",
        });

        if let Some(page) = query.page_spec() {
            builder.push(" OFFSET ");
            builder.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|Json(value)| value).collect())
    }
}
