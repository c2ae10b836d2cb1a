use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::AddressRepository;
use crate::core::error::{AppError, Result};
use crate::features::addresses::models::Address;
use crate::shared::validation::escape_like;

const ADDRESS_COLUMNS: &str = r#"
    id, user_id, label, recipient_name, phone, line1, line2, city, state,
    postal_code, country, is_default, is_deleted, created_at, updated_at
"#;

const SEARCH_COLUMNS: [&str; 6] = ["label", "recipient_name", "line1", "line2", "city", "postal_code"];

/// Postgres-backed address store
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_owner_filter(builder: &mut QueryBuilder<'_, Postgres>, user_id: &str, search: Option<&str>) {
    builder.push(" WHERE is_deleted = FALSE AND user_id = ");
    builder.push_bind(user_id.to_string());

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (");
        for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*column);
            builder.push(" ILIKE ");
            builder.push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

/// Two writers racing to set a default trip `addresses_one_default_per_user`;
/// the loser gets a conflict it can retry instead of a server error.
fn default_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            tracing::warn!("Concurrent default address change rejected: {}", db.message());
            return AppError::Conflict(
                "Another default address was set at the same time, please retry".to_string(),
            );
        }
    }
    tracing::error!("Failed to write address: {:?}", e);
    AppError::Database(e)
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn find_owned(&self, id: Uuid, user_id: &str) -> Result<Option<Address>> {
        let sql = format!(
            "SELECT {} FROM addresses WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE",
            ADDRESS_COLUMNS
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get address by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(
        &self,
        user_id: &str,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>> {
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM addresses", ADDRESS_COLUMNS));
        push_owner_filter(&mut select, user_id, search);
        select.push(" ORDER BY is_default DESC, created_at DESC LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        select
            .build_query_as::<Address>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list addresses: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count(&self, user_id: &str, search: Option<&str>) -> Result<i64> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM addresses");
        push_owner_filter(&mut count, user_id, search);
        count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count addresses: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn insert(&self, address: &Address) -> Result<Address> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_default = TRUE")
                .bind(&address.user_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            r#"
            INSERT INTO addresses (
                id, user_id, label, recipient_name, phone, line1, line2, city, state,
                postal_code, country, is_default
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );
        let stored = sqlx::query_as::<_, Address>(&sql)
            .bind(address.id)
            .bind(&address.user_id)
            .bind(&address.label)
            .bind(&address.recipient_name)
            .bind(&address.phone)
            .bind(&address.line1)
            .bind(&address.line2)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.postal_code)
            .bind(&address.country)
            .bind(address.is_default)
            .fetch_one(&mut *tx)
            .await
            .map_err(default_write_error)?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn update(&self, address: &Address) -> Result<Option<Address>> {
        let sql = format!(
            r#"
            UPDATE addresses SET
                label = $3, recipient_name = $4, phone = $5, line1 = $6, line2 = $7,
                city = $8, state = $9, postal_code = $10, country = $11, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );
        sqlx::query_as::<_, Address>(&sql)
            .bind(address.id)
            .bind(&address.user_id)
            .bind(&address.label)
            .bind(&address.recipient_name)
            .bind(&address.phone)
            .bind(&address.line1)
            .bind(&address.line2)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.postal_code)
            .bind(&address.country)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update address: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn soft_delete(&self, id: Uuid, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE addresses SET is_deleted = TRUE, is_default = FALSE, updated_at = NOW() WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete address: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_default(&self, id: Uuid, user_id: &str) -> Result<Option<Address>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_default = TRUE AND id <> $2")
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "UPDATE addresses SET is_default = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE RETURNING {}",
            ADDRESS_COLUMNS
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(default_write_error)?;

        // Nothing to promote: dropping the transaction rolls the clear back
        if address.is_some() {
            tx.commit().await?;
        }
        Ok(address)
    }
}
