use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::CategoryRepository;
use crate::features::categories::error::StorageError;
use crate::features::categories::models::{
    Category, CategoryFilter, CategoryPatch, ParentFilter, UpdateResult,
};
use crate::shared::validation::escape_like;

const CATEGORY_COLUMNS: &str = "id, parent_id, title, slug, description, status, is_featured, \
     display_order, visibility, is_deleted, tags, created_by, updated_by, created_at, updated_at";

/// Postgres-backed category store
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append `AND ...` clauses for every constraint in `filter`.
/// The builder must already end in a `WHERE TRUE` (or equivalent) clause.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CategoryFilter) {
    if let Some(ids) = &filter.ids {
        qb.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }

    match filter.parent {
        Some(ParentFilter::Root) => {
            qb.push(" AND parent_id IS NULL");
        }
        Some(ParentFilter::Of(parent_id)) => {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
        None => {}
    }

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }

    if let Some(is_featured) = filter.is_featured {
        qb.push(" AND is_featured = ").push_bind(is_featured);
    }

    if let Some(visibility) = filter.visibility {
        qb.push(" AND visibility = ").push_bind(visibility);
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search.trim()));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR slug ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ")
            .push_bind(pattern)
            .push("))");
    }

    if !filter.include_deleted {
        qb.push(" AND is_deleted = FALSE");
    }
}

/// `UPDATE` applying `patch` to rows matching `filter`. Rows already in the
/// target state are matched but left alone, so `rows_affected` counts real
/// changes only.
fn bulk_update_query<'a>(filter: &CategoryFilter, patch: &CategoryPatch) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
    if let Some(status) = patch.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(is_deleted) = patch.is_deleted {
        qb.push(", is_deleted = ").push_bind(is_deleted);
    }
    if let Some(updated_by) = &patch.updated_by {
        qb.push(", updated_by = ").push_bind(updated_by.clone());
    }

    qb.push(" WHERE TRUE");
    push_filter(&mut qb, filter);

    qb.push(" AND (FALSE");
    if let Some(status) = patch.status {
        qb.push(" OR status IS DISTINCT FROM ").push_bind(status);
    }
    if let Some(is_deleted) = patch.is_deleted {
        qb.push(" OR is_deleted IS DISTINCT FROM ").push_bind(is_deleted);
    }
    qb.push(")");
    qb
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StorageError> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category {}: {:?}", id, e);
                StorageError::from(e)
            })?;

        Ok(category)
    }

    async fn find_by_parent(
        &self,
        parent: Option<Uuid>,
        include_deleted: bool,
    ) -> Result<Vec<Category>, StorageError> {
        let filter = CategoryFilter {
            parent: Some(parent.into()),
            include_deleted,
            ..CategoryFilter::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM categories WHERE TRUE",
            CATEGORY_COLUMNS
        ));
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY display_order, title");

        qb.build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list children of {:?}: {:?}", parent, e);
                StorageError::from(e)
            })
    }

    async fn find(
        &self,
        filter: &CategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, StorageError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM categories WHERE TRUE",
            CATEGORY_COLUMNS
        ));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY display_order, title LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        qb.build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                StorageError::from(e)
            })
    }

    async fn save(&self, category: &Category) -> Result<Category, StorageError> {
        let sql = format!(
            r#"
            INSERT INTO categories (
                id, parent_id, title, slug, description, status, is_featured,
                display_order, visibility, is_deleted, tags, created_by, updated_by,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            ON CONFLICT (id) DO UPDATE SET
                parent_id = EXCLUDED.parent_id,
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                is_featured = EXCLUDED.is_featured,
                display_order = EXCLUDED.display_order,
                visibility = EXCLUDED.visibility,
                is_deleted = EXCLUDED.is_deleted,
                tags = EXCLUDED.tags,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.parent_id)
            .bind(&category.title)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.status)
            .bind(category.is_featured)
            .bind(category.display_order)
            .bind(category.visibility)
            .bind(category.is_deleted)
            .bind(&category.tags)
            .bind(&category.created_by)
            .bind(&category.updated_by)
            .bind(category.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save category {}: {:?}", category.id, e);
                StorageError::from(e)
            })
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete category {}: {:?}", id, e);
                StorageError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_many(
        &self,
        filter: &CategoryFilter,
        patch: &CategoryPatch,
    ) -> Result<UpdateResult, StorageError> {
        let matched_count = self.count(filter).await?;

        if patch.status.is_none() && patch.is_deleted.is_none() {
            return Ok(UpdateResult {
                matched_count,
                modified_count: 0,
            });
        }

        let mut qb = bulk_update_query(filter, patch);
        let result = qb.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to bulk update categories: {:?}", e);
            StorageError::from(e)
        })?;

        Ok(UpdateResult {
            matched_count,
            modified_count: result.rows_affected(),
        })
    }

    async fn count(&self, filter: &CategoryFilter) -> Result<u64, StorageError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM categories WHERE TRUE");
        push_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count categories: {:?}", e);
                StorageError::from(e)
            })?;

        Ok(count.max(0) as u64)
    }
}
