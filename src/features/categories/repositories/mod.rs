//! Persistence seam for categories.
//!
//! The hierarchy operations only talk to [`CategoryRepository`], never to a
//! concrete database, so the same traversal code runs against Postgres in
//! production and against the in-memory store in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::features::categories::error::StorageError;
use crate::features::categories::models::{Category, CategoryFilter, CategoryPatch, UpdateResult};

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgCategoryRepository;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Fetch a category by id, soft-deleted or not. `None` if absent.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StorageError>;

    /// Direct children of `parent` (`None` = top level), ordered by
    /// `(display_order, title)`.
    async fn find_by_parent(
        &self,
        parent: Option<Uuid>,
        include_deleted: bool,
    ) -> Result<Vec<Category>, StorageError>;

    /// Filtered page ordered by `(display_order, title)`
    async fn find(
        &self,
        filter: &CategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, StorageError>;

    /// Insert or replace by id, returning the stored row
    async fn save(&self, category: &Category) -> Result<Category, StorageError>;

    /// Erase one row. `false` when nothing was there to erase.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Apply `patch` to every row matching `filter`
    async fn update_many(
        &self,
        filter: &CategoryFilter,
        patch: &CategoryPatch,
    ) -> Result<UpdateResult, StorageError>;

    async fn count(&self, filter: &CategoryFilter) -> Result<u64, StorageError>;
}
