//! In-memory [`CategoryRepository`] used by the test suites.
//!
//! Mirrors the Postgres constraints that matter to the hierarchy code:
//! unique titles, parent references must resolve, and a row with children
//! cannot be erased. Deletes can be rationed to simulate an outage midway
//! through a cascade.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::CategoryRepository;
use crate::features::categories::error::StorageError;
use crate::features::categories::models::{
    Category, CategoryFilter, CategoryPatch, ParentFilter, UpdateResult,
};

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    rows: RwLock<HashMap<Uuid, Category>>,
    delete_budget: Mutex<Option<usize>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rows as-is, bypassing every constraint (used to plant corrupted graphs)
    pub async fn insert_raw(&self, categories: impl IntoIterator<Item = Category>) {
        let mut rows = self.rows.write().await;
        for category in categories {
            rows.insert(category.id, category);
        }
    }

    /// Allow `n` more successful deletes, then report the store as unavailable
    pub fn fail_deletes_after(&self, n: usize) {
        *self.delete_budget.lock().unwrap() = Some(n);
    }

    pub async fn snapshot(&self) -> Vec<Category> {
        self.rows.read().await.values().cloned().collect()
    }
}

fn matches(filter: &CategoryFilter, category: &Category) -> bool {
    if !filter.include_deleted && category.is_deleted {
        return false;
    }
    if let Some(ids) = &filter.ids {
        if !ids.contains(&category.id) {
            return false;
        }
    }
    match filter.parent {
        Some(ParentFilter::Root) if category.parent_id.is_some() => return false,
        Some(ParentFilter::Of(parent_id)) if category.parent_id != Some(parent_id) => return false,
        _ => {}
    }
    if filter.status.is_some_and(|s| s != category.status) {
        return false;
    }
    if filter.is_featured.is_some_and(|f| f != category.is_featured) {
        return false;
    }
    if filter.visibility.is_some_and(|v| v != category.visibility) {
        return false;
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let needle = search.trim().to_lowercase();
        let hit = category.title.to_lowercase().contains(&needle)
            || category.slug.to_lowercase().contains(&needle)
            || category.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

/// True when applying `patch` to `category` would change a tracked field
fn patch_changes(patch: &CategoryPatch, category: &Category) -> bool {
    patch.status.is_some_and(|s| s != category.status)
        || patch.is_deleted.is_some_and(|d| d != category.is_deleted)
}

/// `(display_order, title)` with case folded first, close to a Postgres
/// linguistic collation
fn sorted(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.title.cmp(&b.title))
    });
    categories
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
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
        let rows = self.rows.read().await;
        Ok(sorted(
            rows.values()
                .filter(|c| matches(&filter, c))
                .cloned()
                .collect(),
        ))
    }

    async fn find(
        &self,
        filter: &CategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>, StorageError> {
        let rows = self.rows.read().await;
        let all = sorted(rows.values().filter(|c| matches(filter, c)).cloned().collect());
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn save(&self, category: &Category) -> Result<Category, StorageError> {
        let mut rows = self.rows.write().await;

        if rows
            .values()
            .any(|c| c.id != category.id && c.title == category.title)
        {
            return Err(StorageError::Conflict(format!(
                "duplicate title '{}'",
                category.title
            )));
        }
        if let Some(parent_id) = category.parent_id {
            if !rows.contains_key(&parent_id) {
                return Err(StorageError::Conflict(format!(
                    "parent {} does not exist",
                    parent_id
                )));
            }
        }

        let mut stored = category.clone();
        stored.updated_at = Utc::now();
        if let Some(existing) = rows.get(&category.id) {
            stored.created_at = existing.created_at;
            stored.created_by = existing.created_by.clone();
        }
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StorageError> {
        {
            let mut budget = self.delete_budget.lock().unwrap();
            match budget.as_mut() {
                Some(0) => return Err(StorageError::Unavailable("delete budget exhausted".into())),
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let mut rows = self.rows.write().await;
        if rows.values().any(|c| c.parent_id == Some(id)) {
            return Err(StorageError::Conflict(format!(
                "category {} still has children",
                id
            )));
        }
        Ok(rows.remove(&id).is_some())
    }

    async fn update_many(
        &self,
        filter: &CategoryFilter,
        patch: &CategoryPatch,
    ) -> Result<UpdateResult, StorageError> {
        let mut rows = self.rows.write().await;
        let mut result = UpdateResult::default();
        for category in rows.values_mut().filter(|c| matches(filter, c)) {
            result.matched_count += 1;
            if !patch_changes(patch, category) {
                continue;
            }
            if let Some(status) = patch.status {
                category.status = status;
            }
            if let Some(is_deleted) = patch.is_deleted {
                category.is_deleted = is_deleted;
            }
            if patch.updated_by.is_some() {
                category.updated_by = patch.updated_by.clone();
            }
            category.updated_at = Utc::now();
            result.modified_count += 1;
        }
        Ok(result)
    }

    async fn count(&self, filter: &CategoryFilter) -> Result<u64, StorageError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|c| matches(filter, c)).count() as u64)
    }
}
