use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::config::HierarchyConfig;
use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    BreadcrumbItemDto, BulkUpdateStatusDto, CategoryResponseDto, CategoryStatsDto,
    CategoryTreeNode, CreateCategoryDto, ListCategoriesQuery, RemovalResultDto, StatusCountDto,
    UpdateCategoryDto,
};
use crate::features::categories::error::{HierarchyError, StorageError};
use crate::features::categories::models::{
    Category, CategoryFilter, CategoryStatus, ParentFilter, RemovalMode, UpdateResult,
};
use crate::features::categories::repositories::CategoryRepository;
use crate::features::categories::services::{CategoryHierarchy, ProductCounter};
use crate::shared::cancellation::Cancellation;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::{normalize_tags, slugify};

/// Service for category operations
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    hierarchy: CategoryHierarchy,
    products: Arc<dyn ProductCounter>,
}

impl CategoryService {
    pub fn new(
        repo: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductCounter>,
        config: HierarchyConfig,
    ) -> Self {
        Self {
            hierarchy: CategoryHierarchy::new(Arc::clone(&repo), config),
            repo,
            products,
        }
    }

    /// Cancellation signal bounded by the configured operation timeout
    pub fn cancellation(&self) -> Cancellation {
        Cancellation::with_timeout(self.hierarchy.config().operation_timeout)
    }

    fn duplicate_title(title: &str) -> impl FnOnce(StorageError) -> AppError + '_ {
        move |e| match e {
            StorageError::Conflict(_) => {
                AppError::Conflict(format!("Category with title '{}' already exists", title))
            }
            other => other.into(),
        }
    }

    async fn live_parent(&self, parent_id: Uuid) -> Result<Category> {
        match self.hierarchy.live(parent_id).await {
            Ok(parent) => Ok(parent),
            Err(HierarchyError::NotFound(_)) => Err(AppError::Validation(format!(
                "Parent category '{}' does not exist",
                parent_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Reject placing `height` levels directly under a category at
    /// `parent_depth` when the result would exceed the configured depth
    fn ensure_depth_fits(&self, parent_depth: usize, height: usize) -> Result<()> {
        let max_depth = self.hierarchy.config().max_depth;
        if parent_depth + height > max_depth {
            return Err(AppError::Validation(format!(
                "Category hierarchy would exceed the maximum depth of {}",
                max_depth
            )));
        }
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// List categories with filters and pagination
    pub async fn list(
        &self,
        query: &ListCategoriesQuery,
    ) -> Result<(Vec<CategoryResponseDto>, i64)> {
        let parent = match (query.parent_id, query.root_only) {
            (Some(id), _) => Some(ParentFilter::Of(id)),
            (None, true) => Some(ParentFilter::Root),
            (None, false) => None,
        };
        let filter = CategoryFilter {
            parent,
            status: query.status,
            is_featured: query.is_featured,
            search: query.search.clone(),
            include_deleted: query.include_deleted,
            ..CategoryFilter::default()
        };
        let pagination = query.pagination();

        let total = self.repo.count(&filter).await?;
        let items = self
            .repo
            .find(&filter, pagination.limit(), pagination.offset())
            .await?;

        Ok((
            items.into_iter().map(|c| c.into()).collect(),
            total as i64,
        ))
    }

    /// All active, visible categories (flat list)
    pub async fn list_active(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self
            .repo
            .find(&CategoryFilter::publicly_active(), i64::MAX, 0)
            .await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// Active, visible categories flagged as featured
    pub async fn list_featured(&self) -> Result<Vec<CategoryResponseDto>> {
        let filter = CategoryFilter {
            is_featured: Some(true),
            ..CategoryFilter::publicly_active()
        };
        let categories = self.repo.find(&filter, i64::MAX, 0).await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// Case-insensitive keyword search over title, slug and tags
    pub async fn search(
        &self,
        keyword: &str,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<CategoryResponseDto>, i64)> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation("Search keyword is required".to_string()));
        }

        let filter = CategoryFilter {
            search: Some(keyword.to_string()),
            ..CategoryFilter::default()
        };
        let total = self.repo.count(&filter).await?;
        let items = self
            .repo
            .find(&filter, pagination.limit(), pagination.offset())
            .await?;

        Ok((
            items.into_iter().map(|c| c.into()).collect(),
            total as i64,
        ))
    }

    /// Number of non-deleted categories per status, every status included
    pub async fn status_summary(&self) -> Result<Vec<StatusCountDto>> {
        let mut summary = Vec::with_capacity(CategoryStatus::ALL.len());
        for status in CategoryStatus::ALL {
            let filter = CategoryFilter {
                status: Some(status),
                ..CategoryFilter::default()
            };
            let count = self.repo.count(&filter).await?;
            summary.push(StatusCountDto { status, count });
        }
        Ok(summary)
    }

    /// Get a non-deleted category by id
    pub async fn get(&self, id: Uuid) -> Result<CategoryResponseDto> {
        Ok(self.hierarchy.live(id).await?.into())
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Create a category
    pub async fn create(
        &self,
        dto: CreateCategoryDto,
        actor: Option<String>,
    ) -> Result<CategoryResponseDto> {
        let title = dto.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }

        let slug = dto.slug.unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Title must contain letters or digits to derive a slug".to_string(),
            ));
        }

        if let Some(parent_id) = dto.parent_id {
            self.live_parent(parent_id).await?;
            let parent_depth = self
                .hierarchy
                .depth(parent_id, &self.cancellation())
                .await?;
            self.ensure_depth_fits(parent_depth, 1)?;
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::now_v7(),
            parent_id: dto.parent_id,
            title,
            slug,
            description: dto.description,
            status: dto.status.unwrap_or(CategoryStatus::Active),
            is_featured: dto.is_featured.unwrap_or(false),
            display_order: dto.display_order.unwrap_or(0),
            visibility: dto.visibility.unwrap_or(true),
            is_deleted: self.hierarchy.config().default_is_deleted,
            tags: normalize_tags(dto.tags.as_deref().unwrap_or_default()),
            created_by: actor.clone(),
            updated_by: actor,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .repo
            .save(&category)
            .await
            .map_err(Self::duplicate_title(&category.title))?;

        tracing::info!(
            "Category created: id={}, title={}, parent={:?}",
            saved.id,
            saved.title,
            saved.parent_id
        );

        Ok(saved.into())
    }

    /// Merge the provided fields into an existing category
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateCategoryDto,
        actor: Option<String>,
    ) -> Result<CategoryResponseDto> {
        let mut category = self.hierarchy.live(id).await?;

        if let Some(title) = dto.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("Title must not be blank".to_string()));
            }
            category.title = title;
        }
        if let Some(slug) = dto.slug {
            category.slug = slug;
        }
        if let Some(description) = dto.description {
            category.description = Some(description);
        }
        if let Some(is_featured) = dto.is_featured {
            category.is_featured = is_featured;
        }
        if let Some(display_order) = dto.display_order {
            category.display_order = display_order;
        }
        if let Some(visibility) = dto.visibility {
            category.visibility = visibility;
        }
        if let Some(tags) = dto.tags {
            category.tags = normalize_tags(&tags);
        }

        match dto.parent_id {
            Some(Some(parent_id)) if Some(parent_id) != category.parent_id => {
                if parent_id == id {
                    return Err(AppError::Validation(
                        "A category cannot be its own parent".to_string(),
                    ));
                }
                self.live_parent(parent_id).await?;
                let cx = self.cancellation();
                let ancestors = self.hierarchy.breadcrumb(parent_id, &cx).await?;
                if ancestors.iter().any(|a| a.id == id) {
                    return Err(AppError::Validation(
                        "A category cannot be moved under one of its own descendants".to_string(),
                    ));
                }
                let height = self.hierarchy.subtree_height(id, &cx).await?;
                self.ensure_depth_fits(ancestors.len() + 1, height)?;
                category.parent_id = Some(parent_id);
            }
            Some(None) => category.parent_id = None,
            _ => {}
        }

        category.updated_by = actor;

        let saved = self
            .repo
            .save(&category)
            .await
            .map_err(Self::duplicate_title(&category.title))?;

        tracing::info!("Category updated: id={}", saved.id);

        Ok(saved.into())
    }

    /// Change the status of a single category
    pub async fn update_status(
        &self,
        id: Uuid,
        status: CategoryStatus,
        actor: Option<String>,
    ) -> Result<CategoryResponseDto> {
        let mut category = self.hierarchy.live(id).await?;
        if category.status == status {
            return Ok(category.into());
        }

        category.status = status;
        category.updated_by = actor;
        let saved = self.repo.save(&category).await?;

        tracing::info!("Category status changed: id={}, status={}", saved.id, status);

        Ok(saved.into())
    }

    /// Clear the soft-delete flag on one category (its subtree stays as it is)
    pub async fn restore(&self, id: Uuid, actor: Option<String>) -> Result<CategoryResponseDto> {
        let mut category = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", id)))?;

        if !category.is_deleted {
            return Ok(category.into());
        }

        if let Some(parent_id) = category.parent_id {
            let parent_live = self
                .repo
                .find_by_id(parent_id)
                .await?
                .is_some_and(|p| !p.is_deleted);
            if !parent_live {
                return Err(AppError::Validation(
                    "Restore the parent category first".to_string(),
                ));
            }
        }

        category.is_deleted = false;
        category.updated_by = actor;
        let saved = self
            .repo
            .save(&category)
            .await
            .map_err(Self::duplicate_title(&category.title))?;

        tracing::info!("Category restored: id={}", saved.id);

        Ok(saved.into())
    }

    // =========================================================================
    // HIERARCHY
    // =========================================================================

    /// Category forest, or the subtree under `root_id`
    pub async fn tree(&self, root_id: Option<Uuid>) -> Result<Vec<CategoryTreeNode>> {
        Ok(self
            .hierarchy
            .build_tree(root_id, &self.cancellation())
            .await?)
    }

    pub async fn breadcrumb(&self, id: Uuid) -> Result<Vec<BreadcrumbItemDto>> {
        Ok(self.hierarchy.breadcrumb(id, &self.cancellation()).await?)
    }

    pub async fn count_descendants(&self, id: Uuid) -> Result<u64> {
        Ok(self
            .hierarchy
            .count_descendants(id, &self.cancellation())
            .await?)
    }

    /// Remove a category and its whole subtree
    pub async fn remove(
        &self,
        id: Uuid,
        mode: Option<RemovalMode>,
        actor: Option<String>,
    ) -> Result<RemovalResultDto> {
        let mode = mode.unwrap_or(self.hierarchy.config().removal_mode);
        let removed = self
            .hierarchy
            .remove_with_descendants(id, mode, actor, &self.cancellation())
            .await?;

        Ok(RemovalResultDto { id, mode, removed })
    }

    /// Flat status change over many categories (never cascades)
    pub async fn bulk_update_status(
        &self,
        dto: BulkUpdateStatusDto,
        actor: Option<String>,
    ) -> Result<UpdateResult> {
        Ok(self
            .hierarchy
            .bulk_update_status(&dto.ids, dto.status, actor, &self.cancellation())
            .await?)
    }

    /// Depth, child/descendant counts and product count of a category
    pub async fn stats(&self, id: Uuid) -> Result<CategoryStatsDto> {
        let cx = self.cancellation();
        let ancestors = self.hierarchy.breadcrumb(id, &cx).await?;
        let children = self.hierarchy.children(Some(id), false, &cx).await?;
        let descendant_count = self.hierarchy.count_descendants(id, &cx).await?;
        let product_count = self.products.count_for_category(id).await?;

        Ok(CategoryStatsDto {
            id,
            depth: ancestors.len() + 1,
            child_count: children.len() as u64,
            descendant_count,
            product_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::repositories::memory::InMemoryCategoryRepository;
    use crate::features::categories::services::NoProductCatalog;
    use crate::shared::test_helpers::category_fixture;

    struct FixedProducts(u64);

    #[async_trait::async_trait]
    impl ProductCounter for FixedProducts {
        async fn count_for_category(&self, _category_id: Uuid) -> std::result::Result<u64, StorageError> {
            Ok(self.0)
        }
    }

    fn service(repo: Arc<InMemoryCategoryRepository>) -> CategoryService {
        CategoryService::new(repo, Arc::new(NoProductCatalog), HierarchyConfig::default())
    }

    fn create_dto(title: &str, parent_id: Option<Uuid>) -> CreateCategoryDto {
        CreateCategoryDto {
            title: title.to_string(),
            slug: None,
            description: None,
            parent_id,
            status: None,
            is_featured: None,
            display_order: None,
            visibility: None,
            tags: Some(vec!["Sale".to_string(), "sale".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_stamps_creator() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let service = service(repo);

        let created = service
            .create(create_dto("Home & Garden", None), Some("user-1".into()))
            .await
            .unwrap();

        assert_eq!(created.slug, "home-garden");
        assert_eq!(created.status, CategoryStatus::Active);
        assert_eq!(created.created_by.as_deref(), Some("user-1"));
        assert_eq!(created.tags, vec!["sale"]);
        assert!(!created.is_deleted);
        assert!(created.visibility);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_title_and_missing_parent() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let service = service(repo);

        service.create(create_dto("Books", None), None).await.unwrap();
        assert!(matches!(
            service.create(create_dto("Books", None), None).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service
                .create(create_dto("Orphan", Some(Uuid::now_v7())), None)
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_deleted_title_stays_reserved() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let service = service(repo);

        let books = service.create(create_dto("Books", None), None).await.unwrap();
        service
            .remove(books.id, Some(RemovalMode::Soft), None)
            .await
            .unwrap();

        assert!(matches!(
            service.create(create_dto("Books", None), None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_moving_under_own_descendant() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let a = category_fixture("A", None);
        let b = category_fixture("B", Some(a.id));
        let c = category_fixture("C", Some(b.id));
        repo.insert_raw([a.clone(), b.clone(), c.clone()]).await;
        let service = service(repo);

        let to_grandchild = UpdateCategoryDto {
            parent_id: Some(Some(c.id)),
            ..UpdateCategoryDto::default()
        };
        assert!(matches!(
            service.update(a.id, to_grandchild, None).await,
            Err(AppError::Validation(_))
        ));

        let to_self = UpdateCategoryDto {
            parent_id: Some(Some(a.id)),
            ..UpdateCategoryDto::default()
        };
        assert!(matches!(
            service.update(a.id, to_self, None).await,
            Err(AppError::Validation(_))
        ));

        let to_root = UpdateCategoryDto {
            parent_id: Some(None),
            title: Some("C moved".into()),
            ..UpdateCategoryDto::default()
        };
        let moved = service.update(c.id, to_root, Some("editor".into())).await.unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.title, "C moved");
        assert_eq!(moved.slug, c.slug);
        assert_eq!(moved.updated_by.as_deref(), Some("editor"));
    }

    fn shallow_service(repo: Arc<InMemoryCategoryRepository>) -> CategoryService {
        let config = HierarchyConfig {
            max_depth: 2,
            ..HierarchyConfig::default()
        };
        CategoryService::new(repo, Arc::new(NoProductCatalog), config)
    }

    #[tokio::test]
    async fn test_create_rejects_child_beyond_max_depth() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let service = shallow_service(repo.clone());

        let a = service.create(create_dto("A", None), None).await.unwrap();
        let b = service.create(create_dto("B", Some(a.id)), None).await.unwrap();
        assert!(matches!(
            service.create(create_dto("C", Some(b.id)), None).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(repo.snapshot().await.len(), 2);

        // What was accepted stays readable and removable
        let tree = service.tree(None).await.unwrap();
        assert_eq!(tree[0].children[0].id, b.id);
        let removed = service
            .remove(a.id, Some(RemovalMode::Hard), None)
            .await
            .unwrap();
        assert_eq!(removed.removed, 2);
    }

    #[tokio::test]
    async fn test_update_rejects_move_that_exceeds_max_depth() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let a = category_fixture("A", None);
        let x = category_fixture("X", None);
        let y = category_fixture("Y", Some(x.id));
        let leaf = category_fixture("Leaf", None);
        repo.insert_raw([a.clone(), x.clone(), y.clone(), leaf.clone()])
            .await;
        let service = shallow_service(repo);

        // X carries Y, so under A the subtree would reach depth 3
        let deepen = UpdateCategoryDto {
            parent_id: Some(Some(a.id)),
            ..UpdateCategoryDto::default()
        };
        assert!(matches!(
            service.update(x.id, deepen, None).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(service.get(x.id).await.unwrap().parent_id, None);

        let fits = UpdateCategoryDto {
            parent_id: Some(Some(a.id)),
            ..UpdateCategoryDto::default()
        };
        let moved = service.update(leaf.id, fits, None).await.unwrap();
        assert_eq!(moved.parent_id, Some(a.id));
        assert_eq!(service.count_descendants(a.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_passthrough_listings() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let active = category_fixture("Garden Tools", None);
        let mut featured = category_fixture("Kitchen", None);
        featured.is_featured = true;
        featured.tags = vec!["cooking".into()];
        let mut hidden = category_fixture("Hidden", None);
        hidden.visibility = false;
        let mut draft = category_fixture("Drafty", None);
        draft.status = CategoryStatus::Draft;
        let mut gone = category_fixture("Gone Garden", None);
        gone.is_deleted = true;
        repo.insert_raw([active.clone(), featured.clone(), hidden, draft, gone])
            .await;
        let service = service(repo);

        let titles = |items: Vec<CategoryResponseDto>| -> Vec<String> {
            items.into_iter().map(|c| c.title).collect()
        };

        assert_eq!(
            titles(service.list_active().await.unwrap()),
            vec!["Garden Tools", "Kitchen"]
        );
        assert_eq!(titles(service.list_featured().await.unwrap()), vec!["Kitchen"]);

        let (found, total) = service
            .search("garden", &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(titles(found), vec!["Garden Tools"]);

        let (by_tag, _) = service
            .search("COOK", &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(titles(by_tag), vec!["Kitchen"]);

        let summary = service.status_summary().await.unwrap();
        assert_eq!(summary.len(), CategoryStatus::ALL.len());
        let count_of = |s: CategoryStatus| summary.iter().find(|e| e.status == s).unwrap().count;
        assert_eq!(count_of(CategoryStatus::Active), 3);
        assert_eq!(count_of(CategoryStatus::Draft), 1);
        assert_eq!(count_of(CategoryStatus::Archived), 0);
    }

    #[tokio::test]
    async fn test_restore_requires_live_parent() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let a = category_fixture("A", None);
        let b = category_fixture("B", Some(a.id));
        repo.insert_raw([a.clone(), b.clone()]).await;
        let service = service(repo);

        service.remove(a.id, Some(RemovalMode::Soft), None).await.unwrap();
        assert!(matches!(service.get(b.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.restore(b.id, None).await,
            Err(AppError::Validation(_))
        ));

        service.restore(a.id, None).await.unwrap();
        let restored = service.restore(b.id, None).await.unwrap();
        assert!(!restored.is_deleted);
    }

    #[tokio::test]
    async fn test_stats_uses_product_counter() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let a = category_fixture("A", None);
        let b = category_fixture("B", Some(a.id));
        let c = category_fixture("C", Some(b.id));
        repo.insert_raw([a.clone(), b.clone(), c]).await;
        let service = CategoryService::new(repo, Arc::new(FixedProducts(7)), HierarchyConfig::default());

        let stats = service.stats(b.id).await.unwrap();
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.child_count, 1);
        assert_eq!(stats.descendant_count, 1);
        assert_eq!(stats.product_count, 7);
    }

    #[tokio::test]
    async fn test_remove_uses_configured_default_mode() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let a = category_fixture("A", None);
        repo.insert_raw([a.clone()]).await;
        let config = HierarchyConfig {
            removal_mode: RemovalMode::Hard,
            ..HierarchyConfig::default()
        };
        let service = CategoryService::new(repo.clone(), Arc::new(NoProductCatalog), config);

        let result = service.remove(a.id, None, None).await.unwrap();
        assert_eq!(result.mode, RemovalMode::Hard);
        assert_eq!(result.removed, 1);
        assert!(repo.snapshot().await.is_empty());
    }
}
