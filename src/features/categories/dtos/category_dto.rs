use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::{Category, CategoryStatus, RemovalMode};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::types::{deserialize_some, PaginationQuery};
use crate::shared::validation::SLUG_REGEX;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: CategoryStatus,
    pub is_featured: bool,
    pub display_order: i32,
    pub visibility: bool,
    pub is_deleted: bool,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            title: c.title,
            slug: c.slug,
            description: c.description,
            status: c.status,
            is_featured: c.is_featured,
            display_order: c.display_order,
            visibility: c.visibility,
            is_deleted: c.is_deleted,
            tags: c.tags,
            created_by: c.created_by,
            updated_by: c.updated_by,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// One node of the category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: CategoryStatus,
    pub is_featured: bool,
    pub display_order: i32,
    pub visibility: bool,
    pub tags: Vec<String>,
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    pub fn new(category: Category, children: Vec<CategoryTreeNode>) -> Self {
        Self {
            id: category.id,
            parent_id: category.parent_id,
            title: category.title,
            slug: category.slug,
            description: category.description,
            status: category.status,
            is_featured: category.is_featured,
            display_order: category.display_order,
            visibility: category.visibility,
            tags: category.tags,
            children,
        }
    }
}

/// Ancestor entry of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BreadcrumbItemDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

impl From<Category> for BreadcrumbItemDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            title: c.title,
            slug: c.slug,
        }
    }
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Derived from the title when omitted
    #[validate(
        length(min = 1, max = 255, message = "Slug must be 1-255 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase alphanumeric segments separated by single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    pub parent_id: Option<Uuid>,

    /// Defaults to `active`
    pub status: Option<CategoryStatus>,

    pub is_featured: Option<bool>,

    pub display_order: Option<i32>,

    pub visibility: Option<bool>,

    #[validate(length(max = 50, message = "At most 50 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

/// Request DTO for updating a category (fields left out are kept)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = 255, message = "Slug must be 1-255 characters"),
        regex(path = *SLUG_REGEX, message = "Slug must be lowercase alphanumeric segments separated by single hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    /// Absent: unchanged. `null`: move to the top level. Id: move under that category.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,

    pub is_featured: Option<bool>,

    pub display_order: Option<i32>,

    pub visibility: Option<bool>,

    #[validate(length(max = 50, message = "At most 50 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

/// Request DTO for changing a single category's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryStatusDto {
    pub status: CategoryStatus,
}

/// Request DTO for a flat status change over many categories
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkUpdateStatusDto {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 ids are required"))]
    pub ids: Vec<Uuid>,
    pub status: CategoryStatus,
}

/// Query params for listing categories
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Filter by status
    pub status: Option<CategoryStatus>,
    /// Filter by featured flag
    pub is_featured: Option<bool>,
    /// Only direct children of this category
    pub parent_id: Option<Uuid>,
    /// Only top-level categories (ignored when `parent_id` is set)
    #[serde(default)]
    pub root_only: bool,
    /// Search in title, slug and tags
    pub search: Option<String>,
    /// Include soft-deleted categories
    #[serde(default)]
    pub include_deleted: bool,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ListCategoriesQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Query params for keyword search
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct SearchCategoriesQuery {
    /// Keyword matched against title, slug and tags
    #[validate(length(min = 1, max = 100, message = "Keyword must be 1-100 characters"))]
    pub q: String,
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

/// Query params for the tree endpoint
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CategoryTreeQuery {
    /// Build only the subtree rooted here; whole forest when omitted
    pub root_id: Option<Uuid>,
}

/// Query params for removal
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RemoveCategoryQuery {
    /// `soft` or `hard`; server default when omitted
    pub mode: Option<RemovalMode>,
}

/// Result of a recursive removal
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemovalResultDto {
    pub id: Uuid,
    pub mode: RemovalMode,
    /// Category itself plus all descendants
    pub removed: u64,
}

/// Descendant count of a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DescendantCountDto {
    pub id: Uuid,
    pub descendants: u64,
}

/// Number of (non-deleted) categories in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: CategoryStatus,
    pub count: u64,
}

/// Structural statistics for one category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryStatsDto {
    pub id: Uuid,
    /// 1 for a top-level category
    pub depth: usize,
    pub child_count: u64,
    pub descendant_count: u64,
    pub product_count: u64,
}
