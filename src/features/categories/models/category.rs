use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "category_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Active,
    Inactive,
    Draft,
    Pending,
    Archived,
    Published,
}

impl CategoryStatus {
    pub const ALL: [CategoryStatus; 6] = [
        CategoryStatus::Active,
        CategoryStatus::Inactive,
        CategoryStatus::Draft,
        CategoryStatus::Pending,
        CategoryStatus::Archived,
        CategoryStatus::Published,
    ];
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryStatus::Active => write!(f, "active"),
            CategoryStatus::Inactive => write!(f, "inactive"),
            CategoryStatus::Draft => write!(f, "draft"),
            CategoryStatus::Pending => write!(f, "pending"),
            CategoryStatus::Archived => write!(f, "archived"),
            CategoryStatus::Published => write!(f, "published"),
        }
    }
}

/// How a category subtree is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// Flag every node with `is_deleted = true`
    Soft,
    /// Erase every node, children before parents
    Hard,
}

impl FromStr for RemovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(RemovalMode::Soft),
            "hard" => Ok(RemovalMode::Hard),
            other => Err(format!(
                "Invalid removal mode '{}', expected 'soft' or 'hard'",
                other
            )),
        }
    }
}

impl std::fmt::Display for RemovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalMode::Soft => write!(f, "soft"),
            RemovalMode::Hard => write!(f, "hard"),
        }
    }
}

/// Database model for category
///
/// `parent_id` is the only stored link between categories; children are
/// always resolved by querying on it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
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

/// Which parent a filtered query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Top-level categories only
    Root,
    /// Direct children of the given category
    Of(Uuid),
}

impl From<Option<Uuid>> for ParentFilter {
    fn from(parent: Option<Uuid>) -> Self {
        match parent {
            Some(id) => ParentFilter::Of(id),
            None => ParentFilter::Root,
        }
    }
}

/// Predicate handed to the repository for filtered reads, counts and bulk updates
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub ids: Option<Vec<Uuid>>,
    pub parent: Option<ParentFilter>,
    pub status: Option<CategoryStatus>,
    pub is_featured: Option<bool>,
    pub visibility: Option<bool>,
    /// Case-insensitive substring over title, slug and tags
    pub search: Option<String>,
    pub include_deleted: bool,
}

impl CategoryFilter {
    /// Every stored category, soft-deleted ones included
    pub fn everything() -> Self {
        Self {
            include_deleted: true,
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Active, visible, not deleted
    pub fn publicly_active() -> Self {
        Self {
            status: Some(CategoryStatus::Active),
            visibility: Some(true),
            ..Self::default()
        }
    }

    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Fields set by a bulk update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub status: Option<CategoryStatus>,
    pub is_deleted: Option<bool>,
    /// Stamped only on rows the patch actually changes
    pub updated_by: Option<String>,
}

/// Outcome of a bulk update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateResult {
    /// Rows matching the filter
    pub matched_count: u64,
    /// Rows whose tracked fields actually changed
    pub modified_count: u64,
}
