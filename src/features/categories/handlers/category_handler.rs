use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{Actor, AppJson};
use crate::features::categories::dtos::{
    BreadcrumbItemDto, BulkUpdateStatusDto, CategoryResponseDto, CategoryStatsDto,
    CategoryTreeNode, CategoryTreeQuery, CreateCategoryDto, DescendantCountDto,
    ListCategoriesQuery, RemovalResultDto, RemoveCategoryQuery, SearchCategoriesQuery,
    StatusCountDto, UpdateCategoryDto, UpdateCategoryStatusDto,
};
use crate::features::categories::models::UpdateResult;
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

// ==================== Listing Handlers ====================

/// List categories
///
/// Paginated flat list with optional status, featured, parent and keyword filters.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let (categories, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta::paged(total, &query.pagination())),
    )))
}

/// List active, visible categories
#[utoipa::path(
    get,
    path = "/api/categories/active",
    responses(
        (status = 200, description = "Active categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_active_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.list_active().await?;
    let total = categories.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta::total(total)),
    )))
}

/// List featured categories
#[utoipa::path(
    get,
    path = "/api/categories/featured",
    responses(
        (status = 200, description = "Featured categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_featured_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.list_featured().await?;
    let total = categories.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta::total(total)),
    )))
}

/// Search categories by keyword
#[utoipa::path(
    get,
    path = "/api/categories/search",
    params(SearchCategoriesQuery),
    responses(
        (status = 200, description = "Matching categories", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 400, description = "Keyword missing or too long")
    ),
    tag = "categories"
)]
pub async fn search_categories(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<SearchCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let pagination = PaginationQuery {
        page: query.page,
        page_size: query.page_size,
    };
    let (categories, total) = service.search(&query.q, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(categories),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}

/// Count categories per status
#[utoipa::path(
    get,
    path = "/api/categories/status-summary",
    responses(
        (status = 200, description = "Count per status", body = ApiResponse<Vec<StatusCountDto>>),
    ),
    tag = "categories"
)]
pub async fn status_summary(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<StatusCountDto>>>> {
    let summary = service.status_summary().await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

// ==================== Hierarchy Handlers ====================

/// Get the category tree
///
/// Whole forest of non-deleted categories, or the subtree under `root_id`.
#[utoipa::path(
    get,
    path = "/api/categories/tree",
    params(CategoryTreeQuery),
    responses(
        (status = 200, description = "Category tree", body = ApiResponse<Vec<CategoryTreeNode>>),
        (status = 404, description = "Root category not found"),
        (status = 409, description = "Cycle or depth ceiling hit")
    ),
    tag = "categories"
)]
pub async fn get_category_tree(
    State(service): State<Arc<CategoryService>>,
    Query(query): Query<CategoryTreeQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeNode>>>> {
    let tree = service.tree(query.root_id).await?;
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// Get the ancestors of a category, root first
#[utoipa::path(
    get,
    path = "/api/categories/{id}/breadcrumb",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Ancestor trail", body = ApiResponse<Vec<BreadcrumbItemDto>>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Cycle or depth ceiling hit")
    ),
    tag = "categories"
)]
pub async fn get_breadcrumb(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<BreadcrumbItemDto>>>> {
    let trail = service.breadcrumb(id).await?;
    Ok(Json(ApiResponse::success(Some(trail), None, None)))
}

/// Count the non-deleted descendants of a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/descendants/count",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Descendant count", body = ApiResponse<DescendantCountDto>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Cycle detected")
    ),
    tag = "categories"
)]
pub async fn count_descendants(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DescendantCountDto>>> {
    let descendants = service.count_descendants(id).await?;
    Ok(Json(ApiResponse::success(
        Some(DescendantCountDto { id, descendants }),
        None,
        None,
    )))
}

/// Get structural statistics of a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}/stats",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category statistics", body = ApiResponse<CategoryStatsDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category_stats(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryStatsDto>>> {
    let stats = service.stats(id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

// ==================== Single Category Handlers ====================

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Title already taken")
    ),
    tag = "categories"
)]
pub async fn create_category(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CreateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(dto, actor).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category created".to_string()),
        None,
    )))
}

/// Update a category
///
/// Only the fields present in the body are changed. `parent_id: null` moves
/// the category to the top level.
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Title already taken")
    ),
    tag = "categories"
)]
pub async fn update_category(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(id, dto, actor).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Change the status of a category
#[utoipa::path(
    patch,
    path = "/api/categories/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryStatusDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn update_category_status(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCategoryStatusDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.update_status(id, dto.status, actor).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Restore a soft-deleted category
#[utoipa::path(
    post,
    path = "/api/categories/{id}/restore",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category restored", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Parent is still deleted"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn restore_category(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.restore(id, actor).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category restored".to_string()),
        None,
    )))
}

/// Remove a category together with all of its descendants
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID"),
        RemoveCategoryQuery
    ),
    responses(
        (status = 200, description = "Subtree removed", body = ApiResponse<RemovalResultDto>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Cycle detected"),
        (status = 500, description = "Removal stopped part way"),
        (status = 503, description = "Storage unavailable"),
        (status = 504, description = "Operation timed out")
    ),
    tag = "categories"
)]
pub async fn remove_category(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RemoveCategoryQuery>,
) -> Result<Json<ApiResponse<RemovalResultDto>>> {
    let result = service.remove(id, query.mode, actor).await?;
    let message = format!("{} categories removed", result.removed);
    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

/// Set the status of many categories at once (no cascade)
#[utoipa::path(
    patch,
    path = "/api/categories/bulk-status",
    request_body = BulkUpdateStatusDto,
    responses(
        (status = 200, description = "Matched and modified counts", body = ApiResponse<UpdateResult>),
        (status = 400, description = "Validation error")
    ),
    tag = "categories"
)]
pub async fn bulk_update_status(
    Actor(actor): Actor,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<BulkUpdateStatusDto>,
) -> Result<Json<ApiResponse<UpdateResult>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.bulk_update_status(dto, actor).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}
