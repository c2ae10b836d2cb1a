use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
///
/// Reads are public. Writes are stamped with the caller from `x-user-id` when present.
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        // Static segments must come before {id}
        .route("/api/categories/active", get(handlers::list_active_categories))
        .route("/api/categories/featured", get(handlers::list_featured_categories))
        .route("/api/categories/search", get(handlers::search_categories))
        .route("/api/categories/status-summary", get(handlers::status_summary))
        .route("/api/categories/tree", get(handlers::get_category_tree))
        .route("/api/categories/bulk-status", patch(handlers::bulk_update_status))
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .patch(handlers::update_category)
                .delete(handlers::remove_category),
        )
        .route(
            "/api/categories/{id}/status",
            patch(handlers::update_category_status),
        )
        .route("/api/categories/{id}/restore", post(handlers::restore_category))
        .route("/api/categories/{id}/breadcrumb", get(handlers::get_breadcrumb))
        .route(
            "/api/categories/{id}/descendants/count",
            get(handlers::count_descendants),
        )
        .route("/api/categories/{id}/stats", get(handlers::get_category_stats))
        .with_state(service)
}
