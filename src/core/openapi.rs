use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::addresses::{dtos as addresses_dtos, handlers as addresses_handlers};
use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::shared::constants::USER_ID_HEADER;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::list_active_categories,
        categories_handlers::list_featured_categories,
        categories_handlers::search_categories,
        categories_handlers::status_summary,
        categories_handlers::get_category_tree,
        categories_handlers::bulk_update_status,
        categories_handlers::get_category,
        categories_handlers::update_category,
        categories_handlers::remove_category,
        categories_handlers::update_category_status,
        categories_handlers::restore_category,
        categories_handlers::get_breadcrumb,
        categories_handlers::count_descendants,
        categories_handlers::get_category_stats,
        // Addresses
        addresses_handlers::list_addresses,
        addresses_handlers::create_address,
        addresses_handlers::get_address,
        addresses_handlers::update_address,
        addresses_handlers::delete_address,
        addresses_handlers::set_default_address,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_models::CategoryStatus,
            categories_models::RemovalMode,
            categories_models::UpdateResult,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeNode,
            categories_dtos::BreadcrumbItemDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::UpdateCategoryStatusDto,
            categories_dtos::BulkUpdateStatusDto,
            categories_dtos::RemovalResultDto,
            categories_dtos::DescendantCountDto,
            categories_dtos::StatusCountDto,
            categories_dtos::CategoryStatsDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<Vec<categories_dtos::CategoryTreeNode>>,
            ApiResponse<Vec<categories_dtos::BreadcrumbItemDto>>,
            ApiResponse<Vec<categories_dtos::StatusCountDto>>,
            ApiResponse<categories_dtos::RemovalResultDto>,
            ApiResponse<categories_dtos::DescendantCountDto>,
            ApiResponse<categories_dtos::CategoryStatsDto>,
            ApiResponse<categories_models::UpdateResult>,
            // Addresses
            addresses_dtos::AddressResponseDto,
            addresses_dtos::CreateAddressDto,
            addresses_dtos::UpdateAddressDto,
            ApiResponse<addresses_dtos::AddressResponseDto>,
            ApiResponse<Vec<addresses_dtos::AddressResponseDto>>,
        )
    ),
    tags(
        (name = "categories", description = "Category hierarchy: CRUD, tree, breadcrumb, subtree removal and bulk status"),
        (name = "addresses", description = "Postal addresses owned by the caller"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Taxonomy API",
        version = "0.1.0",
        description = "API documentation for the taxonomy service",
    )
)]
pub struct ApiDoc;

/// Adds the caller identity header as an API key security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_hierarchy_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/categories/tree",
            "/api/categories/{id}/breadcrumb",
            "/api/categories/{id}/descendants/count",
            "/api/categories/bulk-status",
            "/api/addresses/{id}/default",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
