use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, RequireUser};
use crate::features::addresses::dtos::{
    AddressResponseDto, CreateAddressDto, ListAddressesQuery, UpdateAddressDto,
};
use crate::features::addresses::services::AddressService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's addresses
#[utoipa::path(
    get,
    path = "/api/addresses",
    params(ListAddressesQuery),
    responses(
        (status = 200, description = "List of addresses", body = ApiResponse<Vec<AddressResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn list_addresses(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    Query(query): Query<ListAddressesQuery>,
) -> Result<Json<ApiResponse<Vec<AddressResponseDto>>>> {
    let (addresses, total) = service.list(&user_id, &query).await?;
    Ok(Json(ApiResponse::success(
        Some(addresses),
        None,
        Some(Meta::paged(total, &query.pagination())),
    )))
}

/// Get one of the caller's addresses
#[utoipa::path(
    get,
    path = "/api/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Address found", body = ApiResponse<AddressResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn get_address(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AddressResponseDto>>> {
    let address = service.get(id, &user_id).await?;
    Ok(Json(ApiResponse::success(Some(address), None, None)))
}

/// Create an address
///
/// The first address of a user always becomes the default one.
#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = CreateAddressDto,
    responses(
        (status = 200, description = "Address created", body = ApiResponse<AddressResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn create_address(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    AppJson(dto): AppJson<CreateAddressDto>,
) -> Result<Json<ApiResponse<AddressResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let address = service.create(&user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(address),
        Some("Address created".to_string()),
        None,
    )))
}

/// Update one of the caller's addresses
#[utoipa::path(
    patch,
    path = "/api/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    request_body = UpdateAddressDto,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<AddressResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn update_address(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAddressDto>,
) -> Result<Json<ApiResponse<AddressResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let address = service.update(id, &user_id, dto).await?;
    Ok(Json(ApiResponse::success(Some(address), None, None)))
}

/// Delete one of the caller's addresses
#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn delete_address(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, &user_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Address deleted".to_string()),
        None,
    )))
}

/// Make an address the caller's default
#[utoipa::path(
    post,
    path = "/api/addresses/{id}/default",
    params(
        ("id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 200, description = "Default address changed", body = ApiResponse<AddressResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Address not found")
    ),
    tag = "addresses",
    security(("user_id" = []))
)]
pub async fn set_default_address(
    RequireUser(user_id): RequireUser,
    State(service): State<Arc<AddressService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AddressResponseDto>>> {
    let address = service.set_default(id, &user_id).await?;
    Ok(Json(ApiResponse::success(Some(address), None, None)))
}
