use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::addresses::dtos::{
    AddressResponseDto, CreateAddressDto, ListAddressesQuery, UpdateAddressDto,
};
use crate::features::addresses::models::Address;
use crate::features::addresses::repositories::AddressRepository;

/// Service for the caller's own postal addresses
pub struct AddressService {
    repo: Arc<dyn AddressRepository>,
}

impl AddressService {
    pub fn new(repo: Arc<dyn AddressRepository>) -> Self {
        Self { repo }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Address '{}' not found", id))
    }

    async fn find_owned(&self, id: Uuid, user_id: &str) -> Result<Address> {
        self.repo
            .find_owned(id, user_id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// List the caller's addresses, default first
    pub async fn list(
        &self,
        user_id: &str,
        query: &ListAddressesQuery,
    ) -> Result<(Vec<AddressResponseDto>, i64)> {
        let pagination = query.pagination();
        let search = query.search.as_deref();

        let total = self.repo.count(user_id, search).await?;
        let addresses = self
            .repo
            .list(user_id, search, pagination.limit(), pagination.offset())
            .await?;

        Ok((addresses.into_iter().map(|a| a.into()).collect(), total))
    }

    /// Get one of the caller's addresses
    pub async fn get(&self, id: Uuid, user_id: &str) -> Result<AddressResponseDto> {
        Ok(self.find_owned(id, user_id).await?.into())
    }

    /// Create an address; the first address of a user becomes the default
    pub async fn create(&self, user_id: &str, dto: CreateAddressDto) -> Result<AddressResponseDto> {
        let existing = self.repo.count(user_id, None).await?;
        let now = Utc::now();

        let address = Address {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            label: dto.label,
            recipient_name: dto.recipient_name,
            phone: dto.phone,
            line1: dto.line1,
            line2: dto.line2,
            city: dto.city,
            state: dto.state,
            postal_code: dto.postal_code,
            country: dto.country,
            is_default: dto.is_default || existing == 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        let address = self.repo.insert(&address).await?;

        tracing::info!(
            "Address created: id={}, user={}, default={}",
            address.id,
            user_id,
            address.is_default
        );

        Ok(address.into())
    }

    /// Merge the provided fields into one of the caller's addresses.
    /// An explicit `null` clears an optional field.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: &str,
        dto: UpdateAddressDto,
    ) -> Result<AddressResponseDto> {
        let current = self.find_owned(id, user_id).await?;

        let merged = Address {
            label: dto.label.unwrap_or(current.label),
            recipient_name: dto.recipient_name.unwrap_or(current.recipient_name),
            phone: dto.phone.unwrap_or(current.phone),
            line1: dto.line1.unwrap_or(current.line1),
            line2: dto.line2.unwrap_or(current.line2),
            city: dto.city.unwrap_or(current.city),
            state: dto.state.unwrap_or(current.state),
            postal_code: dto.postal_code.unwrap_or(current.postal_code),
            country: dto.country.unwrap_or(current.country),
            ..current
        };
        let address = self
            .repo
            .update(&merged)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!("Address updated: id={}", address.id);

        Ok(address.into())
    }

    /// Soft delete one of the caller's addresses
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<()> {
        if !self.repo.soft_delete(id, user_id).await? {
            return Err(Self::not_found(id));
        }

        tracing::info!("Address deleted: id={}, user={}", id, user_id);
        Ok(())
    }

    /// Make an address the caller's default, clearing the previous one
    pub async fn set_default(&self, id: Uuid, user_id: &str) -> Result<AddressResponseDto> {
        let address = self
            .repo
            .set_default(id, user_id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!("Default address changed: id={}, user={}", id, user_id);
        Ok(address.into())
    }
}
