//! Persistence seam for addresses.
//!
//! Every lookup is scoped to the owning user and skips soft-deleted rows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::addresses::models::Address;

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgAddressRepository;

#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// A live address owned by `user_id`
    async fn find_owned(&self, id: Uuid, user_id: &str) -> Result<Option<Address>>;

    /// Live addresses of `user_id`, default first, then newest first
    async fn list(
        &self,
        user_id: &str,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>>;

    async fn count(&self, user_id: &str, search: Option<&str>) -> Result<i64>;

    /// Store a new address. A default address clears the owner's previous
    /// default in the same transaction.
    async fn insert(&self, address: &Address) -> Result<Address>;

    /// Overwrite the editable fields of a live owned address
    async fn update(&self, address: &Address) -> Result<Option<Address>>;

    /// Flag the address deleted and drop its default mark. `false` when
    /// nothing matched.
    async fn soft_delete(&self, id: Uuid, user_id: &str) -> Result<bool>;

    /// Make the address the owner's only default
    async fn set_default(&self, id: Uuid, user_id: &str) -> Result<Option<Address>>;
}
