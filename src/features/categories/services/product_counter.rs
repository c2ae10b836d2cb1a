use async_trait::async_trait;
use uuid::Uuid;

use crate::features::categories::error::StorageError;

/// Capability to count the products filed under a category.
///
/// Injected into the category service so category statistics never reach into
/// another feature's tables directly.
#[async_trait]
pub trait ProductCounter: Send + Sync {
    async fn count_for_category(&self, category_id: Uuid) -> Result<u64, StorageError>;
}

/// Counter used while no product catalog is attached: every category has zero products
pub struct NoProductCatalog;

#[async_trait]
impl ProductCounter for NoProductCatalog {
    async fn count_for_category(&self, _category_id: Uuid) -> Result<u64, StorageError> {
        Ok(0)
    }
}
