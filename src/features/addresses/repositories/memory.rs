//! In-memory [`AddressRepository`] used by the test suites.
//!
//! Enforces the one-default-per-user rule the Postgres partial unique index
//! guarantees.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AddressRepository;
use crate::core::error::{AppError, Result};
use crate::features::addresses::models::Address;

#[derive(Default)]
pub struct InMemoryAddressRepository {
    rows: RwLock<HashMap<Uuid, Address>>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, soft-deleted ones included
    pub async fn snapshot(&self) -> Vec<Address> {
        self.rows.read().await.values().cloned().collect()
    }
}

fn owned_live(address: &Address, id: Uuid, user_id: &str) -> bool {
    address.id == id && address.user_id == user_id && !address.is_deleted
}

fn matches(address: &Address, user_id: &str, search: Option<&str>) -> bool {
    if address.is_deleted || address.user_id != user_id {
        return false;
    }
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(needle) => {
            let needle = needle.to_lowercase();
            [
                address.label.as_deref(),
                Some(address.recipient_name.as_str()),
                Some(address.line1.as_str()),
                address.line2.as_deref(),
                Some(address.city.as_str()),
                Some(address.postal_code.as_str()),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        }
        None => true,
    }
}

fn clear_default(rows: &mut HashMap<Uuid, Address>, user_id: &str, keep: Option<Uuid>) {
    for row in rows
        .values_mut()
        .filter(|a| a.user_id == user_id && a.is_default && Some(a.id) != keep)
    {
        row.is_default = false;
        row.updated_at = Utc::now();
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_owned(&self, id: Uuid, user_id: &str) -> Result<Option<Address>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).filter(|a| owned_live(a, id, user_id)).cloned())
    }

    async fn list(
        &self,
        user_id: &str,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>> {
        let rows = self.rows.read().await;
        let mut found: Vec<Address> = rows
            .values()
            .filter(|a| matches(a, user_id, search))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(found
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, user_id: &str, search: Option<&str>) -> Result<i64> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|a| matches(a, user_id, search)).count() as i64)
    }

    async fn insert(&self, address: &Address) -> Result<Address> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&address.id) {
            return Err(AppError::Conflict(format!("Address '{}' already exists", address.id)));
        }
        if address.is_default {
            clear_default(&mut rows, &address.user_id, None);
        }

        let now = Utc::now();
        let mut stored = address.clone();
        stored.is_deleted = false;
        stored.created_at = now;
        stored.updated_at = now;
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, address: &Address) -> Result<Option<Address>> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows
            .get_mut(&address.id)
            .filter(|a| owned_live(a, address.id, &address.user_id))
        else {
            return Ok(None);
        };

        row.label = address.label.clone();
        row.recipient_name = address.recipient_name.clone();
        row.phone = address.phone.clone();
        row.line1 = address.line1.clone();
        row.line2 = address.line2.clone();
        row.city = address.city.clone();
        row.state = address.state.clone();
        row.postal_code = address.postal_code.clone();
        row.country = address.country.clone();
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn soft_delete(&self, id: Uuid, user_id: &str) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id).filter(|a| owned_live(a, id, user_id)) {
            Some(row) => {
                row.is_deleted = true;
                row.is_default = false;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_default(&self, id: Uuid, user_id: &str) -> Result<Option<Address>> {
        let mut rows = self.rows.write().await;
        if !rows.get(&id).is_some_and(|a| owned_live(a, id, user_id)) {
            return Ok(None);
        }

        clear_default(&mut rows, user_id, Some(id));
        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        row.is_default = true;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}
