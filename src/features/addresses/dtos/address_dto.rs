use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::addresses::models::Address;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::types::{deserialize_some, PaginationQuery};
use crate::shared::validation::{PHONE_REGEX, POSTAL_CODE_REGEX};

/// Response DTO for address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressResponseDto {
    pub id: Uuid,
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Address> for AddressResponseDto {
    fn from(a: Address) -> Self {
        Self {
            id: a.id,
            label: a.label,
            recipient_name: a.recipient_name,
            phone: a.phone,
            line1: a.line1,
            line2: a.line2,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
            country: a.country,
            is_default: a.is_default,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Request DTO for creating an address
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAddressDto {
    #[validate(length(max = 50, message = "Label must not exceed 50 characters"))]
    pub label: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Recipient name must be 1-255 characters"))]
    pub recipient_name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Address line 1 must be 1-255 characters"))]
    pub line1: String,

    #[validate(length(max = 255, message = "Address line 2 must not exceed 255 characters"))]
    pub line2: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City must be 1-100 characters"))]
    pub city: String,

    #[validate(length(max = 100, message = "State must not exceed 100 characters"))]
    pub state: Option<String>,

    #[validate(regex(path = *POSTAL_CODE_REGEX, message = "Invalid postal code"))]
    pub postal_code: String,

    #[validate(length(min = 2, max = 100, message = "Country must be 2-100 characters"))]
    pub country: String,

    /// Make this the user's default address (clears the previous default)
    #[serde(default)]
    pub is_default: bool,
}

/// Request DTO for updating an address.
///
/// Fields left out are kept. The optional fields (`label`, `phone`, `line2`,
/// `state`) are cleared by sending `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressDto {
    #[validate(length(max = 50, message = "Label must not exceed 50 characters"))]
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub label: Option<Option<String>>,

    #[validate(length(min = 1, max = 255, message = "Recipient name must be 1-255 characters"))]
    pub recipient_name: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[validate(length(min = 1, max = 255, message = "Address line 1 must be 1-255 characters"))]
    pub line1: Option<String>,

    #[validate(length(max = 255, message = "Address line 2 must not exceed 255 characters"))]
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub line2: Option<Option<String>>,

    #[validate(length(min = 1, max = 100, message = "City must be 1-100 characters"))]
    pub city: Option<String>,

    #[validate(length(max = 100, message = "State must not exceed 100 characters"))]
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub state: Option<Option<String>>,

    #[validate(regex(path = *POSTAL_CODE_REGEX, message = "Invalid postal code"))]
    pub postal_code: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Country must be 2-100 characters"))]
    pub country: Option<String>,
}

/// Query params for listing the caller's addresses
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListAddressesQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Search in label, recipient, street lines, city and postal code
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ListAddressesQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}
