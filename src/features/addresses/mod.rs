//! User-owned postal addresses.
//!
//! Plain CRUD scoped to the caller identified by `x-user-id`. Deletes are soft
//! and each user has at most one default address.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::AddressService;
