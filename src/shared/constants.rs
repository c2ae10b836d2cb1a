/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Header carrying the caller identity, set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";
