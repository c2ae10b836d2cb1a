use thiserror::Error;
use uuid::Uuid;

use crate::core::error::AppError;

/// Failure reported by a [`CategoryRepository`](super::repositories::CategoryRepository)
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the call; safe to retry later
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness or referential constraint rejected the write
    #[error("storage conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() || db.is_foreign_key_violation() {
                return StorageError::Conflict(db.message().to_string());
            }
        }
        StorageError::Unavailable(e.to_string())
    }
}

/// Errors surfaced by the category hierarchy operations.
///
/// Every variant that concerns a specific record carries its identifier so
/// callers can decide whether to retry or report.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("category {0} not found")]
    NotFound(Uuid),

    #[error("cycle detected in category hierarchy at {0}")]
    CycleDetected(Uuid),

    #[error("category hierarchy under {id} exceeds the maximum depth of {max_depth}")]
    CycleOrDepthExceeded { id: Uuid, max_depth: usize },

    #[error("removal of {id} stopped after {completed} categories were removed")]
    PartiallyApplied { id: Uuid, completed: u64 },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    Conflict(String),

    #[error("operation cancelled before completion")]
    Cancelled,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl HierarchyError {
    /// Only storage outages are worth retrying; everything else repeats deterministically
    pub fn is_retryable(&self) -> bool {
        matches!(self, HierarchyError::StorageUnavailable(_))
    }
}

impl From<StorageError> for HierarchyError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Unavailable(msg) => HierarchyError::StorageUnavailable(msg),
            StorageError::Conflict(msg) => HierarchyError::Conflict(msg),
        }
    }
}

impl From<HierarchyError> for AppError {
    fn from(e: HierarchyError) -> Self {
        match e {
            HierarchyError::NotFound(id) => AppError::NotFound(format!("Category '{}' not found", id)),
            HierarchyError::ValidationFailed(msg) => AppError::Validation(msg),
            HierarchyError::Conflict(msg) => AppError::Conflict(msg),
            e @ (HierarchyError::CycleDetected(_) | HierarchyError::CycleOrDepthExceeded { .. }) => {
                AppError::Conflict(e.to_string())
            }
            e @ HierarchyError::PartiallyApplied { .. } => AppError::PartiallyApplied(e.to_string()),
            e @ HierarchyError::Cancelled => AppError::Timeout(e.to_string()),
            HierarchyError::StorageUnavailable(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        HierarchyError::from(e).into()
    }
}
