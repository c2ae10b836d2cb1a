use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
    Router,
};
use chrono::Utc;
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use crate::core::config::HierarchyConfig;
use crate::features::categories::models::{Category, CategoryStatus};
use crate::features::categories::repositories::memory::InMemoryCategoryRepository;
use crate::features::categories::services::NoProductCatalog;
use crate::features::categories::CategoryService;
use crate::shared::constants::USER_ID_HEADER;
use crate::shared::validation::slugify;

pub const TEST_USER_ID: &str = "test-user-id";

/// Active, visible, non-deleted category with a fresh id
pub fn category_fixture(title: &str, parent_id: Option<Uuid>) -> Category {
    let now = Utc::now();
    Category {
        id: Uuid::now_v7(),
        parent_id,
        title: title.to_string(),
        slug: slugify(title),
        description: None,
        status: CategoryStatus::Active,
        is_featured: false,
        display_order: 0,
        visibility: true,
        is_deleted: false,
        tags: Vec::new(),
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

/// Category service backed by the in-memory repository
pub fn memory_category_service(
    repo: Arc<InMemoryCategoryRepository>,
) -> Arc<CategoryService> {
    Arc::new(CategoryService::new(
        repo,
        Arc::new(NoProductCatalog),
        HierarchyConfig::default(),
    ))
}

async fn inject_test_user_middleware(mut request: Request, next: Next) -> Response {
    request.headers_mut().insert(
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_static(TEST_USER_ID),
    );
    next.run(request).await
}

/// Make every request look like it was sent by [`TEST_USER_ID`]
pub fn with_test_user(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_test_user_middleware))
}

/// Driver error carrying a unique constraint violation, as Postgres reports it
#[derive(Debug)]
pub struct UniqueViolation(&'static str);

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "duplicate key value violates unique constraint \"{}\"", self.0)
    }
}

impl std::error::Error for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.0)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

/// `sqlx::Error` as returned when `constraint` rejects a write
pub fn unique_violation(constraint: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation(constraint)))
}
