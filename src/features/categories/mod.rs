//! Category hierarchy feature.
//!
//! Categories form a forest through `parent_id`. Besides CRUD this feature
//! provides the recursive operations over that forest: nested tree, breadcrumb,
//! descendant count, subtree removal (soft or hard) and flat bulk status change.
//! Every traversal is bounded by `CATEGORY_MAX_DEPTH` and detects cycles in
//! corrupted data instead of looping.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Paginated list with filters |
//! | POST | `/api/categories` | Create a category |
//! | GET | `/api/categories/active` | Active, visible categories |
//! | GET | `/api/categories/featured` | Featured categories |
//! | GET | `/api/categories/search?q=` | Keyword search |
//! | GET | `/api/categories/status-summary` | Count per status |
//! | GET | `/api/categories/tree` | Nested tree |
//! | PATCH | `/api/categories/bulk-status` | Flat status change |
//! | GET/PATCH/DELETE | `/api/categories/{id}` | Read, update, remove subtree |
//! | PATCH | `/api/categories/{id}/status` | Change status |
//! | POST | `/api/categories/{id}/restore` | Undo a soft delete |
//! | GET | `/api/categories/{id}/breadcrumb` | Ancestors, root first |
//! | GET | `/api/categories/{id}/descendants/count` | Descendant count |
//! | GET | `/api/categories/{id}/stats` | Depth and counts |

pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::CategoryService;
