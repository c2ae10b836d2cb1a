mod category_service;
mod hierarchy_service;
mod product_counter;

pub use category_service::CategoryService;
pub use hierarchy_service::CategoryHierarchy;
pub use product_counter::{NoProductCatalog, ProductCounter};
