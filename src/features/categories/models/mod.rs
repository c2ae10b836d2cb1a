mod category;

pub use category::{
    Category, CategoryFilter, CategoryPatch, CategoryStatus, ParentFilter, RemovalMode,
    UpdateResult,
};
