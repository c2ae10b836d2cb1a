pub mod addresses;
pub mod categories;
