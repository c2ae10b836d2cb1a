mod address_dto;

pub use address_dto::*;
