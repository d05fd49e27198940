//! Products

pub mod data;
pub mod errors;
mod records;
mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
