//! Profiles

pub mod errors;
mod repository;
pub mod service;

pub use errors::ProfilesServiceError;
pub use service::*;
