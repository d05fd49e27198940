//! Orders

mod customer;
mod errors;
mod models;
mod service;
mod store;

pub use customer::*;
pub use errors::OrderError;
pub use models::*;
pub use service::OrderService;
pub use store::*;
