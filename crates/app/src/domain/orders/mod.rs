//! Orders

mod errors;
mod records;
mod repositories;
mod service;
mod store;

pub use errors::OrdersServiceError;
pub use service::{OrdersAdminService, PgOrdersAdminService};
pub use store::PgOrdersStore;
