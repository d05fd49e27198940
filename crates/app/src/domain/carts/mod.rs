//! Carts

mod records;
mod repositories;
mod store;

pub use store::PgCartStore;
