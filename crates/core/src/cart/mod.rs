//! Carts

mod engine;
mod errors;
mod line;
pub(crate) mod lines;
mod snapshot;

pub use engine::CartEngine;
pub use errors::CartError;
pub use line::{CartLine, MAX_UNIT_PRICE};
pub use snapshot::{CartSnapshot, CartSource};
