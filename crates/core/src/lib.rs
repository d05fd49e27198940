//! Storefront
//!
//! Cart and ordering core for a small storefront: guest and member carts, the
//! reconciliation between them across sign-in and sign-out, and checkout.

pub mod cart;
pub mod local;
pub mod memory;
pub mod orders;
pub mod products;
pub mod quantity;
pub mod session;
pub mod store;
pub mod uuids;

pub use cart::{CartEngine, CartError, CartLine, CartSnapshot, CartSource};
pub use orders::{CustomerDetails, Order, OrderError, OrderLine, OrderService, OrderStatus};
pub use products::{Product, ProductUuid};
pub use quantity::Quantity;
pub use session::{Identity, IdentityProvider, SessionTracker, SessionTransition, UserUuid};
pub use store::StoreError;
