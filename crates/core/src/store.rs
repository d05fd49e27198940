//! Remote Cart Store

use std::error::Error as StdError;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    cart::CartLine, products::ProductUuid, quantity::Quantity, session::UserUuid,
    uuids::TypedUuid,
};

/// Member Cart UUID
pub type CartUuid = TypedUuid<MemberCart>;

/// Marker for the single remote cart record owned by each signed-in user.
#[derive(Debug, Clone, Copy)]
pub struct MemberCart;

/// Errors surfaced by remote collaborators (relational store, identity provider).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist or is not visible to the caller.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    AlreadyExists,

    /// The write referenced a row that does not exist.
    #[error("related record not found")]
    InvalidReference,

    /// The write violated a column constraint.
    #[error("invalid data")]
    InvalidData,

    /// The store refused the request because no user is signed in.
    #[error("not signed in")]
    Unauthenticated,

    /// Transport, permission or any other backend failure.
    #[error("storage backend error")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn backend(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}

/// Per-user cart rows held by the relational store.
///
/// All line operations are addressed by `(cart, product)`, which the store keeps
/// unique.
#[automock]
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Return the user's cart, creating it on first access. Must be idempotent
    /// under concurrent first access.
    async fn ensure_cart(&self, user: UserUuid) -> Result<CartUuid, StoreError>;

    /// Every line in the cart, oldest first.
    async fn load_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError>;

    /// A single line, if the product is in the cart.
    async fn find_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<CartLine>, StoreError>;

    /// Insert a new line.
    async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError>;

    /// Overwrite a line's quantity. Returns the number of rows touched, so a
    /// missing line yields `0`.
    async fn update_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: Quantity,
    ) -> Result<u64, StoreError>;

    /// Delete a single line.
    async fn delete_line(&self, cart: CartUuid, product: ProductUuid) -> Result<(), StoreError>;

    /// Delete every line, leaving the cart record in place.
    async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError>;
}
