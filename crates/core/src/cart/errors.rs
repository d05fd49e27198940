//! Cart engine errors.

use thiserror::Error;

use crate::{
    local::{GuestCartError, LocalStoreError},
    store::StoreError,
};

/// Errors returned by [`CartEngine`](crate::cart::CartEngine) operations.
///
/// None of these are retried by the engine; the in-memory cart is left as it
/// was before the failed operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// The remote cart store failed.
    #[error("cart storage error")]
    Store(#[from] StoreError),

    /// The local store failed.
    #[error("local cart storage error")]
    LocalStore(#[from] LocalStoreError),

    /// The guest cart could not be encoded for the local store.
    #[error("failed to encode guest cart")]
    Encode(#[source] serde_json::Error),

    /// The signed-in user changed while the operation was in flight, so its
    /// result was discarded.
    #[error("session changed while the cart operation was in flight")]
    SessionChanged,
}

impl From<GuestCartError> for CartError {
    fn from(error: GuestCartError) -> Self {
        match error {
            GuestCartError::Encode(source) => Self::Encode(source),
            GuestCartError::Store(source) => Self::LocalStore(source),
        }
    }
}
