//! Order service errors.

use thiserror::Error;

use crate::{
    orders::{OrderUuid, ValidationError},
    session::IdentityError,
    store::StoreError,
};

const TRY_AGAIN: &str = "Checkout failed. Please try again.";

/// Errors raised by [`OrderService`](crate::orders::OrderService).
#[derive(Debug, Error)]
pub enum OrderError {
    /// No signed-in user.
    #[error("sign in to check out")]
    Unauthenticated,

    /// Customer details failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The session could not be resolved.
    #[error("failed to resolve session")]
    Identity(#[from] IdentityError),

    /// Orders storage failed.
    #[error("order storage error")]
    Store(#[from] StoreError),

    /// The order row exists but its lines were not written.
    #[error("order {order} was created without its lines")]
    PartialOrder {
        /// Order left without lines.
        order: OrderUuid,

        /// Why the lines failed.
        #[source]
        source: StoreError,
    },
}

impl OrderError {
    /// Message safe to show a shopper. Backend failures collapse into a generic
    /// retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "You must be signed in to checkout.".to_string(),
            Self::Validation(_) => {
                "Please fill in your customer details before checkout.".to_string()
            }
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::Identity(_) | Self::Store(_) | Self::PartialOrder { .. } => {
                TRY_AGAIN.to_string()
            }
        }
    }
}
