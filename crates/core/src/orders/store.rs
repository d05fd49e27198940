//! Orders Store

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    orders::{NewOrder, NewOrderLine, Order, OrderDetails, OrderUuid},
    session::UserUuid,
    store::StoreError,
};

/// Errors raised while writing an order.
#[derive(Debug, Error)]
pub enum OrderWriteError {
    /// The order itself could not be written; nothing was stored.
    #[error("failed to write order")]
    Order(#[source] StoreError),

    /// The order was written but its lines were not.
    #[error("order {order} was written without its lines")]
    Lines {
        /// Order left without lines.
        order: OrderUuid,

        /// Why the lines failed.
        #[source]
        source: StoreError,
    },
}

/// Durable storage for orders and their lines.
#[automock]
#[async_trait]
pub trait OrdersStore: Send + Sync {
    /// Write a pending order and all of its lines.
    ///
    /// Stores with transactions write both or neither. Stores without them
    /// report a half-written order as [`OrderWriteError::Lines`].
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, OrderWriteError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, StoreError>;

    /// One of the user's orders with its lines.
    async fn get_order(&self, user: UserUuid, order: OrderUuid) -> Result<OrderDetails, StoreError>;
}
