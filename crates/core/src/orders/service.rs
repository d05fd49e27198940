//! Order Service

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    cart::{CartEngine, CartLine},
    orders::{
        CustomerDetails, NewOrder, NewOrderLine, Order, OrderDetails, OrderError, OrderUuid,
        OrderWriteError, OrdersStore,
    },
    session::{IdentityProvider, UserUuid},
};

/// Turns carts into orders for the signed-in user and reads their history.
#[derive(Clone)]
pub struct OrderService {
    identity: Arc<dyn IdentityProvider>,
    orders: Arc<dyn OrdersStore>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    /// Service placing orders for whoever `identity` reports as signed in.
    pub fn new(identity: Arc<dyn IdentityProvider>, orders: Arc<dyn OrdersStore>) -> Self {
        Self { identity, orders }
    }

    /// Create a pending order from `lines`.
    ///
    /// `total` is trusted as computed by the cart; prices are not re-checked.
    ///
    /// # Errors
    ///
    /// Checks run in order, and nothing is written unless all pass:
    ///
    /// - [`OrderError::Unauthenticated`] when nobody is signed in.
    /// - [`OrderError::Validation`] when any customer field is blank or the
    ///   phone number is malformed.
    /// - [`OrderError::EmptyCart`] when `lines` is empty.
    ///
    /// Store failures are returned as [`OrderError::Store`], or
    /// [`OrderError::PartialOrder`] when the order was written without its lines.
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, lines, customer),
        fields(line_count = lines.len(), total = %total),
        err
    )]
    pub async fn create_order(
        &self,
        lines: &[CartLine],
        total: Decimal,
        customer: &CustomerDetails,
    ) -> Result<Order, OrderError> {
        let user_uuid = self.signed_in_user().await?;

        let customer = customer.validate()?;

        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let order = NewOrder {
            user_uuid,
            total,
            customer,
        };

        let created = self
            .orders
            .create_order(order, lines.iter().map(NewOrderLine::from).collect())
            .await
            .map_err(|error| match error {
                OrderWriteError::Order(source) => OrderError::Store(source),
                OrderWriteError::Lines { order, source } => {
                    OrderError::PartialOrder { order, source }
                }
            })?;

        info!(order_uuid = %created.uuid, %user_uuid, "order created");

        Ok(created)
    }

    /// Place an order for everything in `cart`, then empty it.
    ///
    /// Other cart edits wait until the cart has been emptied, so only the lines
    /// that were ordered are removed.
    ///
    /// The order is the outcome: once it exists, a failure to clear the cart is
    /// logged and the order is still returned.
    ///
    /// # Errors
    ///
    /// See [`Self::create_order`].
    #[tracing::instrument(name = "orders.service.checkout", skip_all, err)]
    pub async fn checkout(
        &self,
        cart: &CartEngine,
        customer: &CustomerDetails,
    ) -> Result<Order, OrderError> {
        let (order, cleared) = cart
            .drain_with(|snapshot| async move {
                self.create_order(snapshot.lines(), snapshot.subtotal(), customer)
                    .await
            })
            .await?;

        if let Err(error) = cleared {
            warn!(order_uuid = %order.uuid, %error, "order created but cart was not cleared");
        }

        Ok(order)
    }

    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Unauthenticated`] when nobody is signed in, or a
    /// store error.
    #[tracing::instrument(name = "orders.service.order_history", skip(self), err)]
    pub async fn order_history(&self) -> Result<Vec<Order>, OrderError> {
        let user = self.signed_in_user().await?;

        Ok(self.orders.list_orders(user).await?)
    }

    /// One of the signed-in user's orders with its lines.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Unauthenticated`] when nobody is signed in, or
    /// [`OrderError::Store`] with a not-found error when the order does not
    /// belong to them.
    #[tracing::instrument(name = "orders.service.order_details", skip(self), err)]
    pub async fn order_details(&self, order: OrderUuid) -> Result<OrderDetails, OrderError> {
        let user = self.signed_in_user().await?;

        Ok(self.orders.get_order(user, order).await?)
    }

    async fn signed_in_user(&self) -> Result<UserUuid, OrderError> {
        self.identity
            .current_session()
            .await?
            .map(|identity| identity.user_uuid)
            .ok_or(OrderError::Unauthenticated)
    }
}
