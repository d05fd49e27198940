//! Orders admin service.

use async_trait::async_trait;
use mockall::automock;
use storefront::{
    Order, OrderStatus,
    orders::{OrderDetails, OrderUuid},
};
use tracing::info;

use crate::{
    database::Db,
    domain::orders::{
        errors::OrdersServiceError,
        repositories::{PgOrderItemsRepository, PgOrdersRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersAdminService {
    db: Db,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
}

impl PgOrdersAdminService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersAdminService for PgOrdersAdminService {
    #[tracing::instrument(name = "orders.admin.list_orders", skip(self), err)]
    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = self.orders.list_orders(&mut tx).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.admin.get_order",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn get_order(&self, order: OrderUuid) -> Result<OrderDetails, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self.orders.get_order(&mut tx, order).await?;
        let lines = self.items.get_order_items(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(OrderDetails { order, lines })
    }

    #[tracing::instrument(
        name = "orders.admin.update_status",
        skip(self),
        fields(order_uuid = %order, status = %status),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self.orders.update_status(&mut tx, order, status).await?;

        tx.commit().await?;

        info!(order_uuid = %updated.uuid, status = %updated.status, "updated order status");

        Ok(updated)
    }
}

/// Store-wide order management for administrators.
#[automock]
#[async_trait]
pub trait OrdersAdminService: Send + Sync {
    /// Every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError>;

    /// A single order with its lines.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderDetails, OrdersServiceError>;

    /// Moves an order to the given status.
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}
