//! `PostgreSQL` orders store.

use async_trait::async_trait;
use storefront::{
    Order, StoreError, UserUuid,
    orders::{NewOrder, NewOrderLine, OrderDetails, OrderUuid, OrderWriteError, OrdersStore},
};
use tracing::info;

use crate::{
    database::{Db, store_error},
    domain::orders::repositories::{PgOrderItemsRepository, PgOrdersRepository},
};

/// Writes an order and its lines in one transaction, so a failed checkout
/// never leaves an order without lines.
#[derive(Debug, Clone)]
pub struct PgOrdersStore {
    db: Db,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
}

impl PgOrdersStore {
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
impl OrdersStore for PgOrdersStore {
    #[tracing::instrument(
        name = "orders.store.create_order",
        skip(self, order, lines),
        fields(user_uuid = %order.user_uuid, line_count = lines.len()),
        err
    )]
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, OrderWriteError> {
        let write = async {
            let mut tx = self.db.begin().await?;

            let created = self.orders.create_order(&mut tx, &order).await?;

            self.items
                .create_order_items(&mut tx, created.uuid, &lines)
                .await?;

            tx.commit().await?;

            Ok::<_, sqlx::Error>(created)
        };

        let created = write
            .await
            .map_err(|error| OrderWriteError::Order(store_error(error)))?;

        info!(order_uuid = %created.uuid, "created order");

        Ok(created)
    }

    #[tracing::instrument(
        name = "orders.store.list_orders",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let orders = self
            .orders
            .list_user_orders(&mut tx, user)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.store.get_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn get_order(&self, user: UserUuid, order: OrderUuid) -> Result<OrderDetails, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let order = self
            .orders
            .get_user_order(&mut tx, user, order)
            .await
            .map_err(store_error)?;

        let lines = self
            .items
            .get_order_items(&mut tx, order.uuid)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(OrderDetails { order, lines })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use storefront::{CustomerDetails, OrderStatus, Quantity};
    use testresult::TestResult;

    use crate::test::{
        TestContext,
        helpers::{customer, sample_product},
    };

    use super::*;

    fn line(name: &str, price: Decimal, quantity: i64) -> NewOrderLine {
        let product = sample_product(name, price);

        NewOrderLine {
            product_uuid: product.uuid,
            name: product.name,
            price: product.price,
            quantity: Quantity::clamped(quantity),
            image_url: product.image_url,
        }
    }

    fn new_order(user: UserUuid, total: Decimal) -> NewOrder {
        NewOrder {
            user_uuid: user,
            total,
            customer: customer(),
        }
    }

    #[tokio::test]
    async fn create_order_writes_a_pending_order_with_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let order = ctx
            .orders
            .create_order(
                new_order(user, Decimal::new(2550, 2)),
                vec![
                    line("poster", Decimal::new(1000, 2), 2),
                    line("sticker", Decimal::new(550, 2), 1),
                ],
            )
            .await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::new(2550, 2));
        assert_eq!(order.customer, customer());

        let details = ctx.orders.get_order(user, order.uuid).await?;

        assert_eq!(details.order, order);
        assert_eq!(details.lines.len(), 2);
        assert_eq!(details.lines[0].name, "poster");
        assert_eq!(details.lines[0].quantity.get(), 2);
        assert_eq!(details.lines[1].line_total(), Decimal::new(550, 2));

        Ok(())
    }

    #[tokio::test]
    async fn failed_lines_roll_back_the_order() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let duplicate = line("poster", Decimal::ONE, 1);

        let result = ctx
            .orders
            .create_order(
                new_order(user, Decimal::TWO),
                vec![duplicate.clone(), duplicate],
            )
            .await;

        assert!(
            matches!(result, Err(OrderWriteError::Order(StoreError::AlreadyExists))),
            "expected a rolled back order, got {result:?}"
        );
        assert!(ctx.orders.list_orders(user).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn blank_customer_details_are_rejected_by_the_database() -> TestResult {
        let ctx = TestContext::new().await;
        let order = NewOrder {
            user_uuid: UserUuid::new(),
            total: Decimal::ONE,
            customer: CustomerDetails::default(),
        };

        let result = ctx
            .orders
            .create_order(order, vec![line("poster", Decimal::ONE, 1)])
            .await;

        assert!(
            matches!(result, Err(OrderWriteError::Order(StoreError::InvalidData))),
            "expected InvalidData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn orders_are_scoped_to_their_user() -> TestResult {
        let ctx = TestContext::new().await;
        let alice = UserUuid::new();
        let bob = UserUuid::new();

        let first = ctx
            .orders
            .create_order(
                new_order(alice, Decimal::ONE),
                vec![line("poster", Decimal::ONE, 1)],
            )
            .await?;
        let second = ctx
            .orders
            .create_order(
                new_order(alice, Decimal::TWO),
                vec![line("mug", Decimal::TWO, 1)],
            )
            .await?;

        let listed: Vec<OrderUuid> = ctx
            .orders
            .list_orders(alice)
            .await?
            .into_iter()
            .map(|order| order.uuid)
            .collect();

        assert_eq!(listed, [second.uuid, first.uuid]);
        assert!(ctx.orders.list_orders(bob).await?.is_empty());

        let result = ctx.orders.get_order(bob, first.uuid).await;

        assert!(
            matches!(result, Err(StoreError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
