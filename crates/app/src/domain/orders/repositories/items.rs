//! Order Items Repository

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction, query, query_as};
use storefront::{
    OrderLine,
    orders::{NewOrderLine, OrderUuid},
};
use uuid::Uuid;

use crate::domain::orders::records::OrderItemRecord;

const CREATE_ORDER_ITEMS_SQL: &str = include_str!("../sql/create_order_items.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert every line in one statement.
    pub(crate) async fn create_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[NewOrderLine],
    ) -> Result<u64, sqlx::Error> {
        let product_uuids: Vec<Uuid> = lines
            .iter()
            .map(|line| line.product_uuid.into_uuid())
            .collect();
        let names: Vec<&str> = lines.iter().map(|line| line.name.as_str()).collect();
        let prices: Vec<Decimal> = lines.iter().map(|line| line.price).collect();
        let quantities: Vec<i16> = lines
            .iter()
            .map(|line| i16::from(line.quantity.get()))
            .collect();
        let image_urls: Vec<Option<&str>> = lines
            .iter()
            .map(|line| line.image_url.as_deref())
            .collect();

        let rows_affected = query(CREATE_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .bind(&product_uuids)
            .bind(&names)
            .bind(&prices)
            .bind(&quantities)
            .bind(&image_urls)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderLine>, sqlx::Error> {
        let records = query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(records.into_iter().map(|record| record.0).collect())
    }
}
