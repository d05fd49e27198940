//! Order Records

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Row, postgres::PgRow};
use storefront::{
    CustomerDetails, Order, OrderLine, OrderStatus, ProductUuid, Quantity, UserUuid,
    orders::OrderUuid,
};

/// Order Record
#[derive(Debug, Clone)]
pub(crate) struct OrderRecord(pub Order);

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self(Order {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            total: row.try_get("total")?,
            status,
            customer: CustomerDetails {
                first_name: row.try_get("customer_first_name")?,
                last_name: row.try_get("customer_last_name")?,
                phone: row.try_get("customer_phone")?,
                address: row.try_get("customer_address")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        }))
    }
}

/// Order Item Record
#[derive(Debug, Clone)]
pub(crate) struct OrderItemRecord(pub OrderLine);

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity: i16 = row.try_get("quantity")?;

        Ok(Self(OrderLine {
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            quantity: Quantity::clamped(i64::from(quantity)),
            image_url: row.try_get("image_url")?,
        }))
    }
}
