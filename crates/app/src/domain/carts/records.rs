//! Cart Records

use rust_decimal::Decimal;
use sqlx::{FromRow, Row, postgres::PgRow};
use storefront::{CartLine, ProductUuid, Quantity};
use uuid::Uuid;

/// Cart Item Record
#[derive(Debug, Clone)]
pub(crate) struct CartItemRecord {
    pub product_uuid: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub quantity: i16,
}

impl From<CartItemRecord> for CartLine {
    fn from(record: CartItemRecord) -> Self {
        Self {
            product_uuid: ProductUuid::from_uuid(record.product_uuid),
            name: record.name,
            price: record.price,
            image_url: record.image_url,
            category: record.category,
            quantity: Quantity::clamped(i64::from(record.quantity)),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_uuid: row.try_get("product_uuid")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            image_url: row.try_get("image_url")?,
            category: row.try_get("category")?,
            quantity: row.try_get("quantity")?,
        })
    }
}
