//! Cart Lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    products::{Product, ProductUuid},
    quantity::Quantity,
};

/// Largest unit price a product can carry, matching the `NUMERIC(12, 2)` price
/// columns.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// One product in a cart. A cart holds at most one line per product.
///
/// The serialized field names are the guest cart's stored layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product in the line.
    #[serde(rename = "id")]
    pub product_uuid: ProductUuid,

    /// Product name when added.
    pub name: String,

    /// Unit price when added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Product image when added.
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Product category when added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Number of units.
    #[serde(rename = "qty")]
    pub quantity: Quantity,
}

impl CartLine {
    /// New line for `product`.
    pub fn for_product(product: &Product, quantity: Quantity) -> Self {
        Self {
            product_uuid: product.uuid,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            quantity,
        }
    }

    /// Unit price multiplied by quantity, saturating at [`Decimal::MAX`].
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity.get()))
    }

    /// Whether the unit price is one a product can carry.
    pub fn has_valid_price(&self) -> bool {
        (Decimal::ZERO..=MAX_UNIT_PRICE).contains(&self.price)
    }
}
