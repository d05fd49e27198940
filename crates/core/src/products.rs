//! Products

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Catalog product, as shown on the shop pages and added to carts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub uuid: ProductUuid,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Decimal,

    /// Optional category label.
    pub category: Option<String>,

    /// Optional long description.
    pub description: Option<String>,

    /// Primary image: the first image by sort order.
    pub image_url: Option<String>,

    /// Creation timestamp.
    pub created_at: Timestamp,
}
