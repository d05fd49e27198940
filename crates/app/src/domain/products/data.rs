//! Products Data

use rust_decimal::Decimal;
use storefront::ProductUuid;

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub images: Vec<NewProductImage>,
}

/// New Product Image Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductImage {
    pub image_url: String,
    pub sort_order: i32,
}
