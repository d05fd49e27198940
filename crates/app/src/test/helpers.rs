//! Test Helpers

use jiff::Timestamp;
use rust_decimal::Decimal;
use storefront::{CustomerDetails, Product, ProductUuid};

use crate::domain::products::data::NewProduct;

/// An unsaved catalog product.
pub(crate) fn sample_product(name: &str, price: Decimal) -> Product {
    Product {
        uuid: ProductUuid::new(),
        name: name.to_string(),
        price,
        category: None,
        description: None,
        image_url: None,
        created_at: Timestamp::now(),
    }
}

pub(crate) fn new_product(name: &str, price: Decimal) -> NewProduct {
    NewProduct {
        uuid: ProductUuid::new(),
        name: name.to_string(),
        price,
        category: None,
        description: None,
        image_url: None,
        images: Vec::new(),
    }
}

pub(crate) fn customer() -> CustomerDetails {
    CustomerDetails {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone: "+44 20 7946 0000".to_string(),
        address: "12 Analytical Row, London".to_string(),
    }
}
