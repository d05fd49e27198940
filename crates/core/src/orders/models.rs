//! Order Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartLine, orders::CustomerDetails, products::ProductUuid, quantity::Quantity,
    session::UserUuid, uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Fulfilment status of an order. New orders are always [`OrderStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    #[default]
    Pending,

    /// Paid.
    Paid,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer.
    Delivered,

    /// Cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in fulfilment order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown order status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

/// Order placed at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier.
    pub uuid: OrderUuid,

    /// User who placed the order.
    pub user_uuid: UserUuid,

    /// Amount charged, as computed by the cart at checkout.
    pub total: Decimal,

    /// Fulfilment status.
    pub status: OrderStatus,

    /// Contact and delivery details given at checkout.
    pub customer: CustomerDetails,

    /// Placement timestamp.
    pub created_at: Timestamp,
}

/// Product line of an order, copied from the cart at checkout so later product
/// edits leave it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Order the line belongs to.
    pub order_uuid: OrderUuid,

    /// Product purchased.
    pub product_uuid: ProductUuid,

    /// Product name at purchase.
    pub name: String,

    /// Unit price at purchase.
    pub price: Decimal,

    /// Units purchased.
    pub quantity: Quantity,

    /// Product image at purchase.
    pub image_url: Option<String>,
}

impl OrderLine {
    /// Unit price multiplied by quantity, saturating at [`Decimal::MAX`].
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity.get()))
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// The order.
    pub order: Order,

    /// Its lines.
    pub lines: Vec<OrderLine>,
}

/// Order to be written by an [`OrdersStore`](crate::orders::OrdersStore).
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// User placing the order.
    pub user_uuid: UserUuid,

    /// Amount charged.
    pub total: Decimal,

    /// Validated customer details.
    pub customer: CustomerDetails,
}

/// Order line to be written alongside a [`NewOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    /// Product purchased.
    pub product_uuid: ProductUuid,

    /// Product name at purchase.
    pub name: String,

    /// Unit price at purchase.
    pub price: Decimal,

    /// Units purchased.
    pub quantity: Quantity,

    /// Product image at purchase.
    pub image_url: Option<String>,
}

impl NewOrderLine {
    /// Attach the line to the order it was written for.
    pub fn into_order_line(self, order_uuid: OrderUuid) -> OrderLine {
        OrderLine {
            order_uuid,
            product_uuid: self.product_uuid,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            image_url: self.image_url,
        }
    }
}

impl From<&CartLine> for NewOrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_uuid: line.product_uuid,
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
            image_url: line.image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Shipped".parse(), Ok(OrderStatus::Shipped));
        assert_eq!(" cancelled ".parse(), Ok(OrderStatus::Cancelled));
        assert_eq!(
            "refunded".parse::<OrderStatus>(),
            Err(UnknownOrderStatus("refunded".to_string()))
        );
    }

    #[test]
    fn status_round_trips_through_its_stored_form() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse(), Ok(status));
        }
    }
}
