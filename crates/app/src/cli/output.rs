//! Table rendering for command output.

use storefront::{CartSnapshot, CartSource, Order, Product, orders::OrderDetails};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

fn render(builder: Builder, numeric: std::ops::Range<usize>) -> String {
    let mut table: Table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(numeric), Alignment::right());

    table.to_string()
}

pub(crate) fn products(products: &[Product]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["UUID", "Name", "Category", "Price"]);

    for product in products {
        builder.push_record([
            product.uuid.to_string(),
            product.name.clone(),
            product.category.clone().unwrap_or_default(),
            product.price.to_string(),
        ]);
    }

    render(builder, 3..4)
}

pub(crate) fn orders(orders: &[Order]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["UUID", "Placed", "Customer", "Status", "Total"]);

    for order in orders {
        builder.push_record([
            order.uuid.to_string(),
            order.created_at.to_string(),
            format!("{} {}", order.customer.first_name, order.customer.last_name),
            order.status.to_string(),
            order.total.to_string(),
        ]);
    }

    render(builder, 4..5)
}

pub(crate) fn order_details(details: &OrderDetails) -> String {
    let order = &details.order;
    let mut builder = Builder::default();

    builder.push_record(["Item", "Price", "Qty", "Line Total"]);

    for line in &details.lines {
        builder.push_record([
            line.name.clone(),
            line.price.to_string(),
            line.quantity.to_string(),
            line.line_total().to_string(),
        ]);
    }

    builder.push_record([
        "Total".to_string(),
        String::new(),
        String::new(),
        order.total.to_string(),
    ]);

    format!(
        "order {} ({})\n{} {}, {}, {}\n{}",
        order.uuid,
        order.status,
        order.customer.first_name,
        order.customer.last_name,
        order.customer.phone,
        order.customer.address,
        render(builder, 1..4)
    )
}

pub(crate) fn cart(snapshot: &CartSnapshot) -> String {
    let owner = match snapshot.source() {
        CartSource::Guest => "guest cart".to_string(),
        CartSource::Member(user) => format!("cart of {user}"),
    };

    if snapshot.is_empty() {
        return format!("{owner} is empty");
    }

    let mut builder = Builder::default();

    builder.push_record(["Product", "Item", "Price", "Qty", "Line Total"]);

    for line in snapshot.lines() {
        builder.push_record([
            line.product_uuid.to_string(),
            line.name.clone(),
            line.price.to_string(),
            line.quantity.to_string(),
            line.line_total().to_string(),
        ]);
    }

    format!(
        "{owner}: {} items, subtotal {}\n{}",
        snapshot.count(),
        snapshot.subtotal(),
        render(builder, 2..5)
    )
}
