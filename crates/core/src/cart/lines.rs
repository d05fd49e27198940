//! In-memory line edits shared by the guest cart and the local view of a member
//! cart. Each edit keeps lines unique by product and quantities in range.

use crate::{
    cart::CartLine,
    products::{Product, ProductUuid},
    quantity::Quantity,
};

/// Add `quantity` units of `product`, merging into an existing line.
pub(crate) fn add(lines: &mut Vec<CartLine>, product: &Product, quantity: i64) {
    if let Some(existing) = lines
        .iter_mut()
        .find(|line| line.product_uuid == product.uuid)
    {
        existing.quantity = existing.quantity.offset(quantity);
        return;
    }

    lines.push(CartLine::for_product(product, Quantity::clamped(quantity)));
}

/// Remove the line for `product`. Returns whether a line was removed.
pub(crate) fn remove(lines: &mut Vec<CartLine>, product: ProductUuid) -> bool {
    let before = lines.len();

    lines.retain(|line| line.product_uuid != product);

    lines.len() != before
}

/// Overwrite the quantity of the line for `product`. Returns whether a line was
/// found.
pub(crate) fn set_quantity(lines: &mut [CartLine], product: ProductUuid, quantity: Quantity) -> bool {
    match lines.iter_mut().find(|line| line.product_uuid == product) {
        Some(line) => {
            line.quantity = quantity;
            true
        }
        None => false,
    }
}

/// Current quantity of the line for `product`.
pub(crate) fn quantity_of(lines: &[CartLine], product: ProductUuid) -> Option<Quantity> {
    lines
        .iter()
        .find(|line| line.product_uuid == product)
        .map(|line| line.quantity)
}

/// Fold duplicate products into their first line, summing quantities.
pub(crate) fn normalized(stored: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());

    for line in stored {
        match lines
            .iter_mut()
            .find(|existing| existing.product_uuid == line.product_uuid)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.offset(i64::from(line.quantity.get()));
            }
            None => lines.push(line),
        }
    }

    lines
}
