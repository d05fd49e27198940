//! Cart Snapshots

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    cart::CartLine,
    products::ProductUuid,
    session::UserUuid,
};

/// Which store backs the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartSource {
    /// Guest cart in the local store.
    #[default]
    Guest,

    /// Member cart in the remote store.
    Member(UserUuid),
}

/// Immutable point-in-time view of the cart.
///
/// `count` and `subtotal` are derived from the lines on every call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    lines: Arc<[CartLine]>,
    source: CartSource,
    loading: bool,
}

impl CartSnapshot {
    pub(crate) fn new(lines: &[CartLine], source: CartSource, loading: bool) -> Self {
        Self {
            lines: Arc::from(lines),
            source,
            loading,
        }
    }

    /// Lines in the cart.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line for `product`, if present.
    pub fn line(&self, product: ProductUuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_uuid == product)
    }

    /// Store backing the cart.
    pub fn source(&self) -> CartSource {
        self.source
    }

    /// Whether a member cart is still being fetched.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .map(|line| u32::from(line.quantity))
            .sum()
    }

    /// Sum of unit price times quantity across all lines, saturating at
    /// [`Decimal::MAX`].
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}
