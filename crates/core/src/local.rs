//! Local Store
//!
//! Device-scoped key-value storage holding the guest cart.

use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;
use tracing::warn;

use crate::cart::{CartLine, MAX_UNIT_PRICE, lines};

/// Default key for the guest cart. The version suffix changes whenever the stored
/// format changes incompatibly.
pub const GUEST_CART_KEY: &str = "storefront_cart_v1";

/// Errors raised by a [`LocalStore`].
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// The backing storage rejected the operation.
    #[error("local storage unavailable")]
    Unavailable(#[source] Box<dyn StdError + Send + Sync>),
}

impl LocalStoreError {
    /// Wrap an arbitrary storage error.
    pub fn unavailable(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Unavailable(Box::new(error))
    }
}

/// Synchronous string storage scoped to the current device or browser profile.
pub trait LocalStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// The guest cart as persisted in a [`LocalStore`]: one key holding a JSON array
/// of lines.
#[derive(Clone)]
pub struct GuestCartStorage {
    store: Arc<dyn LocalStore>,
    key: String,
}

impl std::fmt::Debug for GuestCartStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestCartStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl GuestCartStorage {
    /// Guest cart stored under `key`.
    pub fn new(store: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored cart.
    ///
    /// Never fails: unreadable storage, malformed JSON or a value that is not an
    /// array of lines all read as an empty cart. Lines priced below zero or above
    /// [`MAX_UNIT_PRICE`] are dropped.
    pub fn load(&self) -> Vec<CartLine> {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                warn!(key = %self.key, %error, "failed to read guest cart");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(stored) => {
                let (kept, dropped): (Vec<_>, Vec<_>) =
                    stored.into_iter().partition(CartLine::has_valid_price);

                if !dropped.is_empty() {
                    warn!(
                        key = %self.key,
                        dropped = dropped.len(),
                        "dropping guest cart lines with invalid prices"
                    );
                }

                lines::normalized(kept)
            }
            Err(error) => {
                warn!(key = %self.key, %error, "discarding unreadable guest cart");
                Vec::new()
            }
        }
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the lines cannot be encoded or written.
    pub fn save(&self, lines: &[CartLine]) -> Result<(), GuestCartError> {
        let encoded = serde_json::to_string(lines).map_err(GuestCartError::Encode)?;

        self.store.set_item(&self.key, &encoded)?;

        Ok(())
    }

    /// Remove the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage cannot be written.
    pub fn clear(&self) -> Result<(), LocalStoreError> {
        self.store.remove_item(&self.key)
    }
}

/// Errors raised while persisting the guest cart.
#[derive(Debug, Error)]
pub enum GuestCartError {
    /// Lines could not be serialised.
    #[error("failed to encode guest cart")]
    Encode(#[source] serde_json::Error),

    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] LocalStoreError),
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        cart::CartEngine,
        memory::{MemoryCartStore, MemoryLocalStore},
        products::ProductUuid,
        quantity::Quantity,
    };

    use super::*;

    fn storage() -> (Arc<MemoryLocalStore>, GuestCartStorage) {
        let store = Arc::new(MemoryLocalStore::default());

        (store.clone(), GuestCartStorage::new(store, GUEST_CART_KEY))
    }

    fn line(name: &str, quantity: i64) -> CartLine {
        CartLine {
            product_uuid: ProductUuid::new(),
            name: name.to_string(),
            price: Decimal::new(1_050, 2),
            image_url: Some(format!("https://cdn.example/{name}.jpg")),
            category: None,
            quantity: Quantity::clamped(quantity),
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let (_, storage) = storage();

        assert!(storage.load().is_empty());
    }

    #[test]
    fn saved_lines_load_back() -> TestResult {
        let (_, storage) = storage();
        let lines = vec![line("mug", 2), line("pin", 1)];

        storage.save(&lines)?;

        assert_eq!(storage.load(), lines);

        Ok(())
    }

    #[test]
    fn stored_layout_uses_short_field_names() -> TestResult {
        let (store, storage) = storage();
        let mug = line("mug", 3);

        storage.save(std::slice::from_ref(&mug))?;

        let raw = store.get_item(GUEST_CART_KEY)?.unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        assert_eq!(value[0]["id"], mug.product_uuid.to_string());
        assert_eq!(value[0]["qty"], 3);
        assert_eq!(value[0]["price"], 10.5);
        assert_eq!(value[0]["image"], "https://cdn.example/mug.jpg");

        Ok(())
    }

    #[test]
    fn malformed_values_load_empty() -> TestResult {
        let (store, storage) = storage();

        for raw in ["not json", "{\"id\": 1}", "42", "[{\"name\": \"no id\"}]"] {
            store.set_item(GUEST_CART_KEY, raw)?;

            assert!(storage.load().is_empty(), "expected empty cart for {raw}");
        }

        Ok(())
    }

    #[test]
    fn loaded_lines_are_normalized() -> TestResult {
        let (store, storage) = storage();
        let product = ProductUuid::new();

        store.set_item(
            GUEST_CART_KEY,
            &format!(
                "[{{\"id\":\"{product}\",\"name\":\"a\",\"price\":1,\"qty\":500}},\
                  {{\"id\":\"{product}\",\"name\":\"a\",\"price\":1,\"qty\":2}}]"
            ),
        )?;

        let loaded = storage.load();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().map(|line| line.quantity), Some(Quantity::MAX));

        Ok(())
    }

    #[test]
    fn lines_with_out_of_range_prices_are_dropped() -> TestResult {
        let (store, storage) = storage();
        let huge = ProductUuid::new();
        let negative = ProductUuid::new();
        let kept = ProductUuid::new();

        store.set_item(
            GUEST_CART_KEY,
            &format!(
                "[{{\"id\":\"{huge}\",\"name\":\"x\",\"price\":1e27,\"qty\":99}},\
                  {{\"id\":\"{negative}\",\"name\":\"y\",\"price\":-5,\"qty\":1}},\
                  {{\"id\":\"{kept}\",\"name\":\"z\",\"price\":2.5,\"qty\":2}}]"
            ),
        )?;

        let loaded = storage.load();

        assert_eq!(
            loaded.iter().map(|line| line.product_uuid).collect::<Vec<_>>(),
            [kept]
        );

        Ok(())
    }

    #[test]
    fn engine_totals_survive_an_oversized_stored_price() -> TestResult {
        let store = Arc::new(MemoryLocalStore::default());
        let product = ProductUuid::new();

        store.set_item(
            GUEST_CART_KEY,
            &format!("[{{\"id\":\"{product}\",\"name\":\"x\",\"price\":1e27,\"qty\":99}}]"),
        )?;

        let engine = CartEngine::new(store, Arc::new(MemoryCartStore::default()));
        let snapshot = engine.snapshot();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.subtotal(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn clear_removes_the_key() -> TestResult {
        let (store, storage) = storage();

        storage.save(&[line("mug", 1)])?;
        storage.clear()?;

        assert!(store.get_item(GUEST_CART_KEY)?.is_none());

        Ok(())
    }
}
