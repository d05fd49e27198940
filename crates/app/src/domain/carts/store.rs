//! `PostgreSQL` cart store.

use async_trait::async_trait;
use storefront::{
    CartLine, ProductUuid, Quantity, StoreError, UserUuid,
    store::{CartUuid, RemoteCartStore},
};

use crate::{
    database::{Db, store_error},
    domain::carts::repositories::{PgCartItemsRepository, PgCartsRepository},
};

#[derive(Debug, Clone)]
pub struct PgCartStore {
    db: Db,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
}

impl PgCartStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
        }
    }
}

#[async_trait]
impl RemoteCartStore for PgCartStore {
    #[tracing::instrument(
        name = "carts.store.ensure_cart",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn ensure_cart(&self, user: UserUuid) -> Result<CartUuid, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let cart = self
            .carts
            .ensure_cart(&mut tx, user)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.store.load_lines",
        skip(self),
        fields(cart_uuid = %cart),
        err
    )]
    async fn load_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let items = self
            .items
            .get_cart_items(&mut tx, cart)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(items.into_iter().map(CartLine::from).collect())
    }

    async fn find_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<Option<CartLine>, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let item = self
            .items
            .find_cart_item(&mut tx, cart, product)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(item.map(CartLine::from))
    }

    #[tracing::instrument(
        name = "carts.store.insert_line",
        skip(self, line),
        fields(cart_uuid = %cart, product_uuid = %line.product_uuid),
        err
    )]
    async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        self.items
            .create_cart_item(&mut tx, cart, &line)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)
    }

    #[tracing::instrument(
        name = "carts.store.update_quantity",
        skip(self),
        fields(cart_uuid = %cart, product_uuid = %product, quantity = %quantity),
        err
    )]
    async fn update_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: Quantity,
    ) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        let rows_affected = self
            .items
            .update_quantity(&mut tx, cart, product, quantity)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(rows_affected)
    }

    #[tracing::instrument(
        name = "carts.store.delete_line",
        skip(self),
        fields(cart_uuid = %cart, product_uuid = %product),
        err
    )]
    async fn delete_line(&self, cart: CartUuid, product: ProductUuid) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        self.items
            .delete_cart_item(&mut tx, cart, product)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)
    }

    #[tracing::instrument(
        name = "carts.store.clear_lines",
        skip(self),
        fields(cart_uuid = %cart),
        err
    )]
    async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await.map_err(store_error)?;

        self.items
            .clear_cart_items(&mut tx, cart)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use storefront::{CartEngine, Identity, memory::MemoryLocalStore};
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::sample_product};

    use super::*;

    #[tokio::test]
    async fn ensure_cart_returns_the_same_cart_for_a_user() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let first = ctx.carts.ensure_cart(user).await?;
        let second = ctx.carts.ensure_cart(user).await?;
        let other = ctx.carts.ensure_cart(UserUuid::new()).await?;

        assert_eq!(first, second);
        assert_ne!(first, other);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_ensure_cart_creates_one_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let (a, b) = tokio::join!(ctx.carts.ensure_cart(user), ctx.carts.ensure_cart(user));

        assert_eq!(a?, b?);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_uuid = $1")
            .bind(user.into_uuid())
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn line_round_trip() -> TestResult {
        let ctx = TestContext::new().await;
        let product = sample_product("poster", Decimal::new(1299, 2));
        let cart = ctx.carts.ensure_cart(UserUuid::new()).await?;
        let line = CartLine::for_product(&product, Quantity::clamped(2));

        ctx.carts.insert_line(cart, line.clone()).await?;

        assert_eq!(ctx.carts.find_line(cart, product.uuid).await?, Some(line.clone()));
        assert_eq!(ctx.carts.load_lines(cart).await?, [line]);

        let touched = ctx
            .carts
            .update_quantity(cart, product.uuid, Quantity::clamped(5))
            .await?;

        assert_eq!(touched, 1);

        let reloaded = ctx.carts.find_line(cart, product.uuid).await?;

        assert_eq!(reloaded.map(|line| line.quantity.get()), Some(5));

        ctx.carts.delete_line(cart, product.uuid).await?;

        assert!(ctx.carts.load_lines(cart).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_product_line_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = sample_product("poster", Decimal::new(1299, 2));
        let cart = ctx.carts.ensure_cart(UserUuid::new()).await?;
        let line = CartLine::for_product(&product, Quantity::MIN);

        ctx.carts.insert_line(cart, line.clone()).await?;

        let result = ctx.carts.insert_line(cart, line).await;

        assert!(
            matches!(result, Err(StoreError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_cart_insert_is_an_invalid_reference() -> TestResult {
        let ctx = TestContext::new().await;
        let product = sample_product("poster", Decimal::new(1299, 2));

        let result = ctx
            .carts
            .insert_line(CartUuid::new(), CartLine::for_product(&product, Quantity::MIN))
            .await;

        assert!(
            matches!(result, Err(StoreError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn clear_keeps_the_cart_record() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let cart = ctx.carts.ensure_cart(user).await?;

        for name in ["poster", "mug"] {
            let product = sample_product(name, Decimal::ONE);

            ctx.carts
                .insert_line(cart, CartLine::for_product(&product, Quantity::MIN))
                .await?;
        }

        ctx.carts.clear_lines(cart).await?;

        assert!(ctx.carts.load_lines(cart).await?.is_empty());
        assert_eq!(ctx.carts.ensure_cart(user).await?, cart);

        Ok(())
    }

    #[tokio::test]
    async fn engine_member_cart_survives_across_engines() -> TestResult {
        let ctx = TestContext::new().await;
        let product = sample_product("poster", Decimal::new(1000, 2));
        let user = Identity::new(UserUuid::new());
        let remote = Arc::new(ctx.carts.clone());

        let phone = CartEngine::new(Arc::new(MemoryLocalStore::default()), remote.clone());

        phone.sync_session(Some(&user)).await?;
        phone.add_item(&product, 2).await?;

        let laptop = CartEngine::new(Arc::new(MemoryLocalStore::default()), remote);

        let snapshot = laptop.sync_session(Some(&user)).await?;

        assert_eq!(snapshot.count(), 2);
        assert_eq!(snapshot.subtotal(), Decimal::new(2000, 2));

        Ok(())
    }
}
