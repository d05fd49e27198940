//! Carts Repository

use sqlx::{Postgres, Transaction, query_scalar};
use storefront::{UserUuid, store::CartUuid};
use uuid::Uuid;

const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Get or create the user's cart. Concurrent callers for the same user
    /// converge on one row through the unique `user_uuid` constraint.
    pub(crate) async fn ensure_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<CartUuid, sqlx::Error> {
        let uuid: Uuid = query_scalar(ENSURE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(CartUuid::from_uuid(uuid))
    }
}
