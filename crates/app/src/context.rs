//! App Context

use std::sync::Arc;

use storefront::{
    CartEngine, CartError, CartSnapshot, IdentityProvider, OrderService,
    local::GuestCartStorage,
    orders::OrdersStore,
    session::IdentityError,
    store::RemoteCartStore,
};
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::PgCartStore,
        orders::{OrdersAdminService, PgOrdersAdminService, PgOrdersStore},
        products::{PgProductsService, ProductsService},
        profiles::{PgProfilesService, ProfilesService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn RemoteCartStore>,
    pub orders: Arc<dyn OrdersStore>,
    pub admin_orders: Arc<dyn OrdersAdminService>,
    pub profiles: Arc<dyn ProfilesService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_db(Db::new(pool)))
    }

    #[must_use]
    pub fn from_db(db: Db) -> Self {
        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartStore::new(db.clone())),
            orders: Arc::new(PgOrdersStore::new(db.clone())),
            admin_orders: Arc::new(PgOrdersAdminService::new(db.clone())),
            profiles: Arc::new(PgProfilesService::new(db.clone())),
            db,
        }
    }

    /// Shopper-facing services for one device, backed by this context's stores.
    #[must_use]
    pub fn storefront(
        &self,
        identity: Arc<dyn IdentityProvider>,
        guest: GuestCartStorage,
    ) -> Storefront {
        Storefront::new(identity, guest, self.carts.clone(), self.orders.clone())
    }
}

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// The cart and checkout for one device.
#[derive(Clone)]
pub struct Storefront {
    pub identity: Arc<dyn IdentityProvider>,
    pub cart: Arc<CartEngine>,
    pub orders: OrderService,
}

impl Storefront {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        guest: GuestCartStorage,
        carts: Arc<dyn RemoteCartStore>,
        orders: Arc<dyn OrdersStore>,
    ) -> Self {
        Self {
            cart: Arc::new(CartEngine::with_guest_storage(guest, carts)),
            orders: OrderService::new(identity.clone(), orders),
            identity,
        }
    }

    /// Resolve the current session and point the cart at it.
    ///
    /// # Errors
    ///
    /// Returns an error when the session cannot be resolved or the member cart
    /// cannot be loaded.
    pub async fn start(&self) -> Result<CartSnapshot, StorefrontError> {
        let identity = self.identity.current_session().await?;

        Ok(self.cart.sync_session(identity.as_ref()).await?)
    }
}
