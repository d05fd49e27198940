//! Shopper-side wiring: the device's local store, the saved session and the
//! cart engine on top of the database.

use std::sync::Arc;

use clap::Args;
use storefront::local::{GuestCartStorage, LocalStore};

use crate::{
    auth::HostedIdentityProvider,
    config::{AuthConfig, DatabaseConfig, LocalStoreConfig},
    context::{AppContext, Storefront},
    local_store::FileLocalStore,
};

#[derive(Debug, Args)]
pub(crate) struct ShopperArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    auth: AuthConfig,

    #[command(flatten)]
    local_store: LocalStoreConfig,
}

pub(crate) struct Shopper {
    pub ctx: AppContext,
    pub shop: Storefront,
}

impl ShopperArgs {
    /// Connect, restore the saved session and reconcile the cart with it.
    pub(crate) async fn open(&self) -> Result<Shopper, String> {
        let ctx = AppContext::from_database_url(&self.database.database_url)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let local: Arc<dyn LocalStore> =
            Arc::new(FileLocalStore::new(&self.local_store.local_store_dir));

        let identity = Arc::new(HostedIdentityProvider::persisted(
            self.auth.clone(),
            local.clone(),
        ));

        let guest = GuestCartStorage::new(local, self.local_store.guest_cart_key.clone());
        let shop = ctx.storefront(identity, guest);

        shop.start()
            .await
            .map_err(|error| format!("failed to load cart: {error}"))?;

        Ok(Shopper { ctx, shop })
    }
}
