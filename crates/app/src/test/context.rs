//! Test context for service-level integration tests.

use crate::{
    database::Db,
    domain::{
        carts::PgCartStore,
        orders::{PgOrdersAdminService, PgOrdersStore},
        products::PgProductsService,
        profiles::PgProfilesService,
    },
};

use super::db::TestDb;

pub struct TestContext {
    pub db: TestDb,
    pub carts: PgCartStore,
    pub orders: PgOrdersStore,
    pub admin_orders: PgOrdersAdminService,
    pub products: PgProductsService,
    pub profiles: PgProfilesService,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        Self {
            carts: PgCartStore::new(db.clone()),
            orders: PgOrdersStore::new(db.clone()),
            admin_orders: PgOrdersAdminService::new(db.clone()),
            products: PgProductsService::new(db.clone()),
            profiles: PgProfilesService::new(db),
            db: test_db,
        }
    }
}
