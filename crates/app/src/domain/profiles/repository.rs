//! Profiles Repository

use sqlx::{Postgres, Transaction, query, query_scalar};
use storefront::UserUuid;

const GET_PROFILE_IS_ADMIN_SQL: &str = include_str!("sql/get_profile_is_admin.sql");
const UPSERT_PROFILE_IS_ADMIN_SQL: &str = include_str!("sql/upsert_profile_is_admin.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProfilesRepository;

impl PgProfilesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_is_admin(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<bool>, sqlx::Error> {
        query_scalar(GET_PROFILE_IS_ADMIN_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn set_is_admin(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        is_admin: bool,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_PROFILE_IS_ADMIN_SQL)
            .bind(user.into_uuid())
            .bind(is_admin)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
