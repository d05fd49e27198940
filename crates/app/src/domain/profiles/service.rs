//! Profiles service.

use async_trait::async_trait;
use mockall::automock;
use storefront::UserUuid;
use tracing::info;

use crate::{
    database::Db,
    domain::profiles::{errors::ProfilesServiceError, repository::PgProfilesRepository},
};

#[derive(Debug, Clone)]
pub struct PgProfilesService {
    db: Db,
    repository: PgProfilesRepository,
}

impl PgProfilesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProfilesRepository::new(),
        }
    }
}

#[async_trait]
impl ProfilesService for PgProfilesService {
    async fn is_admin(&self, user: UserUuid) -> Result<bool, ProfilesServiceError> {
        let mut tx = self.db.begin().await?;

        let is_admin = self.repository.get_is_admin(&mut tx, user).await?;

        tx.commit().await?;

        Ok(is_admin.unwrap_or(false))
    }

    #[tracing::instrument(
        name = "profiles.service.set_admin",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn set_admin(&self, user: UserUuid, is_admin: bool) -> Result<(), ProfilesServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.set_is_admin(&mut tx, user, is_admin).await?;

        tx.commit().await?;

        info!(user_uuid = %user, is_admin, "updated admin flag");

        Ok(())
    }
}

/// Per-user profile flags.
#[automock]
#[async_trait]
pub trait ProfilesService: Send + Sync {
    /// Whether the user may use the back office. Users without a profile are
    /// not admins.
    async fn is_admin(&self, user: UserUuid) -> Result<bool, ProfilesServiceError>;

    /// Grants or revokes back-office access, creating the profile if needed.
    async fn set_admin(&self, user: UserUuid, is_admin: bool) -> Result<(), ProfilesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn missing_profile_is_not_admin() -> TestResult {
        let ctx = TestContext::new().await;

        assert!(!ctx.profiles.is_admin(UserUuid::new()).await?);

        Ok(())
    }

    #[tokio::test]
    async fn set_admin_grants_and_revokes() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        ctx.profiles.set_admin(user, true).await?;

        assert!(ctx.profiles.is_admin(user).await?);

        ctx.profiles.set_admin(user, false).await?;

        assert!(!ctx.profiles.is_admin(user).await?);

        Ok(())
    }

    #[tokio::test]
    async fn admin_flag_is_per_user() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = UserUuid::new();

        ctx.profiles.set_admin(admin, true).await?;

        assert!(!ctx.profiles.is_admin(UserUuid::new()).await?);

        Ok(())
    }
}
