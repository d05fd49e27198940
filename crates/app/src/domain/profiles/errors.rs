//! Profiles service errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilesServiceError {
    #[error("storage error")]
    Sql(#[from] Error),
}
