//! Test infrastructure shared by the Postgres-backed tests.

mod context;
pub(crate) mod helpers;

pub(crate) use context::TestContext;
