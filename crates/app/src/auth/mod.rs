//! Authentication

pub mod hosted;
mod responses;

pub use hosted::{HostedIdentityProvider, SESSION_KEY};
