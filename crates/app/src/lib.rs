//! Persistence, hosted identity and the command line for the storefront.

pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod local_store;
pub mod observability;

#[cfg(test)]
mod test;
