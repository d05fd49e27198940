//! Operator and shopper command line.

use clap::{Parser, Subcommand};

use crate::config::LoggingConfig;

mod account;
mod cart;
mod checkout;
mod db;
mod orders;
mod output;
mod products;
mod profiles;
mod shopper;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront CLI", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db(db::DbCommand),

    /// Catalog
    Products(products::ProductsCommand),

    /// Back-office order management
    Orders(orders::OrdersCommand),

    /// Back-office access
    Profiles(profiles::ProfilesCommand),

    /// Sign in, sign up and sign out on this device
    Account(account::AccountCommand),

    /// The cart on this device
    Cart(cart::CartCommand),

    /// Place an order for the cart on this device
    Checkout(checkout::CheckoutArgs),
}

impl Cli {
    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Run the parsed command.
    ///
    /// # Errors
    ///
    /// Returns a printable message when the command fails.
    pub async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Products(command) => products::run(command).await,
            Commands::Orders(command) => orders::run(command).await,
            Commands::Profiles(command) => profiles::run(command).await,
            Commands::Account(command) => account::run(command).await,
            Commands::Cart(command) => cart::run(command).await,
            Commands::Checkout(args) => checkout::run(args).await,
        }
    }
}
