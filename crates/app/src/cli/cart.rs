use clap::{Args, Subcommand};
use storefront::{ProductUuid, Quantity};

use crate::cli::{output, shopper::ShopperArgs};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,

    #[command(flatten)]
    shopper: ShopperArgs,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart
    Show,

    /// Add a catalog product, merging into an existing line
    Add {
        product: ProductUuid,

        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },

    /// Set a line's quantity; input is clamped to 1..=99
    Set { product: ProductUuid, quantity: String },

    /// Add one unit to a line
    Increment { product: ProductUuid },

    /// Remove one unit from a line, never below one
    Decrement { product: ProductUuid },

    /// Remove a line
    Remove { product: ProductUuid },

    /// Empty the cart
    Clear,

    /// Reload the account's cart
    Refresh,
}

pub(crate) async fn run(command: CartCommand) -> Result<(), String> {
    let shopper = command.shopper.open().await?;
    let cart = &shopper.shop.cart;

    let snapshot = match command.command {
        CartSubcommand::Show => Ok(cart.snapshot()),
        CartSubcommand::Add { product, quantity } => {
            let product = shopper
                .ctx
                .products
                .get_product(product)
                .await
                .map_err(|error| format!("failed to load product {product}: {error}"))?;

            cart.add_item(&product, quantity).await
        }
        CartSubcommand::Set { product, quantity } => {
            let quantity = Quantity::from_input(&quantity);

            cart.set_quantity(product, i64::from(quantity.get())).await
        }
        CartSubcommand::Increment { product } => cart.increment(product).await,
        CartSubcommand::Decrement { product } => cart.decrement(product).await,
        CartSubcommand::Remove { product } => cart.remove_item(product).await,
        CartSubcommand::Clear => cart.clear().await,
        CartSubcommand::Refresh => cart.refresh().await,
    }
    .map_err(|error| format!("cart update failed: {error}"))?;

    println!("{}", output::cart(&snapshot));

    Ok(())
}
