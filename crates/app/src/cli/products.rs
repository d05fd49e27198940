use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use storefront::ProductUuid;

use crate::{
    cli::output,
    config::DatabaseConfig,
    context::AppContext,
    domain::products::data::{NewProduct, NewProductImage},
};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,

    #[command(flatten)]
    database: DatabaseConfig,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List the catalog, newest first
    List,

    /// Add a product to the catalog
    Create(CreateProductArgs),
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Unit price, e.g. `12.99`
    #[arg(long)]
    price: Decimal,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Gallery image URLs, in display order
    #[arg(long = "image")]
    images: Vec<String>,
}

pub(crate) async fn run(command: ProductsCommand) -> Result<(), String> {
    let ctx = AppContext::from_database_url(&command.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match command.command {
        ProductsSubcommand::List => {
            let products = ctx
                .products
                .list_products()
                .await
                .map_err(|error| format!("failed to list products: {error}"))?;

            println!("{}", output::products(&products));
        }
        ProductsSubcommand::Create(args) => {
            let images = args
                .images
                .into_iter()
                .zip(0..)
                .map(|(image_url, sort_order)| NewProductImage {
                    image_url,
                    sort_order,
                })
                .collect();

            let product = ctx
                .products
                .create_product(NewProduct {
                    uuid: ProductUuid::new(),
                    name: args.name,
                    price: args.price,
                    category: args.category,
                    description: args.description,
                    image_url: None,
                    images,
                })
                .await
                .map_err(|error| format!("failed to create product: {error}"))?;

            println!("{}", output::products(&[product]));
        }
    }

    Ok(())
}
