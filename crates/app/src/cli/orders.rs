use clap::{Args, Subcommand};
use storefront::{OrderStatus, UserUuid, orders::OrderUuid};

use crate::{cli::output, config::DatabaseConfig, context::AppContext};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,

    #[command(flatten)]
    database: DatabaseConfig,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List orders, newest first
    List {
        /// Only this user's orders
        #[arg(long)]
        user: Option<UserUuid>,
    },

    /// Show an order with its lines
    Show { order: OrderUuid },

    /// Move an order to another status
    SetStatus { order: OrderUuid, status: OrderStatus },
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    let ctx = AppContext::from_database_url(&command.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match command.command {
        OrdersSubcommand::List { user } => {
            let orders = match user {
                Some(user) => ctx.orders.list_orders(user).await.map_err(|e| e.to_string()),
                None => ctx.admin_orders.list_orders().await.map_err(|e| e.to_string()),
            }
            .map_err(|error| format!("failed to list orders: {error}"))?;

            println!("{}", output::orders(&orders));
        }
        OrdersSubcommand::Show { order } => {
            let details = ctx
                .admin_orders
                .get_order(order)
                .await
                .map_err(|error| format!("failed to load order {order}: {error}"))?;

            println!("{}", output::order_details(&details));
        }
        OrdersSubcommand::SetStatus { order, status } => {
            let updated = ctx
                .admin_orders
                .update_status(order, status)
                .await
                .map_err(|error| format!("failed to update order {order}: {error}"))?;

            println!("order {} is now {}", updated.uuid, updated.status);
        }
    }

    Ok(())
}
