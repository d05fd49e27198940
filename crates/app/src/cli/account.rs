use clap::{Args, Subcommand};
use storefront::{orders::OrderUuid, session::Credentials};

use crate::cli::{output, shopper::ShopperArgs};

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,

    #[command(flatten)]
    shopper: ShopperArgs,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Sign in; the guest cart is replaced by the account's cart
    SignIn(CredentialsArgs),

    /// Create an account and sign it in
    SignUp(CredentialsArgs),

    /// Sign out; the cart on this device is emptied
    SignOut,

    /// Show the signed-in user
    Whoami,

    /// List the signed-in user's orders
    Orders,

    /// Show one of the signed-in user's orders
    Order { order: OrderUuid },
}

#[derive(Debug, Args)]
struct CredentialsArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
    password: String,
}

impl From<CredentialsArgs> for Credentials {
    fn from(args: CredentialsArgs) -> Self {
        Self {
            email: args.email,
            password: args.password,
        }
    }
}

pub(crate) async fn run(command: AccountCommand) -> Result<(), String> {
    let shopper = command.shopper.open().await?;
    let shop = &shopper.shop;

    match command.command {
        AccountSubcommand::SignIn(args) => {
            let identity = shop
                .identity
                .sign_in(args.into())
                .await
                .map_err(|error| format!("sign in failed: {error}"))?;

            let snapshot = shop
                .cart
                .sync_session(Some(&identity))
                .await
                .map_err(|error| format!("failed to load cart: {error}"))?;

            println!("signed in as {}", identity.user_uuid);
            println!("{}", output::cart(&snapshot));
        }
        AccountSubcommand::SignUp(args) => {
            let identity = shop
                .identity
                .sign_up(args.into())
                .await
                .map_err(|error| format!("sign up failed: {error}"))?;

            shop.cart
                .sync_session(Some(&identity))
                .await
                .map_err(|error| format!("failed to load cart: {error}"))?;

            println!("signed up as {}", identity.user_uuid);
        }
        AccountSubcommand::SignOut => {
            let signed_out = shop.identity.sign_out().await;

            shop.cart
                .sync_session(None)
                .await
                .map_err(|error| format!("failed to reset cart: {error}"))?;

            signed_out.map_err(|error| format!("sign out failed: {error}"))?;

            println!("signed out");
        }
        AccountSubcommand::Whoami => {
            let Some(identity) = shop
                .identity
                .current_session()
                .await
                .map_err(|error| format!("failed to resolve session: {error}"))?
            else {
                println!("not signed in");
                return Ok(());
            };

            let is_admin = shopper
                .ctx
                .profiles
                .is_admin(identity.user_uuid)
                .await
                .map_err(|error| format!("failed to load profile: {error}"))?;

            println!("user_uuid: {}", identity.user_uuid);
            println!("email: {}", identity.email.as_deref().unwrap_or("-"));
            println!("is_admin: {is_admin}");
        }
        AccountSubcommand::Orders => {
            let orders = shop
                .orders
                .order_history()
                .await
                .map_err(|error| error.user_message())?;

            println!("{}", output::orders(&orders));
        }
        AccountSubcommand::Order { order } => {
            let details = shop
                .orders
                .order_details(order)
                .await
                .map_err(|error| error.user_message())?;

            println!("{}", output::order_details(&details));
        }
    }

    Ok(())
}
