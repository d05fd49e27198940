use clap::{Args, Subcommand};
use storefront::UserUuid;

use crate::{config::DatabaseConfig, context::AppContext};

#[derive(Debug, Args)]
pub(crate) struct ProfilesCommand {
    #[command(subcommand)]
    command: ProfilesSubcommand,

    #[command(flatten)]
    database: DatabaseConfig,
}

#[derive(Debug, Subcommand)]
enum ProfilesSubcommand {
    /// Show whether a user has back-office access
    Show { user: UserUuid },

    /// Grant back-office access
    SetAdmin {
        user: UserUuid,

        /// Revoke instead of grant
        #[arg(long)]
        revoke: bool,
    },
}

pub(crate) async fn run(command: ProfilesCommand) -> Result<(), String> {
    let ctx = AppContext::from_database_url(&command.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match command.command {
        ProfilesSubcommand::Show { user } => {
            let is_admin = ctx
                .profiles
                .is_admin(user)
                .await
                .map_err(|error| format!("failed to load profile: {error}"))?;

            println!("user_uuid: {user}");
            println!("is_admin: {is_admin}");
        }
        ProfilesSubcommand::SetAdmin { user, revoke } => {
            ctx.profiles
                .set_admin(user, !revoke)
                .await
                .map_err(|error| format!("failed to update profile: {error}"))?;

            println!("user_uuid: {user}");
            println!("is_admin: {}", !revoke);
        }
    }

    Ok(())
}
