//! Environment Commands

use anyhow::Result;
use clap::Subcommand;

use rflocal_common::EnvironmentClient;

use crate::client::ApiClient;
use crate::output::{print_message, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum EnvironmentCommands {
    /// Show whether an environment is the account default
    IsDefault {
        /// Environment ID
        id: i64,
    },

    /// Make an environment the account default
    SetDefault {
        /// Environment ID
        id: i64,

        /// Clear the default flag instead of setting it
        #[arg(long)]
        unset: bool,
    },

    /// Delete an environment
    Delete {
        /// Environment ID
        id: i64,
    },
}

pub async fn execute(cmd: EnvironmentCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        EnvironmentCommands::IsDefault { id } => {
            let default = client.is_environment_default(id).await?;
            let message = if default {
                format!("Environment {} is the default", id)
            } else {
                format!("Environment {} is not the default", id)
            };
            print_message(&message, format);
        }
        EnvironmentCommands::SetDefault { id, unset } => {
            client.set_environment_default(id, !unset).await?;
            if unset {
                print_success(&format!("Environment {} is no longer the default", id));
            } else {
                print_success(&format!("Environment {} is now the default", id));
            }
        }
        EnvironmentCommands::Delete { id } => {
            client.delete_environment(id).await?;
            print_success(&format!("Environment {} deleted", id));
        }
    }
    Ok(())
}
