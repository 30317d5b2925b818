//! `sheetfill auth`

pub mod handler;

use clap::Subcommand;

use super::CredentialArgs;

pub use handler::handle_auth_command;

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Authorize in the browser and cache a token
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Show the cached token's state
    Status {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
}
