mod api;
mod cli;
mod config;
mod error;
mod logging;
mod reconcile;

use clap::Parser;
use colored::*;

use cli::commands::{auth, update};
use cli::{Cli, Commands};
use error::SyncError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env is fine; SHEETFILL_* may come from the real environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Update(args) => update::handle_update_command(args, config_path).await,
        Commands::Auth(command) => auth::handle_auth_command(command, config_path).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            e.downcast_ref::<SyncError>()
                .map(SyncError::exit_code)
                .unwrap_or(1)
        }
    };

    std::process::exit(code);
}
