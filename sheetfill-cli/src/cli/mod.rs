//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::auth::AuthCommands;
use commands::update::UpdateCommands;

#[derive(Parser)]
#[command(name = "sheetfill")]
#[command(
    author,
    version,
    about = "Fill blank URL cells in a Google Sheets tab from a key to URL mapping"
)]
pub struct Cli {
    /// TOML config file (default: <config dir>/sheetfill/config.toml if present)
    #[arg(long, global = true, env = "SHEETFILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill blank cells in the value column for a row range
    Update(UpdateCommands),

    /// Manage the cached OAuth token
    #[command(subcommand)]
    Auth(AuthCommands),
}
