pub mod auth;
pub mod update;

use std::path::PathBuf;

use clap::Args;

/// OAuth file locations shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// OAuth client secrets JSON (default: credentials.json)
    #[arg(long = "credentials", env = "SHEETFILL_CREDENTIALS")]
    pub credentials_path: Option<PathBuf>,

    /// Cached OAuth token file (default: token.json)
    #[arg(long = "token", env = "SHEETFILL_TOKEN")]
    pub token_path: Option<PathBuf>,
}
