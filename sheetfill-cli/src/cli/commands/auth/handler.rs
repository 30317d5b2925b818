//! Auth command handler

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use colored::*;

use super::AuthCommands;
use crate::api::AuthManager;
use crate::cli::commands::CredentialArgs;
use crate::config::ConfigLayer;

pub async fn handle_auth_command(command: AuthCommands, config_path: Option<&Path>) -> Result<i32> {
    crate::logging::init(None)?;

    match command {
        AuthCommands::Login { credentials } => {
            let auth = auth_manager(&credentials, config_path)?;
            let token = auth
                .login(|url| {
                    println!("Open this URL in your browser to authorize sheetfill:");
                    println!();
                    println!("  {}", url.cyan());
                    println!();
                    println!("Waiting for the redirect...");
                })
                .await?;

            println!(
                "{} Token saved to {}",
                "Authenticated.".bright_green().bold(),
                auth.token_path().display()
            );
            if !token.can_refresh() {
                println!(
                    "{}",
                    "Warning: no refresh token was issued; you will need to log in again when it expires."
                        .yellow()
                );
            }
            Ok(0)
        }
        AuthCommands::Status { credentials } => {
            let auth = auth_manager(&credentials, config_path)?;
            let Some(token) = auth.cached_token()? else {
                println!(
                    "{} No cached token at {}. Run 'sheetfill auth login'.",
                    "Not authenticated.".yellow().bold(),
                    auth.token_path().display()
                );
                return Ok(1);
            };

            println!("Token file:    {}", auth.token_path().display());
            match token.expires_at {
                Some(expires_at) if expires_at > Utc::now() => {
                    println!("Expires:       {}", expires_at.to_rfc3339().bright_green())
                }
                Some(expires_at) => println!("Expired:       {}", expires_at.to_rfc3339().yellow()),
                None => println!("Expires:       {}", "unknown".dimmed()),
            }
            println!(
                "Refreshable:   {}",
                if token.can_refresh() {
                    "yes".bright_green()
                } else {
                    "no".bright_red()
                }
            );
            if !token.scopes.is_empty() {
                println!("Scopes:        {}", token.scopes.join(" "));
            }
            Ok(0)
        }
    }
}

fn auth_manager(credentials: &CredentialArgs, config_path: Option<&Path>) -> Result<AuthManager> {
    let layer = ConfigLayer::load(config_path)?.merge(ConfigLayer {
        credentials_path: credentials.credentials_path.clone(),
        token_path: credentials.token_path.clone(),
        ..Default::default()
    });

    Ok(AuthManager::from_files(
        &layer.credentials_path(),
        &layer.token_path(),
    )?)
}
