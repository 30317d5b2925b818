//! Update command handler

use std::path::Path;

use anyhow::Result;
use colored::*;

use super::UpdateCommands;
use crate::api::{AuthManager, SheetsClient};
use crate::config::{Config, ConfigLayer};
use crate::reconcile::pipeline::{self, RunOutcome, RunParams, RunSummary};
use crate::reconcile::{SheetLayout, WriteOutcome};

/// Resolve configuration, run one reconciliation and return the exit code
pub async fn handle_update_command(args: UpdateCommands, config_path: Option<&Path>) -> Result<i32> {
    let layer = ConfigLayer::load(config_path)?.merge(args.layer());
    let config = Config::resolve(layer)?;

    // Nothing else runs without the OAuth client file
    config.check_credentials()?;

    crate::logging::init(Some(&config.log_file()))?;
    print_banner(&config, args.dry_run);

    let layout = SheetLayout::new(&config.sheet_name, &config.key_column)?;
    let auth = AuthManager::from_files(&config.credentials_path, &config.token_path)?;
    auth.access_token().await?;
    let client = SheetsClient::new(auth, &config.spreadsheet_id)?;
    log::info!("Sheets API client ready for spreadsheet {}", client.spreadsheet_id());

    let params = RunParams {
        start_row: config.start_row,
        end_row: config.end_row,
        mapping_file: config.mapping_file.clone(),
        misses_file: config.misses_file(),
        dry_run: args.dry_run,
    };

    let outcome = pipeline::run(&client, &layout, &params).await;
    match &outcome {
        RunOutcome::Aborted(reason) => {
            eprintln!("{} {}", "Aborted:".bright_red().bold(), reason);
        }
        RunOutcome::Completed(summary) => print_summary(summary),
    }

    Ok(outcome.exit_code())
}

fn print_banner(config: &Config, dry_run: bool) {
    println!("{}", "=".repeat(60));
    println!("{}", "SHEETFILL URL UPDATER".bright_cyan().bold());
    println!("{}", "=".repeat(60));
    println!();
    println!("{}", "Update configuration:".bold());
    println!("   Spreadsheet:  {}", config.spreadsheet_id.cyan());
    println!("   Sheet:        {}", config.sheet_name.cyan());
    println!(
        "   Row range:    {} to {}",
        config.start_row.to_string().cyan(),
        config.end_row.to_string().cyan()
    );
    println!("   Key column:   {}", config.key_column.cyan());
    println!(
        "   Mapping file: {}",
        config.mapping_file.display().to_string().cyan()
    );
    println!(
        "   Credentials:  {}",
        config.credentials_path.display().to_string().cyan()
    );
    if dry_run {
        println!(
            "   {}",
            "Dry run: the sheet and the missing keys file will not be modified".yellow()
        );
    }
    println!();
}

fn print_summary(summary: &RunSummary) {
    println!();
    match &summary.write {
        Ok(WriteOutcome::Planned(writes)) => {
            println!("{}", "Planned writes:".bold());
            for write in writes {
                println!("   {} <- {}", write.range.cyan(), write.value);
            }
            println!();
        }
        Ok(_) => println!("{}", "Sheet update completed".bright_green().bold()),
        Err(e) => println!("{} {}", "Sheet update failed:".bright_red().bold(), e),
    }

    println!("{}", "Summary:".bold());
    println!("   Total rows processed:        {}", summary.rows);
    println!(
        "   URLs updated:                {}",
        match &summary.write {
            Ok(outcome) => outcome.cells().to_string().bright_green(),
            Err(_) => "0".bright_red(),
        }
    );
    println!("   Skipped (already had URLs):  {}", summary.skipped_existing);
    println!("   Skipped (no key):            {}", summary.skipped_empty);
    println!(
        "   Missing from mapping:        {}",
        if summary.missing > 0 {
            summary.missing.to_string().yellow()
        } else {
            summary.missing.to_string().normal()
        }
    );

    if let Some(path) = &summary.misses_file {
        println!(
            "   Missing keys saved to:       {}",
            path.display().to_string().cyan()
        );
    }
    if let Some(err) = &summary.misses_error {
        println!(
            "   {} {}",
            "Failed to save missing keys:".bright_red(),
            err
        );
    }
}
