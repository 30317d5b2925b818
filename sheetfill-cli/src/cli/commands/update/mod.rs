//! `sheetfill update`

pub mod handler;

use std::path::PathBuf;

use clap::Args;

use super::CredentialArgs;
use crate::config::ConfigLayer;

pub use handler::handle_update_command;

#[derive(Args, Debug, Clone)]
pub struct UpdateCommands {
    /// First row to process (1-based, inclusive)
    #[arg(short, long, env = "SHEETFILL_START_ROW")]
    pub start_row: Option<u32>,

    /// Last row to process (1-based, inclusive)
    #[arg(short, long, env = "SHEETFILL_END_ROW")]
    pub end_row: Option<u32>,

    /// Key to URL mapping JSON file
    #[arg(short, long = "mapping", env = "SHEETFILL_MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Spreadsheet ID (from the sheet URL)
    #[arg(long, env = "SHEETFILL_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Tab name within the spreadsheet
    #[arg(long = "sheet", env = "SHEETFILL_SHEET_NAME")]
    pub sheet_name: Option<String>,

    /// Column holding the keys; values are read from and written to two columns right of it
    #[arg(long, env = "SHEETFILL_KEY_COLUMN")]
    pub key_column: Option<String>,

    /// Directory for the log file and the missing keys list
    #[arg(short, long, env = "SHEETFILL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Show the cells that would be written; neither the sheet nor the missing keys file is changed
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateCommands {
    /// Settings given on the command line or through the environment
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            spreadsheet_id: self.spreadsheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            key_column: self.key_column.clone(),
            start_row: self.start_row,
            end_row: self.end_row,
            mapping_file: self.mapping_file.clone(),
            credentials_path: self.credentials.credentials_path.clone(),
            token_path: self.credentials.token_path.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}
