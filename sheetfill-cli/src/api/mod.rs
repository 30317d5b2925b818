//! Google Sheets API module
//!
//! OAuth token handling, the values client and A1 range helpers.

pub mod a1;
pub mod auth;
pub mod client;
pub mod models;

pub use auth::AuthManager;
pub use client::SheetsClient;
