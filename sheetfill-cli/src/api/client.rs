//! Google Sheets API v4 client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::auth::AuthManager;
use super::models::{
    ApiErrorBody, BatchUpdateValuesRequest, BatchUpdateValuesResponse, ValueRange,
};
use crate::reconcile::{CellWrite, SheetStore};

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Values are written verbatim, never parsed as formulas or numbers
const VALUE_INPUT_OPTION: &str = "RAW";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client bound to a single spreadsheet
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    auth: AuthManager,
    spreadsheet_id: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(auth: AuthManager, spreadsheet_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            auth,
            spreadsheet_id: spreadsheet_id.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/values{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            suffix
        )
    }

    /// `spreadsheets.values.get`
    pub async fn get_values(&self, range: &str) -> Result<ValueRange> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(&format!("/{}", urlencoding::encode(range)));
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Request for range {} failed", range))?;

        let response = check_status(response).await?;
        response
            .json::<ValueRange>()
            .await
            .context("Failed to parse values response")
    }

    /// `spreadsheets.values.batchUpdate`
    pub async fn batch_update_values(
        &self,
        data: Vec<ValueRange>,
    ) -> Result<BatchUpdateValuesResponse> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(":batchUpdate");
        debug!("POST {} ({} ranges)", url, data.len());

        let body = BatchUpdateValuesRequest {
            value_input_option: VALUE_INPUT_OPTION.to_string(),
            data,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .context("Batch update request failed")?;

        let response = check_status(response).await?;
        response
            .json::<BatchUpdateValuesResponse>()
            .await
            .context("Failed to parse batch update response")
    }
}

/// Turn a non-2xx response into an error carrying the API's message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{}", api_error_message(status, &body))
}

/// Prefer the Google error envelope; fall back to the raw body
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.trim().is_empty() => {
            format!("{} {}", parsed.error.status, parsed.error.message)
        }
        _ => body.to_string(),
    };

    format!("Sheets API returned {}: {}", status, message.trim())
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.get_values(range).await?.string_rows())
    }

    async fn batch_write(&self, writes: &[CellWrite]) -> Result<usize> {
        let data = writes
            .iter()
            .map(|w| ValueRange::single(w.range.clone(), w.value.clone()))
            .collect();
        let response = self.batch_update_values(data).await?;
        Ok(response.total_updated_cells)
    }
}
