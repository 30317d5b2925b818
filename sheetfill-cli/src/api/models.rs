//! Google Sheets API and OAuth wire models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Response body of `spreadsheets.values.get`
///
/// The API omits `values` entirely for an empty range and trims trailing
/// empty cells and rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    pub fn single(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            major_dimension: None,
            values: vec![vec![serde_json::Value::String(value.into())]],
        }
    }

    /// Rows as strings; numbers and booleans are rendered, nulls become ""
    pub fn string_rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Request body of `spreadsheets.values.batchUpdate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: String,
    pub data: Vec<ValueRange>,
}

/// Response body of `spreadsheets.values.batchUpdate`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub total_updated_cells: usize,
}

/// Google API error envelope (`{"error": {"code", "message", "status"}}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// OAuth client secrets as downloaded from the Google Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretsFile {
    pub installed: Option<ClientSecrets>,
    pub web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ClientSecretsFile {
    pub fn into_secrets(self) -> Option<ClientSecrets> {
        self.installed.or(self.web)
    }
}

/// Cached OAuth token
///
/// Field aliases accept the `token.json` written by google-auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, alias = "expiry", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl TokenInfo {
    /// Usable for at least `leeway` more
    ///
    /// A token without an expiry is assumed valid.
    pub fn is_fresh(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - leeway > now,
            None => true,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Token endpoint response (authorization code and refresh grants)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Merge into a cached token; a refresh grant usually omits the refresh token
    pub fn into_token(self, previous: Option<&TokenInfo>, now: DateTime<Utc>) -> TokenInfo {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => previous.map(|p| p.scopes.clone()).unwrap_or_default(),
        };

        TokenInfo {
            access_token: self.access_token,
            refresh_token,
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scopes,
        }
    }
}
