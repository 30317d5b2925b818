//! OAuth token management for the Sheets API
//!
//! Handles the cached token file, refresh-token grants and the one-off
//! loopback login flow used by `sheetfill auth login`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use log::{debug, info};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::models::{ClientSecrets, ClientSecretsFile, TokenInfo, TokenResponse};
use crate::error::SyncError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Tokens with less than this left are refreshed before use
const EXPIRY_LEEWAY_SECS: i64 = 60;

const TOKEN_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Idle loopback connections (browser preconnects) are dropped after this
const CALLBACK_READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// Loads, refreshes and persists the OAuth token for one credentials file
#[derive(Debug, Clone)]
pub struct AuthManager {
    http: reqwest::Client,
    secrets: ClientSecrets,
    token_path: PathBuf,
}

impl AuthManager {
    /// Read client secrets; the file must exist
    pub fn from_files(credentials_path: &Path, token_path: &Path) -> Result<Self, SyncError> {
        let secrets = load_client_secrets(credentials_path)?;
        let http = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::auth(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            secrets,
            token_path: token_path.to_path_buf(),
        })
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Read the cached token, if any
    pub fn cached_token(&self) -> Result<Option<TokenInfo>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.token_path)
            .with_context(|| format!("Failed to read token file: {}", self.token_path.display()))?;
        let token: TokenInfo = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file: {}", self.token_path.display()))?;
        Ok(Some(token))
    }

    fn save_token(&self, token: &TokenInfo) -> Result<()> {
        if let Some(parent) = self.token_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(token).context("Failed to serialize token")?;
        std::fs::write(&self.token_path, json)
            .with_context(|| format!("Failed to write token file: {}", self.token_path.display()))?;
        debug!("Saved token to {}", self.token_path.display());
        Ok(())
    }

    /// Return a usable access token, refreshing the cache when needed
    pub async fn access_token(&self) -> Result<String, SyncError> {
        let cached = self
            .cached_token()
            .map_err(|e| SyncError::auth(format!("{:#}", e)))?;

        let Some(token) = cached else {
            return Err(SyncError::auth(format!(
                "No cached token at {}. Run 'sheetfill auth login' first.",
                self.token_path.display()
            )));
        };

        if token.is_fresh(Utc::now(), Duration::seconds(EXPIRY_LEEWAY_SECS)) {
            debug!("Using cached access token");
            return Ok(token.access_token);
        }

        if !token.can_refresh() {
            return Err(SyncError::auth(
                "Cached token has expired and has no refresh token. Run 'sheetfill auth login'.",
            ));
        }

        info!("Access token expired, refreshing");
        let refreshed = self
            .refresh(&token)
            .await
            .map_err(|e| SyncError::auth(format!("Token refresh failed: {:#}", e)))?;
        self.save_token(&refreshed)
            .map_err(|e| SyncError::auth(format!("{:#}", e)))?;

        Ok(refreshed.access_token)
    }

    async fn refresh(&self, token: &TokenInfo) -> Result<TokenInfo> {
        let refresh_token = token.refresh_token.as_deref().unwrap_or_default();
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token(&params).await?;
        Ok(response.into_token(Some(token), Utc::now()))
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await
            .context("Failed to reach token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token endpoint returned {}: {}", status, body.trim());
        }

        response
            .json::<TokenResponse>()
            .await
            .context("Failed to parse token response")
    }

    /// Consent URL for the loopback flow
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.secrets.auth_uri,
            urlencoding::encode(&self.secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SHEETS_SCOPE),
        )
    }

    /// Run the installed-app flow and cache the resulting token
    ///
    /// `on_url` is called with the consent URL once the loopback listener is up.
    pub async fn login(&self, on_url: impl FnOnce(&str)) -> Result<TokenInfo> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind loopback listener")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}", port);

        on_url(&self.authorization_url(&redirect_uri));

        let code = wait_for_code(&listener).await?;
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let token = self.post_token(&params).await?.into_token(None, Utc::now());
        self.save_token(&token)?;
        info!("Saved new token to {}", self.token_path.display());
        Ok(token)
    }
}

/// Read the client secrets file
pub fn load_client_secrets(path: &Path) -> Result<ClientSecrets, SyncError> {
    if !path.exists() {
        return Err(SyncError::configuration(format!(
            "Credentials file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        SyncError::configuration(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let file: ClientSecretsFile = serde_json::from_str(&content).map_err(|e| {
        SyncError::configuration(format!("Invalid credentials file {}: {}", path.display(), e))
    })?;

    file.into_secrets().ok_or_else(|| {
        SyncError::configuration(format!(
            "Credentials file {} has neither an 'installed' nor a 'web' client",
            path.display()
        ))
    })
}

/// Accept loopback connections until one carries the OAuth redirect
///
/// Empty connections, unrelated paths like `/favicon.ico` and connections
/// that stay idle are answered (if possible) and skipped.
async fn wait_for_code(listener: &TcpListener) -> Result<String> {
    loop {
        let (mut socket, peer) = listener
            .accept()
            .await
            .context("Failed to accept OAuth redirect")?;

        let head = match tokio::time::timeout(CALLBACK_READ_TIMEOUT, read_request_head(&mut socket)).await {
            Ok(Ok(head)) => head,
            Ok(Err(e)) => {
                debug!("Dropping loopback connection from {}: {}", peer, e);
                continue;
            }
            Err(_) => {
                debug!("Dropping idle loopback connection from {}", peer);
                continue;
            }
        };

        let Some(request_line) = head.lines().next().filter(|l| !l.trim().is_empty()) else {
            debug!("Ignoring empty loopback connection from {}", peer);
            continue;
        };

        let callback = parse_callback(request_line);
        let (status, body) = match &callback {
            Ok(Some(_)) => ("200 OK", "Authentication complete. You can close this window."),
            Ok(None) => ("404 Not Found", "Not found"),
            Err(_) => ("200 OK", "Authentication failed. Check the terminal for details."),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        // The browser page is cosmetic; a failed reply doesn't affect the flow
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;

        match callback? {
            Some(code) => return Ok(code),
            None => debug!("Ignoring loopback request: {}", request_line),
        }
    }
}

/// Read until the end of the HTTP headers, EOF or the size cap
async fn read_request_head(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

/// Authorization code from `GET /?code=...&scope=... HTTP/1.1`
///
/// `Ok(None)` when the request carries neither `code` nor `error`.
fn parse_callback(request_line: &str) -> Result<Option<String>> {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Ok(None);
    };
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or_default();

    let mut code = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "code" => code = Some(value),
            "error" => anyhow::bail!("Authorization was denied: {}", value),
            _ => {}
        }
    }

    Ok(code.filter(|c| !c.is_empty()))
}
