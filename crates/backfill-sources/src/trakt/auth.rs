use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const TOKEN_URL: &str = "https://api.trakt.tv/oauth/token";
const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";

/// Create a reqwest Client with browser-like headers to get past Cloudflare
pub fn create_trakt_client() -> Client {
    Client::builder()
        .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

#[derive(Debug)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenResponse> for TokenInfo {
    fn from(token: TokenResponse) -> Self {
        // Two minutes of slack so a token is never used right at its expiry
        let expires_at = Utc::now() + Duration::seconds(token.expires_in as i64 - 120);
        TokenInfo {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
        }
    }
}

/// The URL the user opens to grant access
pub fn authorization_url(client_id: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        REDIRECT_URI
    )
}

/// Obtain a token, refreshing when possible and falling back to the
/// authorization code flow. `read_code` receives the authorization URL
/// and returns the code the user pasted back.
pub async fn authenticate<F>(
    client_id: &str,
    client_secret: &str,
    refresh_token: Option<&str>,
    read_code: F,
) -> Result<TokenInfo>
where
    F: FnOnce(&str) -> Result<String>,
{
    let client = create_trakt_client();

    if let Some(refresh_token) = refresh_token {
        match refresh_access_token(&client, client_id, client_secret, refresh_token).await {
            Ok(token_info) => {
                info!("Refreshed Trakt access token");
                return Ok(token_info);
            }
            Err(e) => {
                warn!("Trakt token refresh failed, starting a new authorization: {}", e);
            }
        }
    }

    let code = read_code(&authorization_url(client_id))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(anyhow!("Authorization code cannot be empty"));
    }

    exchange_code(&client, client_id, client_secret, code).await
}

async fn request_token(client: &Client, payload: serde_json::Value, what: &str) -> Result<TokenInfo> {
    let response = client
        .post(TOKEN_URL)
        .json(&payload)
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Content-Type", "application/json")
        .header("Origin", "https://trakt.tv")
        .header("Referer", "https://trakt.tv/")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!("{} failed: {} - {}", what, status, error_text));
    }

    let token_response: TokenResponse = response.json().await?;
    Ok(token_response.into())
}

async fn refresh_access_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenInfo> {
    let payload = serde_json::json!({
        "refresh_token": refresh_token,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "refresh_token"
    });
    request_token(client, payload, "Token refresh").await
}

async fn exchange_code(client: &Client, client_id: &str, client_secret: &str, code: &str) -> Result<TokenInfo> {
    let payload = serde_json::json!({
        "code": code,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "authorization_code"
    });
    request_token(client, payload, "Authorization code exchange").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url() {
        let url = authorization_url("abc123");
        assert!(url.starts_with("https://trakt.tv/oauth/authorize?response_type=code"));
        assert!(url.contains("client_id=abc123"));
        assert!(url.ends_with("redirect_uri=urn:ietf:wg:oauth:2.0:oob"));
    }

    #[test]
    fn test_token_expiry_has_slack() {
        let before = Utc::now();
        let info: TokenInfo = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: 7200,
        }
        .into();
        assert!(info.expires_at < before + Duration::seconds(7200));
        assert!(info.expires_at >= before + Duration::seconds(7080));
    }
}
