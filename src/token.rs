//! IAM API key to bearer token exchange.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::ApiClient;
use crate::credential::{AccessToken, Credential};
use crate::error::{ExtractionError, InspectError};

/// IAM token endpoint path.
pub const TOKEN_PATH: &str = "/identity/token";

/// Grant type identifying an API key exchange.
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Body returned by the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub expiration: Option<u64>,
}

/// Exchange an API key for an access token.
///
/// # Errors
///
/// Returns `InspectError::Authentication` on any non-200 status, and an
/// extraction error if the body carries no `access_token`.
pub async fn exchange(
    client: &ApiClient,
    credential: &Credential,
) -> Result<AccessToken, InspectError> {
    let url = client.url(TOKEN_PATH);
    tracing::debug!(%url, "requesting IAM access token");

    let response = client
        .inner()
        .post(&url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", APIKEY_GRANT_TYPE),
            ("apikey", credential.expose()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = client.read_text(response).await?;

    if status != StatusCode::OK {
        tracing::warn!(status = status.as_u16(), "token exchange rejected");
        return Err(InspectError::authentication(status.as_u16(), &body));
    }

    let token: TokenResponse = serde_json::from_str(&body)?;
    let access_token = token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractionError::MissingField("access_token".to_string()))?;

    tracing::debug!(
        token_type = token.token_type.as_deref().unwrap_or("unknown"),
        expires_in = token.expires_in,
        expiration = token.expiration,
        "obtained IAM access token"
    );

    Ok(AccessToken::new(access_token))
}
