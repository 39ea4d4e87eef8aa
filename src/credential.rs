//! API key and bearer token types.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::error::InspectError;

/// Number of token characters shown by [`AccessToken::preview`].
const PREVIEW_LEN: usize = 10;

/// An IBM Cloud API key.
///
/// The key is never printed: both `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap an API key. Surrounding whitespace is dropped.
    pub fn new(api_key: impl Into<String>) -> Result<Self, InspectError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(InspectError::MissingCredential("api key"));
        }
        Ok(Self(api_key))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// A bearer token obtained from the IAM token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for building an `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The first few characters of the token followed by `...`.
    pub fn preview(&self) -> String {
        let head: String = self.0.chars().take(PREVIEW_LEN).collect();
        format!("{}...", head)
    }

    /// Decode the claims carried in the token payload.
    ///
    /// The signature is not verified; IAM checks it on every request anyway.
    pub fn claims(&self) -> Result<TokenClaims, InspectError> {
        let parts: Vec<&str> = self.0.split('.').collect();
        if parts.len() != 3 {
            return Err(InspectError::InvalidToken);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|_| InspectError::InvalidToken)?;
        serde_json::from_slice(&payload).map_err(|_| InspectError::InvalidToken)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", self.preview())
    }
}

/// Claims of interest from an IAM access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// IAM identity of the key owner.
    #[serde(default)]
    pub iam_id: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    account: Option<AccountClaim>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct AccountClaim {
    #[serde(default)]
    bss: Option<String>,
}

impl TokenClaims {
    /// The billing account the token was issued for.
    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref()?.bss.as_deref()
    }
}
