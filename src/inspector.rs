//! AccountInspector and its authenticated counterpart.

use serde_json::Value;

use crate::client::{ApiClient, InspectorConfig};
use crate::credential::{AccessToken, Credential};
use crate::error::InspectError;
use crate::extract;
use crate::query::{self, Query};
use crate::token;

/// Access group settings endpoint path.
pub const SETTINGS_PATH: &str = "/v2/groups/settings";

/// Field holding the public access flag in the settings response.
pub const PUBLIC_ACCESS_FIELD: &str = "public_access_enabled";

/// Entry point for inspecting an IBM Cloud account.
///
/// An `AccountInspector` cannot issue queries. Call [`authenticate`] to
/// exchange an API key for a token and obtain an [`AuthenticatedInspector`].
///
/// # Example
///
/// ```ignore
/// use ibmcloud_inspect::{AccountInspector, Credential, InspectError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), InspectError> {
///     let credential = Credential::new(std::env::var("IBMCLOUD_API_KEY").unwrap_or_default())?;
///     let inspector = AccountInspector::new()?.authenticate(&credential).await?;
///     let enabled = inspector.public_access_enabled("8e5158d44fd45edcd727e077fa4f6b16").await?;
///     println!("{}", ibmcloud_inspect::public_access_message(enabled));
///     Ok(())
/// }
/// ```
///
/// [`authenticate`]: AccountInspector::authenticate
#[derive(Debug)]
pub struct AccountInspector {
    client: ApiClient,
}

impl AccountInspector {
    /// Create an inspector talking to the public IAM endpoint.
    pub fn new() -> Result<Self, InspectError> {
        Self::with_config(&InspectorConfig::default())
    }

    /// Create an inspector with a custom configuration.
    pub fn with_config(config: &InspectorConfig) -> Result<Self, InspectError> {
        Ok(Self {
            client: ApiClient::new(config)?,
        })
    }

    /// Create an inspector with a custom IAM base URL (for testing).
    pub fn with_iam_url(iam_url: &str) -> Result<Self, InspectError> {
        Self::with_config(&InspectorConfig::with_iam_url(iam_url))
    }

    /// Exchange the API key for an access token.
    ///
    /// # Errors
    ///
    /// Returns `InspectError::Authentication` if IAM rejects the key. The
    /// inspector is consumed either way.
    pub async fn authenticate(
        self,
        credential: &Credential,
    ) -> Result<AuthenticatedInspector, InspectError> {
        let token = token::exchange(&self.client, credential).await?;
        Ok(AuthenticatedInspector {
            client: self.client,
            token,
        })
    }
}

/// An inspector holding a valid access token.
#[derive(Debug)]
pub struct AuthenticatedInspector {
    client: ApiClient,
    token: AccessToken,
}

impl AuthenticatedInspector {
    /// The token obtained during authentication.
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Issue a query and return the raw JSON body.
    pub async fn query(&self, query: &Query) -> Result<Value, InspectError> {
        query::execute(&self.client, &self.token, query).await
    }

    /// Fetch the access group settings of an account.
    ///
    /// # Errors
    ///
    /// Returns an extraction error if the response has no `public_access_enabled`.
    pub async fn account_settings(&self, account_id: &str) -> Result<AccountSettings, InspectError> {
        let body = self.query(&settings_query(account_id)).await?;
        AccountSettings::from_json(&body)
    }

    /// Whether public access is enabled for an account.
    pub async fn public_access_enabled(&self, account_id: &str) -> Result<bool, InspectError> {
        Ok(self.account_settings(account_id).await?.public_access_enabled)
    }

    /// Pick the account to inspect: the explicit id if given, otherwise the
    /// `account.bss` claim of the access token.
    ///
    /// # Errors
    ///
    /// Returns `InspectError::MissingCredential` if neither source has an id.
    pub fn resolve_account_id(&self, explicit: Option<String>) -> Result<String, InspectError> {
        if let Some(id) = explicit.map(|id| id.trim().to_string()) {
            if !id.is_empty() {
                return Ok(id);
            }
        }

        match self.token.claims() {
            Ok(claims) => {
                if let Some(id) = claims.account_id().filter(|id| !id.is_empty()) {
                    tracing::debug!(account_id = %id, "using account from token claims");
                    return Ok(id.to_string());
                }
            }
            Err(e) => tracing::debug!(error = %e, "token carries no readable claims"),
        }

        Err(InspectError::MissingCredential("account id"))
    }
}

/// Build the settings query for an account.
pub fn settings_query(account_id: &str) -> Query {
    Query::get(SETTINGS_PATH).param("account_id", account_id)
}

/// Access group settings of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSettings {
    pub account_id: Option<String>,
    pub public_access_enabled: bool,
    pub last_modified_at: Option<String>,
    pub last_modified_by_id: Option<String>,
}

impl AccountSettings {
    /// Decode a settings response.
    ///
    /// Only the public access flag is required. The informational fields are
    /// `None` when absent, null, or not strings.
    pub fn from_json(body: &Value) -> Result<Self, InspectError> {
        let optional = |path: &str| extract::extract_string(body, path).ok();
        Ok(Self {
            public_access_enabled: extract::extract_bool(body, PUBLIC_ACCESS_FIELD)?,
            account_id: optional("account_id"),
            last_modified_at: optional("last_modified_at"),
            last_modified_by_id: optional("last_modified_by_id"),
        })
    }
}

/// Human-readable verdict for the public access flag.
pub fn public_access_message(enabled: bool) -> &'static str {
    if enabled {
        "WARNING: Public Access is enabled for the account. Checking for public resources ..."
    } else {
        "INFO: Public Access is not enabled for the account."
    }
}
