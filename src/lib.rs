//! Minimal Rust crate for inspecting IBM Cloud account metadata.
//!
//! The crate follows one pipeline: exchange an API key for an IAM bearer
//! token, issue read-only control-plane queries with it, check the HTTP
//! status, and extract typed values from the JSON body.
//!
//! # Features
//!
//! - API key to bearer token exchange against IAM
//! - Authenticated queries that cannot be built without a token
//! - Field extraction by path (`regions[].name`) with errors naming the missing field
//! - Enabled region listing through the `ibmcloud` CLI
//!
//! # Example
//!
//! ```ignore
//! use ibmcloud_inspect::{AccountInspector, Credential, InspectError, RegionsCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), InspectError> {
//!     let credential = Credential::new("my-api-key")?;
//!
//!     // Unauthenticated -> Authenticated
//!     let inspector = AccountInspector::new()?.authenticate(&credential).await?;
//!
//!     // Typed query
//!     let enabled = inspector.public_access_enabled("my-account-id").await?;
//!
//!     // Regions come from the CLI and need no token
//!     let regions: Vec<String> = RegionsCommand::default().list().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! | Operation | Source |
//! |-----------|--------|
//! | Token exchange | `POST /identity/token` on IAM |
//! | Account settings | `GET /v2/groups/settings?account_id=...` on IAM |
//! | Regions | `ibmcloud regions --output json` |

mod client;
mod credential;
mod error;
mod extract;
mod inspector;
mod query;
mod regions;
mod token;

pub use client::{InspectorConfig, DEFAULT_IAM_URL, DEFAULT_MAX_BODY_SIZE, DEFAULT_TIMEOUT};
pub use credential::{AccessToken, Credential, TokenClaims};
pub use error::{ExtractionError, InspectError};
pub use extract::{extract_bool, extract_string, extract_strings, FieldPath};
pub use inspector::{
    public_access_message, settings_query, AccountInspector, AccountSettings,
    AuthenticatedInspector,
};
pub use query::Query;
pub use regions::{format_export, format_region_list, parse_regions, RegionsCommand};
pub use token::{TokenResponse, APIKEY_GRANT_TYPE};
